//! Request-scoped conversion state: one selected file, one chosen output.

use std::fmt::{Display, Formatter};

use tracing::warn;

use crate::{
    converter::Converter,
    error::Error,
    formats::FormatType,
    types::{ConversionResult, InputFile},
};

/// One entry of the format menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatChoice {
    pub format: FormatType,
    /// Whether the selected file can be converted to this format.
    pub available: bool,
}

/// The status line shown while converting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Converting,
    Complete,
    Failed(String),
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::Converting => f.write_str("Converting..."),
            Status::Complete => f.write_str("Conversion complete!"),
            Status::Failed(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Tracks a file selection and output choice against a [`Converter`].
///
/// # Example
///
/// ```rust
/// use mimeforge::{ConversionSession, Converter, InputFile};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), mimeforge::Error> {
/// let converter = Converter::default();
/// converter.initialize().await;
///
/// let mut session = ConversionSession::new(&converter);
/// session.select_file(InputFile::new("list.csv", None, b"a,b\n1,2\n".to_vec()));
/// assert!(session.choose_output("application/json"));
///
/// let result = session.convert().await?;
/// assert_eq!(result.bytes, br#"[{"a":1,"b":2}]"#);
/// assert_eq!(session.status().to_string(), "Conversion complete!");
/// # Ok(())
/// # }
/// ```
pub struct ConversionSession<'a> {
    converter: &'a Converter,
    file: Option<InputFile>,
    output: Option<FormatType>,
    status: Status,
}

impl<'a> ConversionSession<'a> {
    pub fn new(converter: &'a Converter) -> Self {
        ConversionSession {
            converter,
            file: None,
            output: None,
            status: Status::Idle,
        }
    }

    pub fn file(&self) -> Option<&InputFile> {
        self.file.as_ref()
    }

    pub fn output(&self) -> Option<FormatType> {
        self.output
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Every format in the catalog, flagged by availability for the selected
    /// file. Nothing is available until a file is selected.
    pub fn menu(&self) -> Vec<FormatChoice> {
        let available = self
            .file
            .as_ref()
            .map(|file| self.converter.available_outputs(&file.mime))
            .unwrap_or_default();
        self.converter
            .catalog()
            .all_formats()
            .into_iter()
            .map(|format| FormatChoice {
                format,
                available: available.contains(&format.mime()),
            })
            .collect()
    }

    /// Replaces the selected file and clears the chosen output.
    pub fn select_file(&mut self, file: InputFile) {
        self.file = Some(file);
        self.output = None;
        self.status = Status::Idle;
    }

    /// Chooses an output if it is available for the selected file.
    pub fn choose_output(&mut self, mime: &str) -> bool {
        let Some(file) = &self.file else {
            return false;
        };
        if !self.converter.validate(&file.mime, mime) {
            return false;
        }
        self.output = FormatType::from_mime(mime);
        self.output.is_some()
    }

    pub fn can_convert(&self) -> bool {
        match (&self.file, self.output) {
            (Some(file), Some(output)) => self.converter.validate(&file.mime, output.mime()),
            _ => false,
        }
    }

    /// Converts the selected file to the chosen output.
    ///
    /// The status line tracks progress; a failure leaves no artifact and
    /// reports `Error: <message>`.
    pub async fn convert(&mut self) -> Result<ConversionResult, Error> {
        let (file, output) = match (&self.file, self.output) {
            (Some(file), Some(output)) => (file, output),
            (file, _) => {
                let from = file.as_ref().map(|f| f.mime.clone()).unwrap_or_default();
                let err = Error::unsupported(from, "");
                self.status = Status::Failed(err.to_string());
                return Err(err);
            }
        };

        self.status = Status::Converting;
        match self.converter.convert_file(file, output.mime()).await {
            Ok(result) => {
                self.status = Status::Complete;
                Ok(result)
            }
            Err(err) => {
                warn!(file = %file.name, error = %err, "conversion failed");
                self.status = Status::Failed(err.to_string());
                Err(err)
            }
        }
    }
}
