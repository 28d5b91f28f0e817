//! All error types for the mimeforge crate.
//!
//! [`Error`] is returned from every public operation (validation, dispatch,
//! conversion, delivery). [`EngineError`] is what an individual engine raises;
//! the router wraps it into [`Error::TransformFailure`] or
//! [`Error::EngineUnavailable`].

use thiserror::Error;

use crate::formats::Category;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("conversion from `{from}` to `{to}` is not supported")]
    UnsupportedConversion { from: String, to: String },

    #[error("conversion engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("{category} conversion failed: {source}")]
    TransformFailure {
        category: Category,
        #[source]
        source: EngineError,
    },

    #[error("invalid format catalog: {0}")]
    InvalidCatalog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an unsupported-conversion error for the given pair.
    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::UnsupportedConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Wraps an engine error raised while transforming bytes of `category`.
    ///
    /// An engine reporting itself unavailable at transform time is surfaced as
    /// [`Error::EngineUnavailable`] rather than a transform failure.
    pub fn from_engine(category: Category, source: EngineError) -> Self {
        match source {
            EngineError::Unavailable(reason) => Error::EngineUnavailable(reason),
            source => Error::TransformFailure { category, source },
        }
    }

    /// Returns `true` for [`Error::UnsupportedConversion`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedConversion { .. })
    }

    /// Returns `true` for [`Error::EngineUnavailable`].
    pub fn is_engine_unavailable(&self) -> bool {
        matches!(self, Error::EngineUnavailable(_))
    }

    /// Returns `true` for [`Error::TransformFailure`].
    pub fn is_transform_failure(&self) -> bool {
        matches!(self, Error::TransformFailure { .. })
    }
}

/// Errors raised inside an engine while it transforms bytes.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} exited with code {code}: {stderr}")]
    Process {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("engine cannot produce this output: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl EngineError {
    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        EngineError::InvalidInput(message.into())
    }
}
