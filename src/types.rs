//! Request and result types passed between the caller, the router and engines.

use std::path::{Path, PathBuf};

use crate::formats::FormatType;

/// A user-supplied file: name, declared MIME type and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    /// Declared MIME type. Empty when it could be neither read nor inferred.
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    /// Creates an input file.
    ///
    /// When `mime` is `None` or blank, the type is inferred from the name's
    /// extension.
    ///
    /// # Example
    /// ```rust
    /// use mimeforge::InputFile;
    /// let file = InputFile::new("table.csv", None, b"a,b\n1,2\n".to_vec());
    /// assert_eq!(file.mime, "text/csv");
    /// ```
    pub fn new(name: impl Into<String>, mime: Option<&str>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = match mime.map(str::trim) {
            Some(mime) if !mime.is_empty() => mime.to_string(),
            _ => FormatType::from_extension(&name)
                .map(|format| format.mime().to_string())
                .unwrap_or_default(),
        };
        InputFile { name, mime, bytes }
    }

    /// Reads a file from disk, inferring its MIME type from the extension.
    pub fn read_from<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(InputFile::new(name, None, bytes))
    }

    /// Returns the recognized format of this file, if any.
    pub fn format(&self) -> Option<FormatType> {
        FormatType::from_mime(&self.mime)
    }
}

/// A validated request handed to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub bytes: Vec<u8>,
    pub input: FormatType,
    pub output: FormatType,
}

impl TransformRequest {
    pub fn new(bytes: Vec<u8>, input: FormatType, output: FormatType) -> Self {
        TransformRequest {
            bytes,
            input,
            output,
        }
    }
}

/// The artifact produced by a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub format: FormatType,
    /// `<stem>.<extension>`, e.g. `converted.gif`.
    pub file_name: String,
}

impl ConversionResult {
    /// Tags `bytes` with `format` and derives the artifact name from `stem`.
    pub fn new(bytes: Vec<u8>, format: FormatType, stem: &str) -> Self {
        ConversionResult {
            bytes,
            format,
            file_name: format!("{}.{}", stem, format.extension()),
        }
    }

    /// The output MIME type.
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Delivers the artifact into `dir`, returning the written path.
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_file_keeps_declared_mime() {
        let file = InputFile::new("photo.png", Some("image/jpeg"), vec![]);
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(file.format(), Some(FormatType::Jpeg));
    }

    #[test]
    fn test_input_file_infers_mime_when_absent() {
        let file = InputFile::new("song.mp3", None, vec![]);
        assert_eq!(file.mime, "audio/mpeg");
        let file = InputFile::new("page.HTM", Some("  "), vec![]);
        assert_eq!(file.mime, "text/html");
    }

    #[test]
    fn test_input_file_unknown_extension() {
        let file = InputFile::new("movie.mkv", None, vec![]);
        assert_eq!(file.mime, "");
        assert_eq!(file.format(), None);
    }

    #[test]
    fn test_input_file_read_from() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.md");
        std::fs::write(&path, "# Notes\n").unwrap();

        let file = InputFile::read_from(&path).unwrap();
        assert_eq!(file.name, "notes.md");
        assert_eq!(file.mime, "text/markdown");
        assert_eq!(file.bytes, b"# Notes\n");
    }

    #[test]
    fn test_conversion_result_naming() {
        let result = ConversionResult::new(b"GIF89a".to_vec(), FormatType::Gif, "converted");
        assert_eq!(result.file_name, "converted.gif");
        assert_eq!(result.mime(), "image/gif");
        assert_eq!(result.len(), 6);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_conversion_result_write_to() {
        let tmp = tempfile::tempdir().unwrap();
        let result = ConversionResult::new(b"a,b\n".to_vec(), FormatType::Csv, "converted");
        let path = result.write_to(tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("converted.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n");
    }
}
