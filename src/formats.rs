//! All file formats known to mimeforge.
//!
//! [`FormatType`] is the typed vocabulary behind the MIME strings the public
//! API accepts, and [`Category`] is the five-way classification that decides
//! which engine handles an input.

use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::Error;

pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Represents every format that can appear on either side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatType {
    Jpeg,
    Png,
    Webp,
    Gif,
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
    /// Office Open XML spreadsheet.
    Xlsx,
    Csv,
    PlainText,
    Markdown,
    Html,
    Json,
    /// MPEG audio layer III.
    Mp3,
    Wav,
    Ogg,
}

impl FormatType {
    /// Every known format, in declaration order.
    pub const ALL: [FormatType; 15] = [
        FormatType::Jpeg,
        FormatType::Png,
        FormatType::Webp,
        FormatType::Gif,
        FormatType::Pdf,
        FormatType::Docx,
        FormatType::Xlsx,
        FormatType::Csv,
        FormatType::PlainText,
        FormatType::Markdown,
        FormatType::Html,
        FormatType::Json,
        FormatType::Mp3,
        FormatType::Wav,
        FormatType::Ogg,
    ];

    /// Returns the canonical MIME type.
    pub fn mime(&self) -> &'static str {
        match self {
            FormatType::Jpeg => "image/jpeg",
            FormatType::Png => "image/png",
            FormatType::Webp => "image/webp",
            FormatType::Gif => "image/gif",
            FormatType::Pdf => "application/pdf",
            FormatType::Docx => MIME_DOCX,
            FormatType::Xlsx => MIME_XLSX,
            FormatType::Csv => "text/csv",
            FormatType::PlainText => "text/plain",
            FormatType::Markdown => "text/markdown",
            FormatType::Html => "text/html",
            FormatType::Json => "application/json",
            FormatType::Mp3 => "audio/mpeg",
            FormatType::Wav => "audio/wav",
            FormatType::Ogg => "audio/ogg",
        }
    }

    /// Returns the file extension used for converted artifacts.
    ///
    /// These are the conventional extensions, not the MIME subtype: JPEG
    /// output is named `converted.jpg` and MPEG audio `converted.mp3`.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Jpeg => "jpg",
            FormatType::Png => "png",
            FormatType::Webp => "webp",
            FormatType::Gif => "gif",
            FormatType::Pdf => "pdf",
            FormatType::Docx => "docx",
            FormatType::Xlsx => "xlsx",
            FormatType::Csv => "csv",
            FormatType::PlainText => "txt",
            FormatType::Markdown => "md",
            FormatType::Html => "html",
            FormatType::Json => "json",
            FormatType::Mp3 => "mp3",
            FormatType::Wav => "wav",
            FormatType::Ogg => "ogg",
        }
    }

    /// Returns a short upper-case label suitable for a format menu.
    pub fn label(&self) -> &'static str {
        match self {
            FormatType::Jpeg => "JPEG",
            FormatType::Png => "PNG",
            FormatType::Webp => "WEBP",
            FormatType::Gif => "GIF",
            FormatType::Pdf => "PDF",
            FormatType::Docx => "DOCX",
            FormatType::Xlsx => "XLSX",
            FormatType::Csv => "CSV",
            FormatType::PlainText => "TXT",
            FormatType::Markdown => "MARKDOWN",
            FormatType::Html => "HTML",
            FormatType::Json => "JSON",
            FormatType::Mp3 => "MP3",
            FormatType::Wav => "WAV",
            FormatType::Ogg => "OGG",
        }
    }

    /// Returns the category this format's MIME type classifies into.
    pub fn category(&self) -> Category {
        Category::classify(self.mime())
    }

    /// Parses a MIME type, returning `None` when it is not a known format.
    ///
    /// Matching is case-insensitive, ignores parameters such as
    /// `; charset=utf-8`, and accepts a few aliases browsers commonly report.
    ///
    /// # Example
    /// ```rust
    /// use mimeforge::FormatType;
    /// assert_eq!(FormatType::from_mime("image/JPEG"), Some(FormatType::Jpeg));
    /// assert_eq!(FormatType::from_mime("text/csv; charset=utf-8"), Some(FormatType::Csv));
    /// assert_eq!(FormatType::from_mime("audio/x-wav"), Some(FormatType::Wav));
    /// assert_eq!(FormatType::from_mime("video/mp4"), None);
    /// ```
    pub fn from_mime(mime: &str) -> Option<FormatType> {
        let essence = normalize_mime(mime);
        let format = match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => FormatType::Jpeg,
            "image/png" => FormatType::Png,
            "image/webp" => FormatType::Webp,
            "image/gif" => FormatType::Gif,
            "application/pdf" | "application/x-pdf" => FormatType::Pdf,
            MIME_DOCX => FormatType::Docx,
            MIME_XLSX => FormatType::Xlsx,
            "text/csv" => FormatType::Csv,
            "text/plain" => FormatType::PlainText,
            "text/markdown" | "text/x-markdown" => FormatType::Markdown,
            "text/html" => FormatType::Html,
            "application/json" => FormatType::Json,
            "audio/mpeg" | "audio/mp3" => FormatType::Mp3,
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => FormatType::Wav,
            "audio/ogg" | "application/ogg" => FormatType::Ogg,
            _ => return None,
        };
        Some(format)
    }

    /// Infers a format from a file path's extension.
    ///
    /// # Example
    /// ```rust
    /// use mimeforge::FormatType;
    /// assert_eq!(FormatType::from_extension("photo.JPG"), Some(FormatType::Jpeg));
    /// assert_eq!(FormatType::from_extension("notes.md"), Some(FormatType::Markdown));
    /// assert_eq!(FormatType::from_extension("archive.tar"), None);
    /// ```
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Option<FormatType> {
        let extension = path.as_ref().extension()?.to_str()?;
        let format = match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => FormatType::Jpeg,
            "png" => FormatType::Png,
            "webp" => FormatType::Webp,
            "gif" => FormatType::Gif,
            "pdf" => FormatType::Pdf,
            "docx" => FormatType::Docx,
            "xlsx" => FormatType::Xlsx,
            "csv" => FormatType::Csv,
            "txt" | "text" => FormatType::PlainText,
            "md" | "markdown" => FormatType::Markdown,
            "html" | "htm" => FormatType::Html,
            "json" => FormatType::Json,
            "mp3" => FormatType::Mp3,
            "wav" => FormatType::Wav,
            "ogg" | "oga" => FormatType::Ogg,
            _ => return None,
        };
        Some(format)
    }
}

/// Displays the canonical MIME type.
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// Parses a MIME type; see [`FormatType::from_mime`].
///
/// Returns [`crate::error::Error::UnknownFormat`] for unknown types.
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatType::from_mime(s).ok_or_else(|| Error::UnknownFormat(s.trim().to_string()))
    }
}

/// Lower-cases a MIME type and strips any parameters.
pub fn normalize_mime(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or_default();
    essence.trim().to_ascii_lowercase()
}

/// The engine family an input type is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Image,
    /// PDF and word-processing documents.
    Document,
    /// Workbooks and CSV.
    Spreadsheet,
    Audio,
    /// The remaining `text/*` family.
    Text,
    Unknown,
}

impl Category {
    /// Every category that has an engine.
    pub const ROUTABLE: [Category; 5] = [
        Category::Image,
        Category::Document,
        Category::Spreadsheet,
        Category::Audio,
        Category::Text,
    ];

    /// Classifies a MIME type.
    ///
    /// Rules are checked in order, so `text/csv` is a spreadsheet rather than
    /// text and a word-processing type is a document.
    ///
    /// # Example
    /// ```rust
    /// use mimeforge::Category;
    /// assert_eq!(Category::classify("image/webp"), Category::Image);
    /// assert_eq!(Category::classify("text/csv"), Category::Spreadsheet);
    /// assert_eq!(Category::classify("text/markdown"), Category::Text);
    /// assert_eq!(Category::classify("video/mp4"), Category::Unknown);
    /// ```
    pub fn classify(mime: &str) -> Category {
        let mime = normalize_mime(mime);
        if mime.starts_with("image/") {
            Category::Image
        } else if mime == "application/pdf" || mime.contains("word") {
            Category::Document
        } else if mime.contains("sheet") || mime == "text/csv" {
            Category::Spreadsheet
        } else if mime.starts_with("audio/") {
            Category::Audio
        } else if mime.starts_with("text/") {
            Category::Text
        } else {
            Category::Unknown
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Image => "image",
            Category::Document => "document",
            Category::Spreadsheet => "spreadsheet",
            Category::Audio => "audio",
            Category::Text => "text",
            Category::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
