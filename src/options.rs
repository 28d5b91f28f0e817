//! Options controlling how conversions are performed and named.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default JPEG quality, matching the usual browser canvas encoder default.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Converter-wide settings.
///
/// Deserializes with every field optional, so a partial JSON or TOML table is
/// enough to override a single setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    /// Quality used when encoding JPEG output, clamped to `1..=100`.
    pub jpeg_quality: u8,
    /// Path or command name of the `ffmpeg` executable used for audio.
    pub ffmpeg_path: PathBuf,
    /// File stem of produced artifacts (`<stem>.<extension>`).
    pub output_stem: String,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            output_stem: "converted".to_string(),
        }
    }
}

impl ConverterOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Sets the `ffmpeg` executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Sets the artifact file stem.
    pub fn with_output_stem(mut self, stem: impl Into<String>) -> Self {
        self.output_stem = stem.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConverterOptions::new();
        assert_eq!(options.jpeg_quality, 92);
        assert_eq!(options.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(options.output_stem, "converted");
    }

    #[test]
    fn test_builder_clamps_quality() {
        assert_eq!(ConverterOptions::new().with_jpeg_quality(0).jpeg_quality, 1);
        assert_eq!(ConverterOptions::new().with_jpeg_quality(250).jpeg_quality, 100);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let options: ConverterOptions =
            serde_json::from_str(r#"{ "ffmpeg_path": "/opt/ffmpeg/bin/ffmpeg" }"#).unwrap();
        assert_eq!(options.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(options.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert_eq!(options.output_stem, "converted");
    }
}
