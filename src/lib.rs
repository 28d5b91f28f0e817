#![forbid(unsafe_code)]
//! File format conversion between images, documents, spreadsheets, audio and text.
//!
//! A static [`FormatCatalog`] lists which output formats each input MIME type may
//! become. The [`Converter`] validates requests against it and hands the bytes
//! to the engine for the input's [`Category`]; the output comes back as a
//! [`ConversionResult`] named `converted.<extension>`.
//!
//! # Quick Start
//!
//! ```rust
//! use mimeforge::{Converter, InputFile};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), mimeforge::Error> {
//! let converter = Converter::default();
//! assert_eq!(
//!     converter.available_outputs("text/csv"),
//!     vec![
//!         "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
//!         "application/json",
//!     ]
//! );
//!
//! // Engines load once; conversions before that fail fast.
//! converter.initialize().await;
//!
//! let file = InputFile::new("prices.csv", None, b"item,price\ntea,3.5\n".to_vec());
//! let result = converter.convert_file(&file, "application/json").await?;
//! assert_eq!(result.file_name, "converted.json");
//! assert_eq!(result.bytes, br#"[{"item":"tea","price":3.5}]"#);
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Conversions
//!
//! - **Images**: JPEG, PNG, WebP and GIF into each other
//! - **Documents**: PDF and DOCX into each other or into plain text
//! - **Spreadsheets**: XLSX and CSV into each other or into JSON row objects
//! - **Audio**: MP3, WAV and Ogg into each other, through `ffmpeg`
//! - **Text**: plain text, Markdown and HTML, plus plain text into a JSON string

pub mod builder;
pub mod catalog;
pub mod converter;
pub mod engines;
pub mod error;
pub mod formats;
pub mod options;
pub mod session;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    builder::ConverterBuilder,
    catalog::FormatCatalog,
    converter::Converter,
    engines::{EngineStatus, Readiness},
    error::{EngineError, Error},
    formats::{Category, FormatType},
    options::ConverterOptions,
    session::{ConversionSession, FormatChoice, Status},
    traits::Engine,
    types::{ConversionResult, InputFile, TransformRequest},
};
