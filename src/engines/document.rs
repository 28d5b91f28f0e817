//! PDF and DOCX conversions.
//!
//! Both directions go through plain text: the source document's text is
//! extracted, then either returned as-is or laid out in the target container.

use async_trait::async_trait;
use tracing::debug;

use super::{docx, pdf, run_blocking};
use crate::{
    error::EngineError, formats::Category, formats::FormatType, traits::Engine,
    types::TransformRequest,
};

/// Converts between PDF, DOCX and plain text.
#[derive(Debug, Clone, Default)]
pub struct DocumentEngine;

impl DocumentEngine {
    pub fn new() -> Self {
        DocumentEngine
    }
}

#[async_trait]
impl Engine for DocumentEngine {
    fn category(&self) -> Category {
        Category::Document
    }

    fn name(&self) -> &'static str {
        "document"
    }

    async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError> {
        run_blocking(move || convert(&request.bytes, request.input, request.output)).await
    }
}

fn extract_text(bytes: &[u8], input: FormatType) -> Result<String, EngineError> {
    match input {
        FormatType::Pdf => pdf::extract_text(bytes),
        FormatType::Docx => docx::extract_text(bytes),
        other => Err(EngineError::invalid_input(format!(
            "`{other}` is not a PDF or DOCX document"
        ))),
    }
}

fn convert(bytes: &[u8], input: FormatType, output: FormatType) -> Result<Vec<u8>, EngineError> {
    let text = extract_text(bytes, input)?;
    debug!(chars = text.len(), %input, %output, "extracted document text");
    match output {
        FormatType::PlainText => Ok(text.into_bytes()),
        FormatType::Docx => docx::from_text(&text),
        FormatType::Pdf => pdf::from_text(&text),
        other => Err(EngineError::Unsupported(format!(
            "cannot write a document as `{other}`"
        ))),
    }
}
