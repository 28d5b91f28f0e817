//! The engine seam: one implementation per format category.

use async_trait::async_trait;

use crate::{error::EngineError, formats::Category, types::TransformRequest};

/// A transformation backend for one [`Category`] of input formats.
///
/// The router only ever passes requests whose pair is in the catalog and
/// whose input classifies into [`Engine::category`]. Engines return the raw
/// output bytes; the router tags and names them.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use mimeforge::{Category, Engine, EngineError, TransformRequest};
///
/// struct Uppercase;
///
/// #[async_trait]
/// impl Engine for Uppercase {
///     fn category(&self) -> Category {
///         Category::Text
///     }
///
///     fn name(&self) -> &'static str {
///         "uppercase"
///     }
///
///     async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError> {
///         Ok(request.bytes.to_ascii_uppercase())
///     }
/// }
/// ```
#[async_trait]
pub trait Engine: Send + Sync {
    /// The category of inputs this engine handles.
    fn category(&self) -> Category;

    /// Short name used in logs and readiness reports.
    fn name(&self) -> &'static str;

    /// One-time readiness probe, run during converter initialization.
    async fn initialize(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Transforms `request.bytes` from `request.input` to `request.output`.
    async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError>;
}
