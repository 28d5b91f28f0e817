//! The conversion router.
//!
//! A [`Converter`] answers which outputs an input type may become, validates
//! requested pairs against its [`FormatCatalog`], and dispatches the byte
//! transformation to the engine registered for the input's [`Category`].

use std::{borrow::Cow, sync::Arc};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{
    builder::ConverterBuilder,
    catalog::FormatCatalog,
    engines::{EngineSet, Readiness},
    error::Error,
    formats::{Category, FormatType},
    options::ConverterOptions,
    traits::Engine,
    types::{ConversionResult, InputFile, TransformRequest},
};

/// Routes conversion requests to per-category engines.
///
/// Conversions are rejected with [`Error::EngineUnavailable`] until
/// [`Converter::initialize`] has completed.
///
/// # Example
///
/// ```rust
/// use mimeforge::Converter;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), mimeforge::Error> {
/// let converter = Converter::default();
/// converter.initialize().await;
///
/// let result = converter
///     .convert(b"# Hello", "text/markdown", "text/html")
///     .await?;
/// assert_eq!(result.file_name, "converted.html");
/// assert_eq!(result.bytes, b"<h1>Hello</h1>\n");
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    catalog: Cow<'static, FormatCatalog>,
    options: ConverterOptions,
    registered: Vec<Arc<dyn Engine>>,
    engines: OnceCell<EngineSet>,
}

impl Converter {
    /// Creates a converter with the built-in catalog and engines.
    pub fn new(options: ConverterOptions) -> Self {
        ConverterBuilder::new().options(options).build()
    }

    /// Returns a builder for custom catalogs and engines.
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    pub(crate) fn from_parts(
        catalog: Cow<'static, FormatCatalog>,
        options: ConverterOptions,
        registered: Vec<Arc<dyn Engine>>,
    ) -> Self {
        Converter {
            catalog,
            options,
            registered,
            engines: OnceCell::new(),
        }
    }

    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Runs every engine's readiness probe, once.
    ///
    /// Concurrent and repeated calls share the first run. Engines whose probe
    /// fails stay unavailable; the rest become usable.
    pub async fn initialize(&self) -> Readiness {
        let set = self
            .engines
            .get_or_init(|| async {
                info!(engines = self.registered.len(), "loading conversion engines");
                EngineSet::initialize(self.registered.clone()).await
            })
            .await;
        set.readiness()
    }

    /// `true` once [`Converter::initialize`] has completed.
    pub fn is_ready(&self) -> bool {
        self.engines.initialized()
    }

    /// Per-category readiness, or `None` before initialization.
    pub fn readiness(&self) -> Option<Readiness> {
        self.engines.get().map(EngineSet::readiness)
    }

    /// Output MIME types permitted for `input_type`; empty when unrecognized.
    pub fn available_outputs(&self, input_type: &str) -> Vec<&'static str> {
        self.catalog.available_outputs(input_type)
    }

    /// `true` iff `output_type` is in `available_outputs(input_type)`.
    pub fn validate(&self, input_type: &str, output_type: &str) -> bool {
        self.catalog.validate(input_type, output_type)
    }

    /// Converts `bytes` of `input_type` into `output_type`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedConversion`] when the pair is not in the catalog
    ///   or the input has no engine category; no engine is invoked.
    /// - [`Error::EngineUnavailable`] before initialization has completed or
    ///   when the category's engine failed to load.
    /// - [`Error::TransformFailure`] when the engine fails.
    pub async fn convert(
        &self,
        bytes: &[u8],
        input_type: &str,
        output_type: &str,
    ) -> Result<ConversionResult, Error> {
        let (input, output) = match (FormatType::from_mime(input_type), FormatType::from_mime(output_type)) {
            (Some(input), Some(output)) if self.catalog.permits(input, output) => (input, output),
            _ => return Err(Error::unsupported(input_type, output_type)),
        };
        let category = Category::classify(input.mime());
        if category == Category::Unknown {
            return Err(Error::unsupported(input_type, output_type));
        }

        let engines = self.engines.get().ok_or_else(|| {
            Error::EngineUnavailable("conversion engines have not finished loading".to_string())
        })?;
        let engine = engines
            .engine(category)
            .map_err(|err| Error::from_engine(category, err))?;

        debug!(
            engine = engine.name(),
            %input,
            %output,
            size = bytes.len(),
            "dispatching conversion"
        );
        let converted = engine
            .transform(TransformRequest::new(bytes.to_vec(), input, output))
            .await
            .map_err(|err| Error::from_engine(category, err))?;

        let result = ConversionResult::new(converted, output, &self.options.output_stem);
        info!(
            file = %result.file_name,
            size = result.len(),
            "conversion complete"
        );
        Ok(result)
    }

    /// Converts a user-supplied file using its declared or inferred MIME type.
    pub async fn convert_file(
        &self,
        file: &InputFile,
        output_type: &str,
    ) -> Result<ConversionResult, Error> {
        self.convert(&file.bytes, &file.mime, output_type).await
    }
}

impl Default for Converter {
    fn default() -> Self {
        Converter::new(ConverterOptions::default())
    }
}
