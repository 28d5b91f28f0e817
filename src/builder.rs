use std::{borrow::Cow, sync::Arc};

use crate::{
    catalog::FormatCatalog, converter::Converter, engines::default_engines,
    options::ConverterOptions, traits::Engine,
};

/// Builder for creating a `Converter` with a fluent interface.
///
/// By default the converter uses the built-in catalog and the built-in engine
/// for every category. Engines added with [`ConverterBuilder::engine`] replace
/// the engine registered for the same category.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use mimeforge::{Converter, ConverterOptions, engines::AudioEngine};
///
/// let converter = Converter::builder()
///     .options(ConverterOptions::new().with_jpeg_quality(80))
///     .engine(Arc::new(AudioEngine::new("/opt/ffmpeg/bin/ffmpeg".into())))
///     .build();
/// assert!(!converter.is_ready());
/// ```
pub struct ConverterBuilder {
    options: ConverterOptions,
    catalog: Option<FormatCatalog>,
    engines: Vec<Arc<dyn Engine>>,
    default_engines: bool,
}

impl ConverterBuilder {
    /// Creates a builder with default options and the built-in engines.
    pub fn new() -> Self {
        Self {
            options: ConverterOptions::default(),
            catalog: None,
            engines: Vec::new(),
            default_engines: true,
        }
    }

    /// Sets the converter options.
    pub fn options(mut self, options: ConverterOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses `catalog` instead of the built-in table.
    pub fn catalog(mut self, catalog: FormatCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Registers an engine, replacing any earlier one for its category.
    pub fn engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engines.push(engine);
        self
    }

    /// Registers only the engines added with [`ConverterBuilder::engine`].
    pub fn without_default_engines(mut self) -> Self {
        self.default_engines = false;
        self
    }

    /// Builds the converter. Engines are not initialized yet.
    pub fn build(self) -> Converter {
        let mut registered = if self.default_engines {
            default_engines(&self.options)
        } else {
            Vec::new()
        };
        registered.extend(self.engines);

        let catalog = match self.catalog {
            Some(catalog) => Cow::Owned(catalog),
            None => Cow::Borrowed(FormatCatalog::global()),
        };
        Converter::from_parts(catalog, self.options, registered)
    }
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engines::{SpreadsheetEngine, TextEngine},
        formats::{Category, FormatType},
    };

    #[tokio::test]
    async fn test_default_build_registers_every_category() {
        let converter = ConverterBuilder::new().build();
        let readiness = converter.initialize().await;
        for category in [Category::Image, Category::Document, Category::Spreadsheet, Category::Text] {
            assert!(readiness.is_ready(category), "{category}");
        }
        // audio depends on ffmpeg being installed, but is always registered
        assert!(readiness.status(Category::Audio).is_some());
    }

    #[tokio::test]
    async fn test_custom_catalog_and_engines() {
        let catalog = FormatCatalog::from_entries(vec![(FormatType::Csv, vec![FormatType::Json])]).unwrap();
        let converter = ConverterBuilder::new()
            .catalog(catalog)
            .without_default_engines()
            .engine(Arc::new(SpreadsheetEngine::new()))
            .engine(Arc::new(TextEngine::new()))
            .build();

        assert_eq!(converter.available_outputs("text/csv"), vec!["application/json"]);
        assert!(converter.available_outputs("image/png").is_empty());
        assert!(!converter.validate("text/csv", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"));

        let readiness = converter.initialize().await;
        assert!(readiness.is_ready(Category::Spreadsheet));
        assert_eq!(readiness.status(Category::Image), None);
    }

    #[test]
    fn test_options_are_kept() {
        let converter = ConverterBuilder::new()
            .options(ConverterOptions::new().with_output_stem("result"))
            .build();
        assert_eq!(converter.options().output_stem, "result");
    }
}
