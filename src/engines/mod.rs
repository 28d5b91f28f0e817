//! Built-in engines and the initialized engine set.
//!
//! [`EngineSet::initialize`] runs every engine's readiness probe once. The
//! resulting set is the readiness token the router consults: before it exists
//! no conversion may run, and an engine whose probe failed stays registered
//! but unavailable.

pub mod audio;
pub mod document;
pub mod raster;
pub mod spreadsheet;
pub mod text;

mod docx;
mod package;
mod pdf;

use std::{collections::BTreeMap, sync::Arc};

use tracing::{info, warn};

pub use audio::AudioEngine;
pub use document::DocumentEngine;
pub use raster::ImageEngine;
pub use spreadsheet::SpreadsheetEngine;
pub use text::TextEngine;

use crate::{error::EngineError, formats::Category, options::ConverterOptions, traits::Engine};

/// Outcome of one engine's initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Ready,
    Failed(String),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }
}

/// Per-category summary of engine initialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Readiness {
    statuses: BTreeMap<Category, EngineStatus>,
}

impl Readiness {
    /// Status of the engine for `category`, if one is registered.
    pub fn status(&self, category: Category) -> Option<&EngineStatus> {
        self.statuses.get(&category)
    }

    pub fn is_ready(&self, category: Category) -> bool {
        self.status(category).is_some_and(EngineStatus::is_ready)
    }

    /// `true` when every routable category has a ready engine.
    pub fn all_ready(&self) -> bool {
        Category::ROUTABLE.iter().all(|category| self.is_ready(*category))
    }

    /// Categories whose engine failed, with the failure reason.
    pub fn failures(&self) -> Vec<(Category, &str)> {
        self.statuses
            .iter()
            .filter_map(|(category, status)| match status {
                EngineStatus::Failed(reason) => Some((*category, reason.as_str())),
                EngineStatus::Ready => None,
            })
            .collect()
    }
}

struct Slot {
    engine: Arc<dyn Engine>,
    status: EngineStatus,
}

/// The engines available for dispatch, after initialization.
pub struct EngineSet {
    slots: BTreeMap<Category, Slot>,
}

impl EngineSet {
    /// Initializes `engines` one after another and records their status.
    ///
    /// A later engine for the same category replaces an earlier one. Probe
    /// failures never abort initialization; they only mark that engine as
    /// unavailable.
    pub async fn initialize(engines: Vec<Arc<dyn Engine>>) -> EngineSet {
        let mut slots = BTreeMap::new();
        for engine in engines {
            let category = engine.category();
            let status = match engine.initialize().await {
                Ok(()) => {
                    info!(engine = engine.name(), %category, "conversion engine ready");
                    EngineStatus::Ready
                }
                Err(err) => {
                    warn!(engine = engine.name(), %category, error = %err, "conversion engine failed to load");
                    EngineStatus::Failed(err.to_string())
                }
            };
            slots.insert(category, Slot { engine, status });
        }

        let set = EngineSet { slots };
        if !set.readiness().failures().is_empty() {
            warn!("some conversion engines failed to load; related conversions are disabled");
        }
        set
    }

    /// Returns the ready engine for `category`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Unavailable`] when no engine is registered for the
    /// category or its initialization failed.
    pub fn engine(&self, category: Category) -> Result<&Arc<dyn Engine>, EngineError> {
        match self.slots.get(&category) {
            Some(Slot {
                engine,
                status: EngineStatus::Ready,
            }) => Ok(engine),
            Some(Slot {
                engine,
                status: EngineStatus::Failed(reason),
            }) => Err(EngineError::Unavailable(format!(
                "{} engine failed to initialize: {}",
                engine.name(),
                reason
            ))),
            None => Err(EngineError::Unavailable(format!(
                "no {category} engine is registered"
            ))),
        }
    }

    pub fn readiness(&self) -> Readiness {
        Readiness {
            statuses: self
                .slots
                .iter()
                .map(|(category, slot)| (*category, slot.status.clone()))
                .collect(),
        }
    }
}

/// The built-in engine for every routable category.
pub fn default_engines(options: &ConverterOptions) -> Vec<Arc<dyn Engine>> {
    vec![
        Arc::new(ImageEngine::new(options.jpeg_quality)),
        Arc::new(DocumentEngine::new()),
        Arc::new(SpreadsheetEngine::new()),
        Arc::new(AudioEngine::new(options.ffmpeg_path.clone())),
        Arc::new(TextEngine::new()),
    ]
}

/// Runs CPU-bound transform work on the blocking pool.
pub(crate) async fn run_blocking<F>(work: F) -> Result<Vec<u8>, EngineError>
where
    F: FnOnce() -> Result<Vec<u8>, EngineError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformRequest;
    use async_trait::async_trait;

    struct Broken;

    #[async_trait]
    impl Engine for Broken {
        fn category(&self) -> Category {
            Category::Audio
        }

        fn name(&self) -> &'static str {
            "broken"
        }

        async fn initialize(&self) -> Result<(), EngineError> {
            Err(EngineError::Unavailable("probe failed".to_string()))
        }

        async fn transform(&self, _request: TransformRequest) -> Result<Vec<u8>, EngineError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_engine_is_recorded_not_fatal() {
        let engines: Vec<Arc<dyn Engine>> = vec![Arc::new(Broken), Arc::new(TextEngine::new())];
        let set = EngineSet::initialize(engines).await;
        let readiness = set.readiness();

        assert!(readiness.is_ready(Category::Text));
        assert!(!readiness.is_ready(Category::Audio));
        assert!(!readiness.all_ready());
        assert_eq!(readiness.failures(), vec![(Category::Audio, "probe failed")]);

        assert!(set.engine(Category::Text).is_ok());
        let err = set.engine(Category::Audio).err().unwrap();
        assert!(err.to_string().contains("broken engine failed to initialize"));
    }

    #[tokio::test]
    async fn test_missing_category_is_unavailable() {
        let engines: Vec<Arc<dyn Engine>> = vec![Arc::new(TextEngine::new())];
        let set = EngineSet::initialize(engines).await;
        let err = set.engine(Category::Image).err().unwrap();
        assert!(matches!(err, EngineError::Unavailable(_)));
        assert_eq!(set.readiness().status(Category::Image), None);
    }

    #[tokio::test]
    async fn test_later_engine_replaces_earlier() {
        let engines: Vec<Arc<dyn Engine>> = vec![
            Arc::new(Broken),
            Arc::new(AudioEngine::new("ffmpeg".into())),
        ];
        let set = EngineSet::initialize(engines).await;
        assert_eq!(set.slots.len(), 1);
        assert_eq!(set.slots[&Category::Audio].engine.name(), "ffmpeg");
    }
}
