use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{InitConfig, LoadConfig};
use crate::error::{ClassifierError, Result};
use crate::model::{CategoryScore, Classification, ClassifierModel};
use crate::pipeline;

pub const DEFAULT_MAX_CATEGORIES: i64 = 3;

fn default_max_categories() -> i64 {
    DEFAULT_MAX_CATEGORIES
}

/// Host-facing classify call: `{"text": "...", "maxCategories": 3}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub text: String,
    #[serde(default = "default_max_categories")]
    pub max_categories: i64,
}

impl ClassifyRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), max_categories: DEFAULT_MAX_CATEGORIES }
    }

    fn max_categories(&self) -> Result<usize> {
        if self.max_categories < 0 {
            return Err(ClassifierError::invalid_argument(format!(
                "maxCategories must be non-negative, got {}",
                self.max_categories
            )));
        }
        Ok(usize::try_from(self.max_categories).unwrap_or(usize::MAX))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassifierState {
    Unloaded,
    Loading,
    Ready,
}

/// Marks a load or train in flight for [`Classifier::state`]
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serving side of the classifier.
///
/// Holds at most one published [`ClassifierModel`]. Readers clone the
/// `Arc` under a short read lock and classify against that snapshot
/// without holding any lock. Loads and retrains build the replacement off
/// to the side and swap it in only once it is complete, so a failure leaves
/// the current model untouched and in-flight requests keep the old one.
///
/// ```no_run
/// use taxonomy_classifier::{Classifier, LoadConfig};
///
/// let classifier = Classifier::new();
/// classifier.load(&LoadConfig::new("model.bin")).unwrap();
/// let result = classifier.classify("basketball game tonight", 3).unwrap();
/// println!("{:?}", result.categories);
/// ```
#[derive(Debug, Default)]
pub struct Classifier {
    current: RwLock<Option<Arc<ClassifierModel>>>,
    loading: AtomicUsize,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: ClassifierModel) -> Self {
        let classifier = Self::new();
        classifier.publish(model);
        classifier
    }

    pub fn state(&self) -> ClassifierState {
        if self.loading.load(Ordering::SeqCst) > 0 {
            ClassifierState::Loading
        } else if self.current.read().is_some() {
            ClassifierState::Ready
        } else {
            ClassifierState::Unloaded
        }
    }

    /// The currently published model
    pub fn snapshot(&self) -> Result<Arc<ClassifierModel>> {
        self.current.read().clone().ok_or(ClassifierError::NotInitialized)
    }

    /// Make `model` current; returns the published handle
    pub fn publish(&self, model: ClassifierModel) -> Arc<ClassifierModel> {
        let model = Arc::new(model);
        let previous = self.current.write().replace(Arc::clone(&model));
        info!(
            categories = model.category_count(),
            replaced = previous.is_some(),
            "classifier model published"
        );
        model
    }

    fn guarded<F>(&self, what: &str, build: F) -> Result<Arc<ClassifierModel>>
    where
        F: FnOnce() -> Result<ClassifierModel>,
    {
        let _guard = LoadingGuard::enter(&self.loading);
        match build() {
            Ok(model) => Ok(self.publish(model)),
            Err(e) => {
                warn!(error = %e, "{what} failed; current model kept");
                Err(e)
            }
        }
    }

    /// Load a persisted model and publish it
    pub fn load(&self, config: &LoadConfig) -> Result<Arc<ClassifierModel>> {
        self.guarded("load", || ClassifierModel::load_from_path(&config.classifier))
    }

    pub fn load_from_reader<R: Read>(&self, source: &mut R) -> Result<Arc<ClassifierModel>> {
        self.guarded("load", || ClassifierModel::load(source))
    }

    /// Train from the corpus and partition artifacts, persist, then publish
    pub fn init(&self, config: &InitConfig) -> Result<Arc<ClassifierModel>> {
        self.guarded("init", || pipeline::init(config))
    }

    /// Load `config.classifier` when it exists, otherwise train it with `init`
    pub fn open(&self, config: &InitConfig) -> Result<Arc<ClassifierModel>> {
        if config.classifier.exists() {
            info!(path = %config.classifier.display(), "found a trained model");
            self.load(&LoadConfig::new(config.classifier.clone()))
        } else {
            self.init(config)
        }
    }

    pub fn classify(&self, text: &str, max_categories: usize) -> Result<Classification> {
        Ok(self.snapshot()?.classify(text, max_categories))
    }

    pub fn classify_request(&self, request: &ClassifyRequest) -> Result<Classification> {
        let max = request.max_categories()?;
        self.classify(&request.text, max)
    }

    pub fn classify_unique(&self, text: &str, max_categories: usize) -> Result<Classification> {
        Ok(self.snapshot()?.classify_unique(text, max_categories))
    }

    pub fn classify_top(&self, text: &str) -> Result<Option<CategoryScore>> {
        Ok(self.snapshot()?.classify_top(text))
    }
}
