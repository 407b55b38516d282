//! This crate is a hierarchical taxonomy classifier built on TF-IDF category centroids.

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod partition;
pub mod pipeline;
pub mod taxonomy;
pub mod utils;
pub mod vectorizer;

/// Classifier service
/// The serving entry point of this crate. It holds at most one published
/// `ClassifierModel` and answers classify requests against it.
///
/// Internally, it holds:
/// - An `Arc` of the current model behind a short-lived read lock
/// - A counter of loads / retrains in flight
///
/// Loading (`load`, `load_from_reader`) and retraining (`init`) build the new
/// model completely before it is swapped in. A failure leaves the current
/// model untouched; readers in the middle of a request keep the model they
/// started with.
///
/// Classifying before any model is published fails with `NotInitialized`.
pub use classifier::Classifier;

/// Classifier lifecycle: `Unloaded`, `Loading`, `Ready`
pub use classifier::ClassifierState;

/// Host-facing classify parameters (`text`, `maxCategories` defaulting to 3)
pub use classifier::ClassifyRequest;

/// Trained Classifier Model
/// Immutable snapshot of everything needed to classify text:
/// - The frozen corpus statistics (document count and document frequencies)
/// - The analyzer settings used at training time
/// - One L2-normalized centroid per retained category, with keyword summaries
/// - Display aliases from the category filter
///
/// # Serialization
/// `save` / `load` use a versioned CBOR artifact. Equal models serialize to
/// identical bytes, and loading either rebuilds an equal model or fails.
pub use model::ClassifierModel;

/// Classification result: categories by descending cosine similarity (ties by
/// name) and the keywords that explain them
pub use model::{CategoryScore, Classification};

/// Corpus Builder
/// Accumulates documents, counts their terms and builds the document
/// frequency table. `finalize` returns a `BowCorpus` holding the statistics
/// and the raw per-document counts.
///
/// The builder is generic over a `TextPreprocessor`; the default
/// `StandardPreprocessor` lowercases, splits on Unicode word boundaries and
/// drops English stop words.
pub use vectorizer::corpus::{BowCorpus, CorpusBuilder, CorpusStats};

/// Term frequency of a single document
pub use vectorizer::token::TermFrequency;

/// Log TF-IDF weighting against frozen corpus statistics, L2-normalized
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine, VectorWeighter};

/// Tokenization seam and its default implementation
pub use vectorizer::analyzer::{AnalyzerConfig, StandardPreprocessor, TextPreprocessor};

/// Sparse term -> weight vector, sorted by term
pub use utils::math::vector::TermVector;

/// Taxonomy
/// A tree of categories in an index arena, with example documents attached
/// at any node. Loaded from a tab-separated line format.
pub use taxonomy::{CategoryFilter, SubtreeFilter, Taxonomy};

/// Category Partitioner
/// Computes subtree membership under a root, drops categories below the
/// minimum size and turns the rest into centroids with keyword summaries.
pub use partition::{CategoryEntry, CategoryPartition, CategoryPartitioner, PartitionConfig};

/// Configuration documents for `construct`, `init` and `load`
pub use config::{ConstructConfig, InitConfig, LoadConfig};

/// Offline training stages
pub use pipeline::{construct, init, ConstructSummary};

pub use error::{ClassifierError, Result};
