use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artifact::{self, Artifact, ArtifactKind};
use crate::error::{ClassifierError, Result};
use crate::partition::CategoryPartition;
use crate::taxonomy::{CategoryAlias, CategoryFilter};
use crate::utils::math::vector::{math, TermVector};
use crate::utils::sort::top_k_ranked;
use crate::vectorizer::analyzer::{AnalyzerConfig, StandardPreprocessor, TextPreprocessor};
use crate::vectorizer::corpus::{BowCorpus, CorpusStats};
use crate::vectorizer::tfidf::VectorWeighter;
use crate::vectorizer::token::TermFrequency;

/// One scored category in a classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub weight: f64,
}

/// Ranked categories plus representative keywords
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub categories: Vec<CategoryScore>,
    pub keywords: Vec<String>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.keywords.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryModel {
    pub member_count: usize,
    pub centroid: TermVector,
    pub keywords: Vec<String>,
}

/// Persisted part of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ModelData {
    analyzer: AnalyzerConfig,
    stats: CorpusStats,
    root: String,
    keyword_count: usize,
    #[serde(with = "indexmap::map::serde_seq")]
    categories: IndexMap<String, CategoryModel>,
    aliases: Vec<CategoryAlias>,
}

impl Artifact for ModelData {
    const KIND: ArtifactKind = ArtifactKind::ClassifierModel;

    fn validate(&self) -> std::result::Result<(), String> {
        self.stats.check()?;
        if self.root.is_empty() {
            return Err("empty root category".to_string());
        }
        let mut prev: Option<&str> = None;
        for (name, cat) in self.categories.iter() {
            if let Some(p) = prev {
                if p >= name.as_str() {
                    return Err(format!("categories out of order at `{name}`"));
                }
            }
            cat.centroid.check().map_err(|e| format!("category `{name}`: {e}"))?;
            if cat.keywords.len() > self.keyword_count {
                return Err(format!("category `{name}` has too many keywords"));
            }
            prev = Some(name.as_str());
        }
        Ok(())
    }
}

/// The trained classifier: frozen corpus statistics, one centroid per
/// retained category, and keyword summaries.
///
/// Immutable once built. A retrained or reloaded model replaces it as a
/// whole (see [`crate::Classifier`]).
#[derive(Debug, Clone)]
pub struct ClassifierModel {
    data: ModelData,
    preprocessor: StandardPreprocessor,
    /// centroid norms in category order
    centroid_norms: Vec<f64>,
}

impl PartialEq for ClassifierModel {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl ClassifierModel {
    fn from_data(data: ModelData) -> Self {
        let preprocessor = StandardPreprocessor::new(data.analyzer.clone());
        let centroid_norms = data.categories.values().map(|c| c.centroid.norm()).collect();
        Self { data, preprocessor, centroid_norms }
    }

    /// Assemble a model from the corpus statistics and a partition.
    /// Categories removed by `filter` are left out; its aliases are kept for
    /// [`ClassifierModel::clean_name`].
    pub fn train(
        stats: CorpusStats,
        analyzer: AnalyzerConfig,
        partition: &CategoryPartition,
        filter: &CategoryFilter,
    ) -> Result<Self> {
        let mut categories: IndexMap<String, CategoryModel> = IndexMap::new();
        let mut removed = 0_usize;
        for (name, entry) in partition.categories.iter() {
            if !filter.keeps(name) {
                removed += 1;
                continue;
            }
            // centroid の語彙はコーパスの語彙に含まれているはず
            if let Some(term) = entry.centroid.terms().find(|t| stats.doc_freq(t) == 0) {
                return Err(ClassifierError::invalid_argument(format!(
                    "partition does not match corpus: term `{term}` of `{name}` is not in the corpus"
                )));
            }
            categories.insert(
                name.clone(),
                CategoryModel {
                    member_count: entry.member_count,
                    centroid: entry.centroid.clone(),
                    keywords: entry.keywords.clone(),
                },
            );
        }
        categories.sort_unstable_keys();
        if categories.is_empty() {
            warn!("classifier model has no categories; every query will return nothing");
        }
        info!(categories = categories.len(), filtered = removed, "classifier model trained");
        Ok(Self::from_data(ModelData {
            analyzer,
            stats,
            root: partition.root.clone(),
            keyword_count: partition.keyword_count,
            categories,
            aliases: filter.aliases.clone(),
        }))
    }

    /// [`ClassifierModel::train`] with the statistics and analyzer of a corpus artifact
    pub fn train_from_corpus(corpus: &BowCorpus, partition: &CategoryPartition, filter: &CategoryFilter) -> Result<Self> {
        Self::train(corpus.stats.clone(), corpus.analyzer.clone(), partition, filter)
    }

    pub fn category_count(&self) -> usize {
        self.data.categories.len()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.data.categories.keys().map(|k| k.as_str())
    }

    pub fn category(&self, name: &str) -> Option<&CategoryModel> {
        self.data.categories.get(name)
    }

    pub fn stats(&self) -> &CorpusStats {
        &self.data.stats
    }

    pub fn keyword_count(&self) -> usize {
        self.data.keyword_count
    }

    pub fn root(&self) -> &str {
        &self.data.root
    }

    /// Tokenize and weight `text` against the frozen statistics
    pub fn query_vector(&self, text: &str) -> TermVector {
        self.analyzed_query(text).unwrap_or_else(TermVector::new)
    }

    /// Rank categories by cosine similarity to `text`.
    ///
    /// Returns `min(max_categories, category_count)` entries. Only a text
    /// that yields no terms at all (empty, or nothing but stop words) gives
    /// an empty result; words the corpus never saw still get every category,
    /// scored 0 and ordered by name. Keywords come from the returned
    /// categories' keyword lists restricted to terms of the query, or from
    /// the query's own top terms when none of them overlap.
    pub fn classify(&self, text: &str, max_categories: usize) -> Classification {
        if max_categories == 0 {
            return Classification::default();
        }
        let Some(query) = self.analyzed_query(text) else {
            return Classification::default();
        };
        let ranked = self.rank(&query, max_categories);
        let names: Vec<&str> = ranked.iter().map(|(name, _)| *name).collect();
        let keywords = self.keywords_for(&query, &names);
        Classification {
            categories: ranked
                .into_iter()
                .map(|(name, weight)| CategoryScore { category: name.to_string(), weight })
                .collect(),
            keywords,
        }
    }

    /// `None` when the preprocessor keeps no term of `text`
    fn analyzed_query(&self, text: &str) -> Option<TermVector> {
        let terms = self.preprocessor.terms(text);
        if terms.is_empty() {
            return None;
        }
        let freq = TermFrequency::from_terms(&terms);
        let weighter: VectorWeighter = VectorWeighter::new(&self.data.stats);
        Some(weighter.weigh(&freq))
    }

    fn rank(&self, query: &TermVector, max_categories: usize) -> Vec<(&str, f64)> {
        let query_norm = query.norm();
        let scores: Vec<(&str, f64)> = self
            .data
            .categories
            .par_iter()
            .zip(self.centroid_norms.par_iter())
            .map(|((name, cat), norm)| {
                (name.as_str(), math::cosine(query.dot(&cat.centroid), query_norm, *norm))
            })
            .collect();
        top_k_ranked(scores, max_categories)
    }

    fn keywords_for(&self, query: &TermVector, categories: &[&str]) -> Vec<String> {
        if categories.is_empty() {
            return Vec::new();
        }
        let k = self.data.keyword_count;
        let mut shared: BTreeMap<&str, f64> = BTreeMap::new();
        for name in categories {
            let Some(cat) = self.data.categories.get(*name) else { continue };
            for kw in cat.keywords.iter() {
                if query.contains(kw) {
                    shared.insert(kw.as_str(), query.get(kw));
                }
            }
        }
        let picked = if shared.is_empty() {
            query.top_terms(k)
        } else {
            top_k_ranked(shared.into_iter().collect(), k)
        };
        picked.into_iter().map(|(t, _)| t.to_string()).collect()
    }

    /// Display name: first matching alias, otherwise the path below the root
    pub fn clean_name(&self, name: &str) -> String {
        if let Some(alias) = self.data.aliases.iter().find_map(|a| a.apply(name)) {
            return alias;
        }
        match name.strip_prefix(self.data.root.as_str()).and_then(|r| r.strip_prefix('/')) {
            Some(rest) => rest.to_string(),
            None => name.to_string(),
        }
    }

    /// Rank `3 * max_categories` candidates, clean the names and keep the
    /// first (best) occurrence of each, up to `max_categories`. Keywords are
    /// taken from the categories that were kept.
    pub fn classify_unique(&self, text: &str, max_categories: usize) -> Classification {
        if max_categories == 0 {
            return Classification::default();
        }
        let Some(query) = self.analyzed_query(text) else {
            return Classification::default();
        };
        let mut seen = HashSet::new();
        let kept: Vec<(&str, String, f64)> = self
            .rank(&query, max_categories.saturating_mul(3))
            .into_iter()
            .filter_map(|(raw, weight)| {
                let name = self.clean_name(raw);
                seen.insert(name.clone()).then_some((raw, name, weight))
            })
            .take(max_categories)
            .collect();
        let raw_names: Vec<&str> = kept.iter().map(|(raw, _, _)| *raw).collect();
        let keywords = self.keywords_for(&query, &raw_names);
        Classification {
            categories: kept
                .into_iter()
                .map(|(_, category, weight)| CategoryScore { category, weight })
                .collect(),
            keywords,
        }
    }

    /// Best category under its cleaned name
    pub fn classify_top(&self, text: &str) -> Option<CategoryScore> {
        self.classify_unique(text, 1).categories.into_iter().next()
    }

    /// Serialize deterministically: equal models give identical bytes
    pub fn save<W: Write>(&self, sink: &mut W) -> Result<()> {
        artifact::write(&self.data, sink)
    }

    /// Reconstruct a model; fails without side effects on any malformed input
    pub fn load<R: Read>(source: &mut R) -> Result<Self> {
        artifact::read::<ModelData, R>(source).map(Self::from_data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        artifact::to_bytes(&self.data)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        artifact::from_bytes::<ModelData>(bytes).map(Self::from_data)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        artifact::save(&self.data, path)?;
        info!(path = %path.display(), categories = self.category_count(), "classifier model saved");
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let model = artifact::load::<ModelData>(path).map(Self::from_data)?;
        info!(path = %path.display(), categories = model.category_count(), "classifier model loaded");
        Ok(model)
    }
}
