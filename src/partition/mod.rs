use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::{ClassifierError, Result};
use crate::taxonomy::{CategoryId, SubtreeFilter, Taxonomy};
use crate::utils::math::vector::TermVector;
use crate::vectorizer::corpus::DocId;

pub const DEFAULT_MIN_CATEGORY_SIZE: usize = 100;
pub const DEFAULT_KEYWORD_COUNT: usize = 10;

/// One retained category: members, normalized centroid, top keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub member_count: usize,
    /// member documents in corpus order
    pub members: Vec<DocId>,
    pub centroid: TermVector,
    /// centroid terms by descending weight, ties by term
    pub keywords: Vec<String>,
}

/// Categories that survived filtering and the minimum-size threshold,
/// keyed by category name in lexical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPartition {
    pub root: String,
    pub min_category_size: usize,
    pub keyword_count: usize,
    #[serde(with = "indexmap::map::serde_seq")]
    pub categories: IndexMap<String, CategoryEntry>,
}

impl CategoryPartition {
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CategoryEntry> {
        self.categories.get(name)
    }

    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        let mut prev: Option<&str> = None;
        for (name, entry) in self.categories.iter() {
            if let Some(p) = prev {
                if p >= name.as_str() {
                    return Err(format!("categories out of order at `{name}`"));
                }
            }
            if entry.member_count < self.min_category_size {
                return Err(format!(
                    "category `{name}` has {} members, below the threshold {}",
                    entry.member_count, self.min_category_size
                ));
            }
            if entry.member_count != entry.members.len() {
                return Err(format!("category `{name}` member count mismatch"));
            }
            if entry.keywords.len() > self.keyword_count {
                return Err(format!("category `{name}` has too many keywords"));
            }
            entry.centroid.check().map_err(|e| format!("category `{name}`: {e}"))?;
            prev = Some(name.as_str());
        }
        Ok(())
    }
}

impl Artifact for CategoryPartition {
    const KIND: ArtifactKind = ArtifactKind::CategoryPartition;

    fn validate(&self) -> std::result::Result<(), String> {
        self.check()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionConfig {
    pub root: String,
    pub filter: SubtreeFilter,
    pub min_category_size: usize,
    pub keyword_count: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            root: "Top".to_string(),
            filter: SubtreeFilter::default(),
            min_category_size: DEFAULT_MIN_CATEGORY_SIZE,
            keyword_count: DEFAULT_KEYWORD_COUNT,
        }
    }
}

/// Walks the taxonomy under a root and turns every category with enough
/// member documents into a centroid.
///
/// Membership is the union of documents attached anywhere in the category's
/// subtree, counting only attachments made at categories that pass the
/// subtree filter. A category below the threshold is left out; its
/// documents are still members of whichever ancestors are retained, and
/// are never reassigned elsewhere.
pub struct CategoryPartitioner<'a> {
    taxonomy: &'a Taxonomy,
    config: &'a PartitionConfig,
}

impl<'a> CategoryPartitioner<'a> {
    pub fn new(taxonomy: &'a Taxonomy, config: &'a PartitionConfig) -> Self {
        Self { taxonomy, config }
    }

    fn root_id(&self) -> Result<CategoryId> {
        self.taxonomy.find(&self.config.root).ok_or_else(|| {
            ClassifierError::invalid_argument(format!("root category `{}` not found", self.config.root))
        })
    }

    /// Documents in scope: attached at some in-scope category that passes
    /// the filter. Taxonomy order.
    pub fn scoped_documents(&self) -> Result<Vec<(&'a str, &'a str)>> {
        let (in_scope, passes) = self.scope()?;
        Ok(self
            .taxonomy
            .documents()
            .filter(|(id, _)| {
                self.taxonomy
                    .document_categories(id)
                    .iter()
                    .any(|c| in_scope[c.index()] && passes[c.index()])
            })
            .collect())
    }

    /// (reachable from root, passes filter) indexed by category slot
    fn scope(&self) -> Result<(Vec<bool>, Vec<bool>)> {
        let root = self.root_id()?;
        let n = self.taxonomy.category_count();
        let mut in_scope = vec![false; n];
        let mut passes = vec![false; n];
        for id in self.taxonomy.subtree(root) {
            in_scope[id.index()] = true;
            if let Some(cat) = self.taxonomy.category(id) {
                passes[id.index()] = self.config.filter.allows(&cat.name);
            }
        }
        Ok((in_scope, passes))
    }

    /// category -> member indices into `vectors`, ascending
    fn membership(
        &self,
        vectors: &IndexMap<DocId, TermVector>,
    ) -> Result<HashMap<CategoryId, Vec<usize>>> {
        let root = self.root_id()?;
        let (in_scope, passes) = self.scope()?;
        let mut members: HashMap<CategoryId, Vec<usize>> = HashMap::new();
        let mut doc_cats: Vec<CategoryId> = Vec::new();
        for (doc_id, _) in self.taxonomy.documents() {
            doc_cats.clear();
            for &attached in self.taxonomy.document_categories(doc_id) {
                if !(in_scope[attached.index()] && passes[attached.index()]) {
                    continue;
                }
                for anc in self.taxonomy.ancestors(attached) {
                    if passes[anc.index()] && !doc_cats.contains(&anc) {
                        doc_cats.push(anc);
                    }
                    if anc == root {
                        break;
                    }
                }
            }
            if doc_cats.is_empty() {
                continue;
            }
            let idx = vectors.get_index_of(doc_id).ok_or_else(|| {
                ClassifierError::invalid_argument(format!("document `{doc_id}` has no weighted vector"))
            })?;
            for cat in doc_cats.iter() {
                members.entry(*cat).or_default().push(idx);
            }
        }
        members.values_mut().for_each(|m| m.sort_unstable());
        Ok(members)
    }

    pub fn partition(&self, vectors: &IndexMap<DocId, TermVector>) -> Result<CategoryPartition> {
        let root = self.root_id()?;
        let mut members = self.membership(vectors)?;
        let min = self.config.min_category_size;

        let mut retained: Vec<(String, Vec<usize>)> = Vec::new();
        let mut pruned = 0_usize;
        for id in self.taxonomy.subtree(root) {
            let Some(cat) = self.taxonomy.category(id) else { continue };
            if !self.config.filter.allows(&cat.name) {
                continue;
            }
            let docs = members.remove(&id).unwrap_or_default();
            if docs.len() >= min {
                retained.push((cat.name.clone(), docs));
            } else {
                debug!(category = %cat.name, members = docs.len(), min, "category pruned");
                pruned += 1;
            }
        }

        let keyword_count = self.config.keyword_count;
        let entries: Vec<(String, CategoryEntry)> = retained
            .into_par_iter()
            .map(|(name, docs)| {
                let entry = build_entry(&docs, vectors, keyword_count);
                (name, entry)
            })
            .collect();

        let mut categories: IndexMap<String, CategoryEntry> = entries.into_iter().collect();
        categories.sort_unstable_keys();
        info!(retained = categories.len(), pruned, min_category_size = min, "category partition built");

        Ok(CategoryPartition {
            root: self.config.root.clone(),
            min_category_size: min,
            keyword_count,
            categories,
        })
    }
}

/// mean of member vectors, re-normalized
fn build_entry(docs: &[usize], vectors: &IndexMap<DocId, TermVector>, keyword_count: usize) -> CategoryEntry {
    let member_vectors = docs.iter().filter_map(|i| vectors.get_index(*i));
    let mut centroid = TermVector::sum(member_vectors.clone().map(|(_, v)| v));
    if !docs.is_empty() {
        centroid.scale(1.0 / docs.len() as f64);
    }
    centroid.normalize();
    let keywords = centroid
        .top_terms(keyword_count)
        .into_iter()
        .map(|(t, _)| t.to_string())
        .collect();
    CategoryEntry {
        member_count: docs.len(),
        members: member_vectors.map(|(id, _)| id.clone()).collect(),
        centroid,
        keywords,
    }
}
