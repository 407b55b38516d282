use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::{ClassifierError, Result};
use crate::vectorizer::analyzer::{AnalyzerConfig, StandardPreprocessor, TextPreprocessor};
use crate::vectorizer::token::TermFrequency;

/// Document identifier as it appears in the taxonomy source
pub type DocId = String;

/// Corpus-wide statistics: document count N and per-term document frequency.
/// Built once by [`CorpusBuilder::finalize`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    doc_num: u64,
    #[serde(with = "indexmap::map::serde_seq")]
    doc_freq: IndexMap<Box<str>, u64>,
}

impl CorpusStats {
    /// total documents N
    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// documents containing `term` at least once; 0 for unseen terms
    #[inline]
    pub fn doc_freq(&self, term: &str) -> u64 {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.doc_freq.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.doc_freq.iter().map(|(t, df)| (t.as_ref(), *df))
    }

    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        if self.doc_num == 0 {
            return Err("corpus statistics with zero documents".to_string());
        }
        let mut prev: Option<&str> = None;
        for (term, df) in self.iter() {
            if df == 0 || df > self.doc_num {
                return Err(format!("document frequency {df} of `{term}` outside 1..={}", self.doc_num));
            }
            if let Some(p) = prev {
                if p >= term {
                    return Err(format!("terms out of order at `{term}`"));
                }
            }
            prev = Some(term);
        }
        Ok(())
    }
}

/// Bag-of-words corpus artifact: the analyzer used, the statistics, and the
/// raw term counts of every document in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowCorpus {
    pub analyzer: AnalyzerConfig,
    pub stats: CorpusStats,
    #[serde(with = "indexmap::map::serde_seq")]
    pub documents: IndexMap<DocId, TermFrequency>,
}

impl BowCorpus {
    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        self.stats.check()?;
        if self.documents.len() as u64 != self.stats.doc_num() {
            return Err(format!(
                "{} documents stored but N = {}",
                self.documents.len(),
                self.stats.doc_num()
            ));
        }
        for (id, freq) in self.documents.iter() {
            freq.check().map_err(|e| format!("document `{id}`: {e}"))?;
        }
        Ok(())
    }
}

impl Artifact for BowCorpus {
    const KIND: ArtifactKind = ArtifactKind::BowCorpus;

    fn validate(&self) -> std::result::Result<(), String> {
        self.check()
    }
}

/// Accumulates documents into term-frequency vectors and the df table.
///
/// ```
/// use taxonomy_classifier::CorpusBuilder;
/// let mut builder = CorpusBuilder::new();
/// builder.add_document("d1", "rust is fast").unwrap();
/// builder.add_document("d2", "rust is safe").unwrap();
/// let corpus = builder.finalize().unwrap();
/// assert_eq!(corpus.stats.doc_num(), 2);
/// assert_eq!(corpus.stats.doc_freq("rust"), 2);
/// ```
#[derive(Debug)]
pub struct CorpusBuilder<P = StandardPreprocessor>
where
    P: TextPreprocessor,
{
    preprocessor: P,
    analyzer: AnalyzerConfig,
    documents: IndexMap<DocId, TermFrequency>,
    doc_freq: IndexMap<Box<str>, u64>,
}

impl CorpusBuilder<StandardPreprocessor> {
    pub fn new() -> Self {
        Self::with_analyzer(AnalyzerConfig::default())
    }

    pub fn with_analyzer(analyzer: AnalyzerConfig) -> Self {
        CorpusBuilder::with_preprocessor(StandardPreprocessor::new(analyzer.clone()), analyzer)
    }
}

impl Default for CorpusBuilder<StandardPreprocessor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> CorpusBuilder<P>
where
    P: TextPreprocessor,
{
    /// `analyzer` is recorded in the artifact; it should describe what
    /// `preprocessor` does so that queries can be tokenized the same way.
    pub fn with_preprocessor(preprocessor: P, analyzer: AnalyzerConfig) -> Self {
        Self {
            preprocessor,
            analyzer,
            documents: IndexMap::new(),
            doc_freq: IndexMap::new(),
        }
    }

    pub fn add_document(&mut self, id: &str, raw_text: &str) -> Result<()> {
        if self.documents.contains_key(id) {
            return Err(ClassifierError::DuplicateDocument(id.to_string()));
        }
        let terms = self.preprocessor.terms(raw_text);
        let freq = TermFrequency::from_terms(&terms);
        if freq.is_empty() {
            debug!(doc = id, "document has no terms, kept as zero vector");
        }
        // 文書内で何回出ても df は 1 だけ増える
        for term in freq.term_set() {
            match self.doc_freq.get_mut(term) {
                Some(df) => *df += 1,
                None => {
                    self.doc_freq.insert(term.into(), 1);
                }
            }
        }
        self.documents.insert(id.to_string(), freq);
        Ok(())
    }

    #[inline]
    pub fn doc_num(&self) -> usize {
        self.documents.len()
    }

    pub fn finalize(self) -> Result<BowCorpus> {
        if self.documents.is_empty() {
            return Err(ClassifierError::EmptyCorpus);
        }
        let mut doc_freq = self.doc_freq;
        doc_freq.sort_unstable_keys();
        let stats = CorpusStats {
            doc_num: self.documents.len() as u64,
            doc_freq,
        };
        info!(documents = stats.doc_num(), vocabulary = stats.vocab_size(), "corpus finalized");
        Ok(BowCorpus {
            analyzer: self.analyzer,
            stats,
            documents: self.documents,
        })
    }
}

#[cfg(test)]
pub(crate) fn stats_from_pairs(doc_num: u64, pairs: &[(&str, u64)]) -> CorpusStats {
    let mut doc_freq: IndexMap<Box<str>, u64> = pairs.iter().map(|(t, df)| ((*t).into(), *df)).collect();
    doc_freq.sort_unstable_keys();
    CorpusStats { doc_num, doc_freq }
}
