use std::marker::PhantomData;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::info;

use crate::utils::math::vector::TermVector;
use crate::vectorizer::corpus::{BowCorpus, CorpusStats, DocId};
use crate::vectorizer::token::TermFrequency;

/// TF と IDF の計算式
pub trait TFIDFEngine {
    /// weight of a term seen `count` (>= 1) times in a document
    fn tf(count: u32) -> f64;
    /// inverse document frequency; must be 0 when `doc_freq` is 0
    fn idf(doc_freq: u64, doc_num: u64) -> f64;
}

/// Log-scaled TF times log IDF:
/// `tf = 1 + ln(c)`, `idf = ln(N / df)`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl TFIDFEngine for DefaultTFIDFEngine {
    #[inline]
    fn tf(count: u32) -> f64 {
        if count == 0 {
            return 0.0;
        }
        1.0 + (count as f64).ln()
    }

    #[inline]
    fn idf(doc_freq: u64, doc_num: u64) -> f64 {
        if doc_freq == 0 || doc_num == 0 {
            return 0.0;
        }
        // df > N は凍結済み統計では起きないが、負の重みは作らない
        (doc_num as f64 / doc_freq as f64).ln().max(0.0)
    }
}

/// Turns raw term counts into L2-normalized TF-IDF vectors against a frozen
/// [`CorpusStats`]. Used unchanged for training documents and for queries;
/// it never updates the statistics.
#[derive(Debug, Clone, Copy)]
pub struct VectorWeighter<'a, E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    stats: &'a CorpusStats,
    _marker: PhantomData<E>,
}

impl<'a, E> VectorWeighter<'a, E>
where
    E: TFIDFEngine,
{
    pub fn new(stats: &'a CorpusStats) -> Self {
        Self { stats, _marker: PhantomData }
    }

    pub fn stats(&self) -> &CorpusStats {
        self.stats
    }

    /// Weight and normalize one document.
    /// Unknown terms (df = 0) and terms present everywhere (idf = 0) vanish.
    pub fn weigh(&self, freq: &TermFrequency) -> TermVector {
        let doc_num = self.stats.doc_num();
        TermVector::from_pairs(freq.iter().map(|(term, count)| {
            let w = E::tf(count) * E::idf(self.stats.doc_freq(term), doc_num);
            (term, w)
        }))
        .normalized()
    }

    /// Weight every document of a corpus in parallel, keeping document order
    pub fn weigh_corpus(&self, corpus: &BowCorpus) -> IndexMap<DocId, TermVector>
    where
        E: Send + Sync,
    {
        let docs: Vec<(&DocId, &TermFrequency)> = corpus.documents.iter().collect();
        let weighted: Vec<(DocId, TermVector)> = docs
            .par_iter()
            .map(|(id, freq)| ((*id).clone(), self.weigh(freq)))
            .collect();
        info!(documents = weighted.len(), "documents weighted");
        weighted.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::corpus::{stats_from_pairs, CorpusBuilder};

    #[test]
    fn tf_and_idf_formulas() {
        assert_eq!(DefaultTFIDFEngine::tf(1), 1.0);
        assert!((DefaultTFIDFEngine::tf(3) - (1.0 + 3.0_f64.ln())).abs() < 1e-12);
        assert_eq!(DefaultTFIDFEngine::tf(0), 0.0);
        assert!((DefaultTFIDFEngine::idf(1, 4) - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(DefaultTFIDFEngine::idf(0, 4), 0.0);
        assert_eq!(DefaultTFIDFEngine::idf(4, 4), 0.0);
    }

    #[test]
    fn weighted_vector_is_unit_length() {
        let stats = stats_from_pairs(4, &[("ball", 1), ("game", 2), ("team", 4)]);
        let weighter: VectorWeighter = VectorWeighter::new(&stats);
        let freq = TermFrequency::from_terms(&["ball", "ball", "game", "team", "unseen"]);
        let v = weighter.weigh(&freq);

        assert!((v.norm() - 1.0).abs() < 1e-12);
        // idf(team) = 0, unseen df = 0
        assert!(!v.contains("team"));
        assert!(!v.contains("unseen"));

        let ball = (1.0 + 2.0_f64.ln()) * 4.0_f64.ln();
        let game = 2.0_f64.ln();
        let norm = (ball * ball + game * game).sqrt();
        assert!((v.get("ball") - ball / norm).abs() < 1e-12);
        assert!((v.get("game") - game / norm).abs() < 1e-12);
    }

    #[test]
    fn empty_document_stays_zero() {
        let stats = stats_from_pairs(2, &[("a", 1)]);
        let weighter: VectorWeighter = VectorWeighter::new(&stats);
        assert!(weighter.weigh(&TermFrequency::new()).is_zero());
    }

    #[test]
    fn corpus_weighting_keeps_order_and_is_deterministic() {
        let mut builder = CorpusBuilder::new();
        for i in 0..20 {
            builder.add_document(&format!("d{i:02}"), &format!("term{} shared common{}", i % 5, i % 3)).unwrap();
        }
        let corpus = builder.finalize().unwrap();
        let weighter: VectorWeighter = VectorWeighter::new(&corpus.stats);
        let first = weighter.weigh_corpus(&corpus);
        let second = weighter.weigh_corpus(&corpus);
        assert_eq!(first, second);
        let ids: Vec<_> = first.keys().cloned().collect();
        let expected: Vec<_> = corpus.documents.keys().cloned().collect();
        assert_eq!(ids, expected);
    }
}
