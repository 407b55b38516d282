//! Offline training stages: `construct` turns a taxonomy into the corpus and
//! partition artifacts, `init` turns those into a classifier model.
//!
//! Both are fail-fast. Everything is computed in memory first. `construct`
//! stages the corpus and the partition as temp files and renames them into
//! place only once both are written, so a failed write changes neither.

use serde::Serialize;
use tracing::info;

use crate::artifact;
use crate::config::{ConstructConfig, InitConfig};
use crate::error::Result;
use crate::model::ClassifierModel;
use crate::partition::{CategoryPartition, CategoryPartitioner, PartitionConfig};
use crate::taxonomy::{CategoryFilter, Taxonomy};
use crate::vectorizer::analyzer::AnalyzerConfig;
use crate::vectorizer::corpus::{BowCorpus, CorpusBuilder};
use crate::vectorizer::tfidf::VectorWeighter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructSummary {
    pub documents: u64,
    pub vocabulary: usize,
    pub categories: usize,
}

/// Corpus and partition for the documents under `partition.root`
pub fn build_artifacts(
    taxonomy: &Taxonomy,
    partition: &PartitionConfig,
    analyzer: &AnalyzerConfig,
) -> Result<(BowCorpus, CategoryPartition)> {
    let partitioner = CategoryPartitioner::new(taxonomy, partition);
    let mut builder = CorpusBuilder::with_analyzer(analyzer.clone());
    for (id, text) in partitioner.scoped_documents()? {
        builder.add_document(id, text)?;
    }
    let corpus = builder.finalize()?;

    let weighter: VectorWeighter = VectorWeighter::new(&corpus.stats);
    let vectors = weighter.weigh_corpus(&corpus);

    let partition = partitioner.partition(&vectors)?;
    Ok((corpus, partition))
}

pub fn construct(config: &ConstructConfig) -> Result<ConstructSummary> {
    let taxonomy = Taxonomy::load(&config.taxonomy_path)?;
    let (corpus, partition) = build_artifacts(&taxonomy, &config.partition, &config.analyzer)?;

    // both files are written before either becomes visible
    let bow = artifact::stage(&corpus, &config.bow)?;
    let bow_part = artifact::stage(&partition, &config.bow_part)?;
    bow.commit()?;
    bow_part.commit()?;

    let summary = ConstructSummary {
        documents: corpus.stats.doc_num(),
        vocabulary: corpus.stats.vocab_size(),
        categories: partition.len(),
    };
    info!(
        bow = %config.bow.display(),
        bow_part = %config.bow_part.display(),
        documents = summary.documents,
        categories = summary.categories,
        "construct finished"
    );
    Ok(summary)
}

/// Train a model from the `construct` outputs and persist it
pub fn init(config: &InitConfig) -> Result<ClassifierModel> {
    let corpus: BowCorpus = artifact::load(&config.bow)?;
    let partition: CategoryPartition = artifact::load(&config.bow_part)?;
    let filter = CategoryFilter::load(&config.filter)?;

    let model = ClassifierModel::train_from_corpus(&corpus, &partition, &filter)?;
    model.save_to_path(&config.classifier)?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;
    use crate::taxonomy::SubtreeFilter;

    fn taxonomy() -> Taxonomy {
        let mut t = Taxonomy::new();
        for i in 0..6 {
            t.attach_document("Top/Sports", &format!("s{i}"), &format!("basketball match {i} team")).unwrap();
            t.attach_document("Top/Cooking", &format!("c{i}"), &format!("recipe oven {i} flour")).unwrap();
        }
        t.attach_document("Top/World/Deutsch", "w0", "fussball mannschaft").unwrap();
        t
    }

    #[test]
    fn artifacts_cover_scoped_documents_only() {
        let cfg = PartitionConfig {
            filter: SubtreeFilter::new(vec![], vec!["Top/World".into()]),
            min_category_size: 6,
            ..PartitionConfig::default()
        };
        let (corpus, partition) = build_artifacts(&taxonomy(), &cfg, &AnalyzerConfig::default()).unwrap();
        assert_eq!(corpus.stats.doc_num(), 12);
        assert!(!corpus.documents.contains_key("w0"));
        assert_eq!(partition.categories.keys().collect::<Vec<_>>(), vec!["Top", "Top/Cooking", "Top/Sports"]);
    }

    #[test]
    fn empty_scope_is_empty_corpus() {
        let cfg = PartitionConfig { root: "Top/World/Deutsch".into(), ..PartitionConfig::default() };
        let mut t = Taxonomy::new();
        t.add_category("Top/World/Deutsch").unwrap();
        let err = build_artifacts(&t, &cfg, &AnalyzerConfig::default()).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyCorpus));
    }
}
