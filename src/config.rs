//! Configuration documents for `construct`, `init` and `load`.
//!
//! Each operation takes a JSON object keyed the way the host bindings name
//! them (`rdfPath`, `bow`, `bowPart`, `categoryMinSize`, `filter`,
//! `classifier`). Parsing goes through a lenient raw form, then `validate`
//! produces a resolved config or an `InvalidConfig` error. Nothing touches
//! the filesystem before validation succeeds.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ClassifierError, Result};
use crate::partition::{PartitionConfig, DEFAULT_KEYWORD_COUNT, DEFAULT_MIN_CATEGORY_SIZE};
use crate::taxonomy::SubtreeFilter;
use crate::vectorizer::analyzer::AnalyzerConfig;

fn required_path(value: Option<PathBuf>, key: &str) -> Result<PathBuf> {
    match value {
        Some(p) if !p.as_os_str().is_empty() => Ok(p),
        _ => Err(ClassifierError::invalid_config(format!("missing required field `{key}`"))),
    }
}

fn non_negative(value: Option<i64>, key: &str, default: usize) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(v) if v >= 0 => Ok(v as usize),
        Some(v) => Err(ClassifierError::invalid_config(format!("`{key}` must be non-negative, got {v}"))),
    }
}

fn parse_json<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| ClassifierError::invalid_config(e.to_string()))
}

fn read_config_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ClassifierError::io(format!("reading config {}", path.display()), e))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructParams {
    #[serde(alias = "rdfPath")]
    pub taxonomy_path: Option<PathBuf>,
    pub bow: Option<PathBuf>,
    pub bow_part: Option<PathBuf>,
    pub category_min_size: Option<i64>,
    pub keyword_count: Option<i64>,
    pub root: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub analyzer: Option<AnalyzerConfig>,
}

impl ConstructParams {
    pub fn validate(self) -> Result<ConstructConfig> {
        let taxonomy_path = required_path(self.taxonomy_path, "rdfPath")?;
        let bow = required_path(self.bow, "bow")?;
        let bow_part = required_path(self.bow_part, "bowPart")?;
        let min_category_size = non_negative(self.category_min_size, "categoryMinSize", DEFAULT_MIN_CATEGORY_SIZE)?;
        let keyword_count = non_negative(self.keyword_count, "keywordCount", DEFAULT_KEYWORD_COUNT)?;
        let root = match self.root {
            Some(r) if r.trim().is_empty() => {
                return Err(ClassifierError::invalid_config("`root` must not be empty"));
            }
            Some(r) => r.trim().trim_end_matches('/').to_string(),
            None => "Top".to_string(),
        };
        Ok(ConstructConfig {
            taxonomy_path,
            bow,
            bow_part,
            partition: PartitionConfig {
                root,
                filter: SubtreeFilter::new(self.include, self.exclude),
                min_category_size,
                keyword_count,
            },
            analyzer: self.analyzer.unwrap_or_default(),
        })
    }
}

/// Resolved `construct` configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructConfig {
    pub taxonomy_path: PathBuf,
    /// output bag-of-words corpus
    pub bow: PathBuf,
    /// output category partition
    pub bow_part: PathBuf,
    pub partition: PartitionConfig,
    pub analyzer: AnalyzerConfig,
}

impl ConstructConfig {
    /// Defaults for everything but the three paths
    pub fn new(taxonomy_path: impl Into<PathBuf>, bow: impl Into<PathBuf>, bow_part: impl Into<PathBuf>) -> Self {
        Self {
            taxonomy_path: taxonomy_path.into(),
            bow: bow.into(),
            bow_part: bow_part.into(),
            partition: PartitionConfig::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        parse_json::<ConstructParams>(json)?.validate()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_json(&read_config_file(path)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitParams {
    pub bow: Option<PathBuf>,
    pub bow_part: Option<PathBuf>,
    pub filter: Option<PathBuf>,
    pub classifier: Option<PathBuf>,
}

impl InitParams {
    pub fn validate(self) -> Result<InitConfig> {
        Ok(InitConfig {
            bow: required_path(self.bow, "bow")?,
            bow_part: required_path(self.bow_part, "bowPart")?,
            filter: required_path(self.filter, "filter")?,
            classifier: required_path(self.classifier, "classifier")?,
        })
    }
}

/// Resolved `init` configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitConfig {
    pub bow: PathBuf,
    pub bow_part: PathBuf,
    /// category filter file
    pub filter: PathBuf,
    /// output classifier model
    pub classifier: PathBuf,
}

impl InitConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        parse_json::<InitParams>(json)?.validate()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_json(&read_config_file(path)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadParams {
    pub classifier: Option<PathBuf>,
}

impl LoadParams {
    pub fn validate(self) -> Result<LoadConfig> {
        Ok(LoadConfig {
            classifier: required_path(self.classifier, "classifier")?,
        })
    }
}

/// Resolved `load` configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub classifier: PathBuf,
}

impl LoadConfig {
    pub fn new(classifier: impl Into<PathBuf>) -> Self {
        Self { classifier: classifier.into() }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        parse_json::<LoadParams>(json)?.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_defaults_and_aliases() {
        let cfg = ConstructConfig::from_json(
            r#"{"rdfPath": "dmoz.tsv", "bow": "out.bow", "bowPart": "out.part"}"#,
        )
        .unwrap();
        assert_eq!(cfg.taxonomy_path, PathBuf::from("dmoz.tsv"));
        assert_eq!(cfg.partition.min_category_size, 100);
        assert_eq!(cfg.partition.keyword_count, 10);
        assert_eq!(cfg.partition.root, "Top");
        assert_eq!(cfg.analyzer, AnalyzerConfig::default());
    }

    #[test]
    fn construct_optional_fields() {
        let cfg = ConstructConfig::from_json(
            r#"{"taxonomyPath": "t.tsv", "bow": "b", "bowPart": "p", "categoryMinSize": 5,
                "root": "Top/Sports/", "exclude": ["Top/Sports/Chess"], "keywordCount": 4}"#,
        )
        .unwrap();
        assert_eq!(cfg.partition.min_category_size, 5);
        assert_eq!(cfg.partition.keyword_count, 4);
        assert_eq!(cfg.partition.root, "Top/Sports");
        assert_eq!(cfg.partition.filter.exclude, vec!["Top/Sports/Chess".to_string()]);
    }

    #[test]
    fn missing_required_fields_are_invalid_config() {
        for json in [
            r#"{"bow": "b", "bowPart": "p"}"#,
            r#"{"rdfPath": "t", "bowPart": "p"}"#,
            r#"{"rdfPath": "t", "bow": "", "bowPart": "p"}"#,
            r#"{"rdfPath": "t", "bow": "b", "bowPart": "p", "categoryMinSize": -1}"#,
            r#"{"rdfPath": "t", "bow": "b", "bowPart": "p", "categoryMinSize": "many"}"#,
            r#"not json"#,
        ] {
            assert!(
                matches!(ConstructConfig::from_json(json), Err(ClassifierError::InvalidConfig(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn init_requires_all_four_paths() {
        let ok = InitConfig::from_json(r#"{"bow":"b","bowPart":"p","filter":"f","classifier":"c"}"#).unwrap();
        assert_eq!(ok.classifier, PathBuf::from("c"));
        let err = InitConfig::from_json(r#"{"bow":"b","bowPart":"p","classifier":"c"}"#).unwrap_err();
        assert!(err.to_string().contains("filter"));
    }

    #[test]
    fn load_requires_classifier() {
        assert!(LoadConfig::from_json(r#"{"classifier":"model.bin"}"#).is_ok());
        assert!(matches!(LoadConfig::from_json("{}"), Err(ClassifierError::InvalidConfig(_))));
    }
}
