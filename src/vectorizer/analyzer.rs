use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::vectorizer::stem::PorterStemmer;

/// text -> 正規化済み term 列
///
/// Implementations must be deterministic: the same text always yields the
/// same sequence, at training time and at query time.
pub trait TextPreprocessor: Send + Sync {
    fn terms(&self, text: &str) -> Vec<String>;
}

/// Settings of the standard preprocessor.
/// Persisted with the corpus and the model so queries are tokenized exactly
/// like the training documents were.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerConfig {
    pub lowercase: bool,
    pub remove_stop_words: bool,
    /// terms shorter than this (in chars) are dropped
    pub min_term_len: usize,
    pub drop_numeric: bool,
    /// Porter stemming after the stop-word check
    pub stem: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stop_words: true,
            min_term_len: 2,
            drop_numeric: true,
            stem: true,
        }
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Unicode word segmentation + lowercasing + English stop words + Porter stemming
#[derive(Debug, Clone)]
pub struct StandardPreprocessor {
    config: AnalyzerConfig,
    stop_words: HashSet<&'static str>,
    stemmer: Option<PorterStemmer>,
}

impl StandardPreprocessor {
    pub fn new(config: AnalyzerConfig) -> Self {
        let stop_words = if config.remove_stop_words {
            ENGLISH_STOP_WORDS.iter().copied().collect()
        } else {
            HashSet::new()
        };
        let stemmer = config.stem.then(PorterStemmer::new);
        Self { config, stop_words, stemmer }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn keep(&self, term: &str) -> bool {
        if term.chars().count() < self.config.min_term_len {
            return false;
        }
        if self.config.drop_numeric && term.chars().all(|c| c.is_numeric() || c == '.' || c == ',') {
            return false;
        }
        !self.stop_words.contains(term)
    }
}

impl Default for StandardPreprocessor {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl TextPreprocessor for StandardPreprocessor {
    fn terms(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|w| if self.config.lowercase { w.to_lowercase() } else { w.to_string() })
            .filter(|w| self.keep(w))
            .map(|w| match &self.stemmer {
                Some(stemmer) => stemmer.stem(&w),
                None => w,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_drops_stop_words() {
        let p = StandardPreprocessor::default();
        assert_eq!(
            p.terms("The Basketball games are TONIGHT!"),
            vec!["basketbal", "game", "tonight"]
        );
    }

    #[test]
    fn inflected_forms_map_to_one_term() {
        let p = StandardPreprocessor::default();
        assert_eq!(p.terms("games"), p.terms("game"));
        assert_eq!(p.terms("Cooking cooked"), vec!["cook", "cook"]);

        let plain = StandardPreprocessor::new(AnalyzerConfig { stem: false, ..AnalyzerConfig::default() });
        assert_eq!(plain.terms("games"), vec!["games"]);
    }

    #[test]
    fn drops_short_and_numeric_terms() {
        let p = StandardPreprocessor::default();
        assert_eq!(p.terms("x 42 3.14 web2 ok"), vec!["web2", "ok"]);
    }

    #[test]
    fn empty_text_has_no_terms() {
        let p = StandardPreprocessor::default();
        assert!(p.terms("").is_empty());
        assert!(p.terms("  ... !!! ").is_empty());
    }

    #[test]
    fn config_can_keep_everything() {
        let p = StandardPreprocessor::new(AnalyzerConfig {
            lowercase: false,
            remove_stop_words: false,
            min_term_len: 1,
            drop_numeric: false,
            stem: false,
        });
        assert_eq!(p.terms("The 1 Cat"), vec!["The", "1", "Cat"]);
    }

    #[test]
    fn config_json_defaults() {
        let cfg: AnalyzerConfig = serde_json::from_str(r#"{"minTermLen":3}"#).unwrap();
        assert_eq!(cfg.min_term_len, 3);
        assert!(cfg.lowercase);
        assert!(cfg.remove_stop_words);
        assert!(cfg.stem);
    }
}
