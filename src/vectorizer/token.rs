use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

///  TermFrequency 構造体
/// 1 文書内の term 出現回数を管理します
///
/// The raw counts are what the corpus artifact stores; weighting happens
/// later against the frozen document-frequency table.
///
/// # Examples
/// ```
/// use taxonomy_classifier::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_terms(&["rust", "fast", "rust"]);
/// assert_eq!(freq.term_count("rust"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<Box<str>, u32>,
    total_term_count: u64,
}

/// term の追加
impl TermFrequency {
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        match self.term_count.get_mut(term) {
            Some(count) => *count += 1,
            None => {
                self.term_count.insert(term.into(), 1);
            }
        }
        self.total_term_count += 1;
        self
    }

    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    /// Count a term sequence and leave the map in term order
    pub fn from_terms<T>(terms: &[T]) -> Self
    where
        T: AsRef<str>,
    {
        let mut freq = Self::new();
        freq.add_terms(terms);
        freq.sort_terms();
        freq
    }

    /// term 昇順に並べ替え (保存時の決定性のため)
    pub fn sort_terms(&mut self) {
        self.term_count.sort_unstable_keys();
    }
}

/// 参照系
impl TermFrequency {
    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// total number of term occurrences
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// number of distinct terms
    #[inline]
    pub fn len(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.term_count.iter().map(|(t, c)| (t.as_ref(), *c))
    }

    pub fn term_set(&self) -> impl Iterator<Item = &str> + '_ {
        self.term_count.keys().map(|t| t.as_ref())
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        let mut sum = 0_u64;
        let mut prev: Option<&str> = None;
        for (term, count) in self.iter() {
            if count == 0 {
                return Err(format!("zero count for `{term}`"));
            }
            if let Some(p) = prev {
                if p >= term {
                    return Err(format!("terms out of order at `{term}`"));
                }
            }
            sum += count as u64;
            prev = Some(term);
        }
        if sum != self.total_term_count {
            return Err(format!(
                "term total {} does not match counts {}",
                self.total_term_count, sum
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_totals() {
        let mut freq = TermFrequency::new();
        freq.add_term("a").add_term("b").add_term("a");
        assert_eq!(freq.term_count("a"), 2);
        assert_eq!(freq.term_count("b"), 1);
        assert_eq!(freq.term_count("zzz"), 0);
        assert_eq!(freq.term_sum(), 3);
        assert_eq!(freq.len(), 2);
    }

    #[test]
    fn from_terms_is_sorted_and_valid() {
        let freq = TermFrequency::from_terms(&["pear", "apple", "pear"]);
        let terms: Vec<_> = freq.term_set().collect();
        assert_eq!(terms, vec!["apple", "pear"]);
        assert!(freq.check().is_ok());
    }

    #[test]
    fn empty_is_valid() {
        let freq = TermFrequency::from_terms::<&str>(&[]);
        assert!(freq.is_empty());
        assert_eq!(freq.term_sum(), 0);
        assert!(freq.check().is_ok());
    }

    #[test]
    fn check_catches_inconsistent_total() {
        let json = r#"{"term_count":[["a",2]],"total_term_count":5}"#;
        let freq: TermFrequency = serde_json::from_str(json).unwrap();
        assert!(freq.check().is_err());
    }
}
