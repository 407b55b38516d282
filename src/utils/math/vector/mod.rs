pub mod math;
pub mod serde;

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::utils::sort::top_k_ranked;

/// TermVector は term -> weight の疎ベクトルです
///
/// Entries are unique, sorted by term, and never hold an explicit zero, so
/// an empty map is the zero vector. The sorted order is what makes dot
/// products a single merge pass and serialization byte-stable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermVector {
    entries: IndexMap<Box<str>, f64>,
}

impl TermVector {
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    /// Build from arbitrary `(term, weight)` pairs.
    /// Repeated terms are summed and zero weights dropped.
    pub fn from_pairs<I, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, f64)>,
        T: Into<Box<str>>,
    {
        let mut entries: IndexMap<Box<str>, f64> = IndexMap::new();
        for (term, weight) in pairs {
            *entries.entry(term.into()).or_insert(0.0) += weight;
        }
        entries.retain(|_, w| *w != 0.0);
        entries.sort_unstable_keys();
        Self { entries }
    }

    /// Sum of many vectors; accumulation follows the iterator order so
    /// the result is reproducible bit for bit.
    pub fn sum<'a, I>(vectors: I) -> Self
    where
        I: IntoIterator<Item = &'a TermVector>,
    {
        let mut entries: IndexMap<Box<str>, f64> = IndexMap::new();
        for vector in vectors {
            for (term, weight) in vector.entries.iter() {
                match entries.get_mut(term) {
                    Some(acc) => *acc += *weight,
                    None => {
                        entries.insert(term.clone(), *weight);
                    }
                }
            }
        }
        entries.retain(|_, w| *w != 0.0);
        entries.sort_unstable_keys();
        Self { entries }
    }

    /// number of non-zero entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, term: &str) -> f64 {
        self.entries.get(term).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    /// Iterate `(term, weight)` in term order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(t, w)| (t.as_ref(), *w))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(|t| t.as_ref())
    }

    /// ドット積
    /// d(a, b) = Σ(a_i * b_i)
    pub fn dot(&self, other: &Self) -> f64 {
        let mut a_it = self.entries.iter().fuse();
        let mut b_it = other.entries.iter().fuse();
        let mut a_next = a_it.next();
        let mut b_next = b_it.next();
        let mut dot = 0.0_f64;
        while let (Some((ta, va)), Some((tb, vb))) = (a_next, b_next) {
            match ta.cmp(tb) {
                Ordering::Equal => {
                    dot += va * vb;
                    a_next = a_it.next();
                    b_next = b_it.next();
                }
                Ordering::Less => a_next = a_it.next(),
                Ordering::Greater => b_next = b_it.next(),
            }
        }
        dot
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        math::l2_norm(self.entries.values().copied())
    }

    /// Cosine similarity, zero when either side is the zero vector
    pub fn cosine(&self, other: &Self) -> f64 {
        math::cosine(self.dot(other), self.norm(), other.norm())
    }

    /// Multiply every component by `factor`; a zero factor yields the zero vector.
    pub fn scale(&mut self, factor: f64) {
        if factor == 0.0 {
            self.entries.clear();
            return;
        }
        self.entries.values_mut().for_each(|w| *w *= factor);
    }

    /// L2 正規化 (ゼロベクトルはそのまま)
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 && norm.is_finite() {
            self.scale(1.0 / norm);
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// The `k` heaviest terms, weight descending, ties by term order
    pub fn top_terms(&self, k: usize) -> Vec<(&str, f64)> {
        top_k_ranked(self.iter().collect(), k)
    }

    /// Structural checks used when a vector comes back from disk
    pub(crate) fn check(&self) -> Result<(), String> {
        let mut prev: Option<&str> = None;
        for (term, weight) in self.iter() {
            if let Some(p) = prev {
                if p >= term {
                    return Err(format!("terms out of order at `{term}`"));
                }
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("invalid weight {weight} for `{term}`"));
            }
            if weight == 0.0 {
                return Err(format!("explicit zero weight for `{term}`"));
            }
            prev = Some(term);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_sorts_merges_and_drops_zero() {
        let v = TermVector::from_pairs([("b", 1.0), ("a", 2.0), ("b", 0.5), ("c", 0.0)]);
        let pairs: Vec<_> = v.iter().collect();
        assert_eq!(pairs, vec![("a", 2.0), ("b", 1.5)]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get("c"), 0.0);
    }

    #[test]
    fn dot_and_cosine() {
        let a = TermVector::from_pairs([("x", 1.0), ("y", 2.0)]);
        let b = TermVector::from_pairs([("y", 3.0), ("z", 4.0)]);
        assert_eq!(a.dot(&b), 6.0);
        assert_eq!(b.dot(&a), 6.0);
        let expected = 6.0 / (5.0_f64.sqrt() * 5.0);
        assert!((a.cosine(&b) - expected).abs() < 1e-12);
        assert_eq!(TermVector::new().cosine(&TermVector::new()), 0.0);
        assert_eq!(a.cosine(&TermVector::new()), 0.0);
    }

    #[test]
    fn normalize_unit_length_and_zero_stays_zero() {
        let v = TermVector::from_pairs([("a", 3.0), ("b", 4.0)]).normalized();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert!((v.get("a") - 0.6).abs() < 1e-12);

        let z = TermVector::new().normalized();
        assert!(z.is_zero());
    }

    #[test]
    fn sum_accumulates_in_order() {
        let a = TermVector::from_pairs([("a", 1.0), ("b", 1.0)]);
        let b = TermVector::from_pairs([("b", 2.0), ("c", 3.0)]);
        let s = TermVector::sum([&a, &b]);
        let pairs: Vec<_> = s.iter().collect();
        assert_eq!(pairs, vec![("a", 1.0), ("b", 3.0), ("c", 3.0)]);
    }

    #[test]
    fn top_terms_breaks_ties_lexically() {
        let v = TermVector::from_pairs([("zeta", 1.0), ("alpha", 1.0), ("mid", 2.0)]);
        assert_eq!(v.top_terms(2), vec![("mid", 2.0), ("alpha", 1.0)]);
        assert!(v.top_terms(0).is_empty());
    }

    #[test]
    fn check_rejects_bad_vectors() {
        let good = TermVector::from_pairs([("a", 1.0)]);
        assert!(good.check().is_ok());

        let mut neg = TermVector::new();
        neg.entries.insert("a".into(), -1.0);
        assert!(neg.check().is_err());

        let mut unsorted = TermVector::new();
        unsorted.entries.insert("b".into(), 1.0);
        unsorted.entries.insert("a".into(), 1.0);
        assert!(unsorted.check().is_err());
    }
}
