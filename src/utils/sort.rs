use std::cmp::Ordering;

/// Ranking order shared by keywords and category scores:
/// weight descending, then key ascending.
///
/// NaN weights compare via `total_cmp`, so the order stays total.
#[inline(always)]
pub fn rank_cmp<K: Ord + ?Sized>(a_key: &K, a_weight: f64, b_key: &K, b_weight: f64) -> Ordering {
    b_weight
        .total_cmp(&a_weight)
        .then_with(|| a_key.cmp(b_key))
}

/// Sort `(key, weight)` pairs in ranking order.
#[inline]
pub fn sort_ranked<K: Ord>(items: &mut [(K, f64)]) {
    items.sort_unstable_by(|a, b| rank_cmp(&a.0, a.1, &b.0, b.1));
}

/// Keep the first `k` pairs in ranking order.
///
/// Uses a partial selection first so that a short head out of a long
/// vector does not pay for a full sort.
pub fn top_k_ranked<K: Ord>(mut items: Vec<(K, f64)>, k: usize) -> Vec<(K, f64)> {
    if k == 0 {
        return Vec::new();
    }
    if items.len() > k {
        items.select_nth_unstable_by(k - 1, |a, b| rank_cmp(&a.0, a.1, &b.0, b.1));
        items.truncate(k);
    }
    sort_ranked(&mut items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    /// full sort baseline
    fn baseline(items: &[(u32, f64)], k: usize) -> Vec<(u32, f64)> {
        let mut v = items.to_vec();
        v.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));
        v.truncate(k);
        v
    }

    /// tiny deterministic PRNG (xorshift32)
    struct Rng(u32);
    impl Rng {
        fn new(seed: u32) -> Self { Self(seed) }
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn ties_break_on_key() {
        let mut items = vec![("b", 1.0), ("a", 1.0), ("c", 2.0)];
        sort_ranked(&mut items);
        assert_eq!(items, vec![("c", 2.0), ("a", 1.0), ("b", 1.0)]);
    }

    #[test]
    fn top_k_handles_empty_and_zero() {
        let empty: Vec<(u32, f64)> = vec![];
        assert!(top_k_ranked(empty, 3).is_empty());
        assert!(top_k_ranked(vec![(1u32, 1.0)], 0).is_empty());
        assert_eq!(top_k_ranked(vec![(1u32, 1.0)], 5), vec![(1, 1.0)]);
    }

    #[test]
    fn top_k_matches_baseline_many_sizes() {
        let mut rng = Rng::new(0x1234_5678);
        for &n in &[1usize, 2, 3, 7, 16, 33, 128, 1000] {
            let items: Vec<(u32, f64)> = (0..n as u32)
                // few distinct weights so that ties are common
                .map(|i| (i, (rng.next_u32() % 8) as f64))
                .collect();
            for &k in &[1usize, 2, 5, 10, n] {
                assert_eq!(top_k_ranked(items.clone(), k), baseline(&items, k), "n={n} k={k}");
            }
        }
    }
}
