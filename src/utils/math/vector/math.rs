use num::Float;

/// ユークリッドノルム
/// ||a|| = sqrt(Σ(a_i^2))
#[inline]
pub fn l2_norm<N>(values: impl Iterator<Item = N>) -> N
where
    N: Float,
{
    values.fold(N::zero(), |acc, v| acc + v * v).sqrt()
}

/// コサイン類似度
/// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
///
/// Either norm being zero yields zero, and the result is clamped into
/// [-1, 1] so rounding never pushes it outside the valid range.
#[inline]
pub fn cosine<N>(dot: N, norm_a: N, norm_b: N) -> N
where
    N: Float,
{
    if norm_a == N::zero() || norm_b == N::zero() {
        return N::zero();
    }
    let sim = dot / (norm_a * norm_b);
    if sim.is_nan() {
        return N::zero();
    }
    sim.max(-N::one()).min(N::one())
}
