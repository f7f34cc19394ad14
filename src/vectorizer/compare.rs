use std::cmp::Ordering;

/// コサイン類似度 over two sparse vectors given as ascending (index, value) streams
/// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
///
/// Returns 0.0 when either norm is zero. For non-negative inputs the result
/// is clamped into `[0, 1]` against rounding.
#[inline]
pub fn cosine_similarity<N>(vec: impl Iterator<Item = (usize, N)>, other: impl Iterator<Item = (usize, N)>) -> f64
where
    N: Into<f64> + Copy,
{
    let mut a_it = vec.fuse();
    let mut b_it = other.fuse();
    let mut a_next = a_it.next();
    let mut b_next = b_it.next();
    let mut norm_a = 0_f64;
    let mut norm_b = 0_f64;
    let mut dot = 0_f64;
    while let (Some((ia, va)), Some((ib, vb))) = (a_next, b_next) {
        let (va, vb): (f64, f64) = (va.into(), vb.into());
        match ia.cmp(&ib) {
            Ordering::Equal => {
                norm_a += va * va;
                norm_b += vb * vb;
                dot += va * vb;
                a_next = a_it.next();
                b_next = b_it.next();
            }
            Ordering::Less => {
                norm_a += va * va;
                a_next = a_it.next();
            }
            Ordering::Greater => {
                norm_b += vb * vb;
                b_next = b_it.next();
            }
        }
    }
    while let Some((_, va)) = a_next {
        let va: f64 = va.into();
        norm_a += va * va;
        a_next = a_it.next();
    }
    while let Some((_, vb)) = b_next {
        let vb: f64 = vb.into();
        norm_b += vb * vb;
        b_next = b_it.next();
    }
    finish_cosine(dot, norm_a, norm_b)
}

/// Cosine similarity of two dense vectors of equal length.
pub fn cosine_similarity_dense<N>(vec: &[N], other: &[N]) -> f64
where
    N: Into<f64> + Copy,
{
    debug_assert_eq!(vec.len(), other.len(), "Vectors must be of the same length to compute cosine similarity.");
    let (mut dot, mut norm_a, mut norm_b) = (0_f64, 0_f64, 0_f64);
    for (&a, &b) in vec.iter().zip(other) {
        let (a, b): (f64, f64) = (a.into(), b.into());
        dot += a * b;
        norm_a += a * a;
        norm_b += b * b;
    }
    finish_cosine(dot, norm_a, norm_b)
}

#[inline]
fn finish_cosine(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(pairs: &[(usize, u32)]) -> impl Iterator<Item = (usize, u32)> + '_ {
        pairs.iter().copied()
    }

    #[test]
    fn disjoint_vectors_are_orthogonal() {
        let sim = cosine_similarity(sparse(&[(0, 2), (1, 1)]), sparse(&[(2, 4), (5, 1)]));
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn proportional_vectors_are_identical() {
        let sim = cosine_similarity(sparse(&[(0, 1), (1, 1)]), sparse(&[(0, 10), (1, 10)]));
        assert!((sim - 1.0).abs() < 1e-12);
        assert!(sim <= 1.0);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(sparse(&[]), sparse(&[(0, 1)])), 0.0);
        assert_eq!(cosine_similarity(sparse(&[]), sparse(&[])), 0.0);
        assert_eq!(cosine_similarity_dense::<u32>(&[0, 0], &[1, 0]), 0.0);
    }

    #[test]
    fn matches_textbook_value() {
        // (1,1,0) . (1,0,1) = 1 ; |a| = |b| = sqrt(2)
        let sim = cosine_similarity(sparse(&[(0, 1), (1, 1)]), sparse(&[(0, 1), (2, 1)]));
        assert!((sim - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sparse_agrees_with_dense() {
        let a = [(0, 3u32), (2, 1), (7, 4)];
        let b = [(2, 2u32), (3, 9), (7, 1)];
        let mut da = [0u32; 8];
        let mut db = [0u32; 8];
        a.iter().for_each(|&(i, v)| da[i] = v);
        b.iter().for_each(|&(i, v)| db[i] = v);
        let s = cosine_similarity(sparse(&a), sparse(&b));
        let d = cosine_similarity_dense(&da, &db);
        assert!((s - d).abs() < 1e-12);
    }
}
