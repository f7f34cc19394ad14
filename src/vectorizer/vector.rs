use std::ops::AddAssign;

use indexmap::IndexMap;
use num::Num;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    error::{Result, SimilarityError},
    vectorizer::{aggregate::GroupTermCounts, compare, term::TermFrequency, vocabulary::Vocabulary},
};

/// Vectors of all surviving groups, keyed by group
pub type GroupVectors<N = u32> = IndexMap<String, GroupVector<N>>;

/// GroupVector
/// Term counts of one group laid out over the vocabulary.
///
/// Conceptually a dense vector of length `dim` (the vocabulary size) where
/// position `i` holds the count of the term with vocabulary index `i`.
/// Only non-zero entries are stored; `indices` is strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupVector<N = u32>
where
    N: Num + Copy,
{
    dim: usize,
    indices: Vec<usize>,
    values: Vec<N>,
}

impl<N> GroupVector<N>
where
    N: Num + Copy,
{
    /// All-zero vector of dimension `dim`
    pub fn zeros(dim: usize) -> Self {
        Self { dim, indices: Vec::new(), values: Vec::new() }
    }

    /// Build from unordered (index, value) pairs.
    /// Zero values are dropped; indices must be unique and below `dim`.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, N)>) -> Self {
        pairs.retain(|(_, v)| !v.is_zero());
        pairs.sort_unstable_by_key(|(i, _)| *i);
        debug_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0), "duplicate index");
        debug_assert!(pairs.last().map_or(true, |(i, _)| *i < dim), "index out of range");
        let (indices, values) = pairs.into_iter().unzip();
        Self { dim, indices, values }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Non-zero (index, value) pairs in ascending index order
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, N)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dense form, length `dim`
    pub fn to_dense(&self) -> Vec<N> {
        let mut dense = vec![N::zero(); self.dim];
        for (i, v) in self.raw_iter() {
            dense[i] = v;
        }
        dense
    }
}

impl<N> GroupVector<N>
where
    N: Num + Copy + AddAssign,
{
    /// Sum of all entries
    pub fn sum<R>(&self) -> R
    where
        R: Num + AddAssign,
        N: Into<R>,
    {
        let mut result = R::zero();
        for &v in &self.values {
            result += v.into();
        }
        result
    }
}

impl<N> GroupVector<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Cosine similarity, 0.0 if either vector is all zero
    #[inline]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        debug_assert_eq!(self.dim, other.dim, "Vectors must be of the same length to compute cosine similarity.");
        compare::cosine_similarity(self.raw_iter(), other.raw_iter())
    }
}

/// Lay one group's term counts over the vocabulary.
///
/// A term missing from the vocabulary means the vocabulary was not built from
/// a superset of the aggregated rows; that is reported, never zero-filled.
pub fn build_group_vector(group: &str, freq: &TermFrequency, vocab: &Vocabulary) -> Result<GroupVector<u32>> {
    let mut pairs = Vec::with_capacity(freq.term_num());
    for (term, count) in freq.iter() {
        let index = vocab.index_of(term).ok_or_else(|| SimilarityError::TermNotInVocabulary {
            group: group.to_string(),
            term: term.to_string(),
        })?;
        pairs.push((index, count));
    }
    Ok(GroupVector::from_pairs(vocab.len(), pairs))
}

/// Split `keys` into at most `workers` contiguous, disjoint shares.
///
/// Each share holds `ceil(len / workers)` keys; the last one takes whatever
/// remains. Empty shares are not returned.
pub fn partition_shares<T>(keys: &[T], workers: usize) -> Vec<&[T]> {
    let workers = workers.max(1);
    let per_share = keys.len().div_ceil(workers).max(1);
    let mut shares = Vec::with_capacity(workers);
    for i in 0..workers {
        let start = i * per_share;
        if start >= keys.len() {
            break;
        }
        let end = if i == workers - 1 { keys.len() } else { (start + per_share).min(keys.len()) };
        shares.push(&keys[start..end]);
    }
    shares
}

/// Builds group vectors from shared, read-only vocabulary and term counts.
#[derive(Debug, Clone, Copy)]
pub struct VectorBuilder<'a> {
    vocab: &'a Vocabulary,
    counts: &'a GroupTermCounts,
}

impl<'a> VectorBuilder<'a> {
    pub fn new(vocab: &'a Vocabulary, counts: &'a GroupTermCounts) -> Self {
        Self { vocab, counts }
    }

    /// Vectors for one share of group keys.
    pub fn build_share(&self, share: &[String], worker: usize) -> Result<GroupVectors> {
        let mut vectors = GroupVectors::with_capacity(share.len());
        for (n, group) in share.iter().enumerate() {
            let freq = self
                .counts
                .get(group)
                .ok_or_else(|| SimilarityError::MissingVector { group: group.clone() })?;
            let vector = build_group_vector(group, freq, self.vocab)?;
            debug!(
                worker,
                group = group.as_str(),
                nnz = vector.nnz(),
                terms = vector.sum::<u64>(),
                done = n + 1,
                of = share.len(),
                "vector built"
            );
            vectors.insert(group.clone(), vector);
        }
        Ok(vectors)
    }

    /// All vectors on the current thread.
    pub fn build_serial(&self) -> Result<GroupVectors> {
        info!(groups = self.counts.len(), dim = self.vocab.len(), "building term vectors");
        self.build_share(&self.counts.group_keys(), 1)
    }

    /// All vectors, one contiguous share of groups per worker of `pool`.
    ///
    /// Any failing share fails the whole build. Shares are merged in share
    /// order, so the result matches `build_serial` exactly.
    pub fn build_parallel(&self, pool: &rayon::ThreadPool) -> Result<GroupVectors> {
        let keys = self.counts.group_keys();
        let workers = pool.current_num_threads();
        let shares = partition_shares(&keys, workers);
        info!(
            groups = keys.len(),
            dim = self.vocab.len(),
            workers,
            shares = shares.len(),
            "building term vectors in parallel"
        );

        let built: Vec<GroupVectors> = pool.install(|| {
            shares
                .par_iter()
                .enumerate()
                .map(|(i, share)| self.build_share(share, i + 1))
                .collect::<Result<Vec<_>>>()
        })?;

        merge_shares(built)
    }
}

/// Union of per-worker results. Keys must be disjoint across shares.
pub fn merge_shares(shares: Vec<GroupVectors>) -> Result<GroupVectors> {
    let total = shares.iter().map(|s| s.len()).sum();
    let mut merged = GroupVectors::with_capacity(total);
    for share in shares {
        for (group, vector) in share {
            if merged.contains_key(&group) {
                return Err(SimilarityError::DuplicateGroup { group });
            }
            merged.insert(group, vector);
        }
    }
    Ok(merged)
}
