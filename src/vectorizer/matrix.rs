use std::{fmt, io::Write};

use indexmap::IndexSet;
use num::Num;
use rayon::prelude::*;
use tracing::info;

use crate::{
    error::{Result, SimilarityError},
    vectorizer::vector::{GroupVector, GroupVectors},
};

/// SimilarityMatrix
/// Square table of cosine similarities, labelled by group on both axes.
///
/// Stored row-major. The diagonal is exactly 1.0 and `(i, j) == (j, i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    labels: IndexSet<String>,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Identity matrix over `labels`; every off-diagonal cell starts at 0.0.
    pub fn identity(labels: &[String]) -> Self {
        let n = labels.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        Self {
            labels: labels.iter().cloned().collect(),
            values,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.as_str())
    }

    #[inline]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.get_index_of(label)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let n = self.len();
        (row < n && col < n).then(|| self.values[row * n + col])
    }

    /// Similarity between two groups by key
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        self.get(self.index_of(a)?, self.index_of(b)?)
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let n = self.len();
        (row < n).then(|| &self.values[row * n..(row + 1) * n])
    }

    /// Set a symmetric pair of cells
    fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        let n = self.len();
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
    }

    /// Write as CSV: a header of an empty corner cell followed by the labels,
    /// then one line per group starting with its label.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(std::iter::once("").chain(self.labels()))?;
        for (i, label) in self.labels().enumerate() {
            let mut record = Vec::with_capacity(self.len() + 1);
            record.push(label.to_string());
            if let Some(row) = self.row(i) {
                record.extend(row.iter().map(|v| v.to_string()));
            }
            csv_writer.write_record(&record)?;
        }
        csv_writer
            .flush()
            .map_err(|e| SimilarityError::Csv(csv::Error::from(e)))?;
        Ok(())
    }
}

impl fmt::Display for SimilarityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for label in self.labels() {
            write!(f, " {:>8}", label)?;
        }
        writeln!(f)?;
        for (i, label) in self.labels().enumerate() {
            write!(f, "{:>8}", label)?;
            for v in self.row(i).unwrap_or(&[]) {
                write!(f, " {:>8.4}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Upper-triangle similarities of row `i` against every later group.
fn upper_row<N>(i: usize, vectors: &[&GroupVector<N>]) -> Vec<f64>
where
    N: Num + Copy + Into<f64>,
{
    let vi = vectors[i];
    vectors[i + 1..].iter().map(|vj| vi.cosine_similarity(vj)).collect()
}

/// Cosine similarity of every pair of `groups`.
///
/// Only the upper triangle is computed and mirrored; the diagonal is set to
/// 1.0 without computation. With a pool, rows are spread over its workers;
/// every cell is produced by the same function either way, so the result
/// does not depend on the pool.
pub fn compute_similarity_matrix<N>(
    groups: &[String],
    vectors: &GroupVectors<N>,
    pool: Option<&rayon::ThreadPool>,
) -> Result<SimilarityMatrix>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    let ordered = groups
        .iter()
        .map(|g| {
            vectors
                .get(g)
                .ok_or_else(|| SimilarityError::MissingVector { group: g.clone() })
        })
        .collect::<Result<Vec<&GroupVector<N>>>>()?;

    let n = ordered.len();
    info!(groups = n, pairs = n * n.saturating_sub(1) / 2, parallel = pool.is_some(), "calculating cosine similarity");

    let rows: Vec<Vec<f64>> = match pool {
        Some(pool) => pool.install(|| (0..n).into_par_iter().map(|i| upper_row(i, &ordered)).collect()),
        None => (0..n).map(|i| upper_row(i, &ordered)).collect(),
    };

    let mut matrix = SimilarityMatrix::identity(groups);
    for (i, row) in rows.into_iter().enumerate() {
        for (offset, value) in row.into_iter().enumerate() {
            matrix.set_pair(i, i + 1 + offset, value);
        }
    }
    Ok(matrix)
}
