use indexmap::IndexSet;

use crate::{
    config::VocabularyOrder,
    row::{Row, TermSplitter},
    vectorizer::aggregate::GroupTermCounts,
};

/// Vocabulary
/// Every distinct term of the corpus with a fixed index in `[0, len)`.
///
/// The index of a term is its position in the set, so it is also the
/// dimension that term occupies in every `GroupVector`.
/// Built once per run from all rows, including rows of groups that are
/// later dropped by the row threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: IndexSet<Box<str>>,
}

impl Vocabulary {
    /// Build from a term stream.
    pub fn build<'a, I>(terms: I, order: VocabularyOrder) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut terms: IndexSet<Box<str>> = terms.into_iter().map(Box::from).collect();
        if order == VocabularyOrder::Lexicographic {
            terms.sort_unstable();
        }
        Self { terms }
    }

    /// Build from the full row set.
    pub fn from_rows(rows: &[Row], splitter: &TermSplitter, order: VocabularyOrder) -> Self {
        Self::build(splitter.terms_of(rows), order)
    }

    /// Build from the terms of already aggregated groups.
    /// Used when only a term count snapshot is available.
    pub fn from_term_counts(counts: &GroupTermCounts, order: VocabularyOrder) -> Self {
        Self::build(
            counts.iter().flat_map(|(_, freq)| freq.iter().map(|(term, _)| term)),
            order,
        )
    }

    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    #[inline]
    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get_index(index).map(|t| t.as_ref())
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// Vector dimensionality
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// (index, term) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.terms.iter().enumerate().map(|(i, t)| (i, t.as_ref()))
    }
}
