use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    row::{Row, TermSplitter},
    vectorizer::term::TermFrequency,
};

/// Row and term statistics of one group, kept for both kept and dropped groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub rows: usize,
    pub terms: u64,
    pub distinct_terms: usize,
}

/// Term counts of every group that met the row threshold.
///
/// Groups keep the order in which their key first appeared in the input;
/// that order is also the axis order of the similarity matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupTermCounts {
    groups: IndexMap<String, TermFrequency>,
    summaries: IndexMap<String, GroupSummary>,
    excluded: IndexMap<String, GroupSummary>,
}

impl GroupTermCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surviving group.
    pub fn insert(&mut self, group: impl Into<String>, rows: usize, freq: TermFrequency) {
        let group = group.into();
        self.summaries.insert(group.clone(), GroupSummary {
            rows,
            terms: freq.term_sum(),
            distinct_terms: freq.term_num(),
        });
        self.groups.insert(group, freq);
    }

    /// Register a group dropped by the row threshold.
    pub fn exclude(&mut self, group: impl Into<String>, summary: GroupSummary) {
        self.excluded.insert(group.into(), summary);
    }

    #[inline]
    pub fn get(&self, group: &str) -> Option<&TermFrequency> {
        self.groups.get(group)
    }

    #[inline]
    pub fn summary(&self, group: &str) -> Option<&GroupSummary> {
        self.summaries.get(group)
    }

    /// Surviving group keys in first-seen order
    pub fn group_keys(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermFrequency)> {
        self.groups.iter().map(|(g, f)| (g.as_str(), f))
    }

    pub fn excluded(&self) -> impl Iterator<Item = (&str, &GroupSummary)> {
        self.excluded.iter().map(|(g, s)| (g.as_str(), s))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Bucket rows by group key and count the terms of each group with at least
/// `min_rows` rows. Ties at the threshold are kept.
pub fn aggregate_groups(rows: &[Row], splitter: &TermSplitter, min_rows: usize) -> GroupTermCounts {
    let mut buckets: IndexMap<&str, Vec<&Row>> = IndexMap::new();
    for row in rows {
        buckets.entry(row.group.as_str()).or_default().push(row);
    }

    info!(groups = buckets.len(), min_rows, "aggregating group term counts");
    let mut counts = GroupTermCounts::new();
    for (group, group_rows) in buckets {
        let row_num = group_rows.len();
        let freq: TermFrequency = group_rows
            .iter()
            .flat_map(|row| splitter.split(&row.terms))
            .collect();
        if row_num >= min_rows {
            info!(group, rows = row_num, terms = freq.term_sum(), "group kept");
            debug!(group, top = %freq.top_terms(5), "most frequent terms");
            counts.insert(group, row_num, freq);
        } else {
            info!(group, rows = row_num, "group excluded");
            counts.exclude(group, GroupSummary {
                rows: row_num,
                terms: freq.term_sum(),
                distinct_terms: freq.term_num(),
            });
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::new("US", "{a,b,a}"),
            Row::new("US", "{a,c}"),
            Row::new("US", "{b,b}"),
            Row::new("FR", "{a,a,a}"),
        ]
    }

    #[test]
    fn threshold_drops_small_groups() {
        let counts = aggregate_groups(&rows(), &TermSplitter::default(), 2);
        assert_eq!(counts.group_keys(), vec!["US".to_string()]);
        let us = counts.get("US").unwrap();
        assert_eq!(us.term_count("a"), 3);
        assert_eq!(us.term_count("b"), 3);
        assert_eq!(us.term_count("c"), 1);
        assert!(counts.get("FR").is_none());

        let excluded: Vec<(&str, &GroupSummary)> = counts.excluded().collect();
        assert_eq!(excluded, vec![("FR", &GroupSummary { rows: 1, terms: 3, distinct_terms: 1 })]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let counts = aggregate_groups(&rows(), &TermSplitter::default(), 3);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.summary("US").unwrap().rows, 3);

        let counts = aggregate_groups(&rows(), &TermSplitter::default(), 4);
        assert!(counts.is_empty());
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let rows = vec![
            Row::new("JP", "x"),
            Row::new("DE", "y"),
            Row::new("JP", "z"),
            Row::new("AR", "x"),
        ];
        let counts = aggregate_groups(&rows, &TermSplitter::default(), 1);
        assert_eq!(counts.group_keys(), vec!["JP", "DE", "AR"]);
    }

    #[test]
    fn term_sum_matches_row_tokens() {
        let counts = aggregate_groups(&rows(), &TermSplitter::default(), 1);
        assert_eq!(counts.summary("US").unwrap().terms, 7);
        assert_eq!(counts.summary("FR").unwrap().terms, 3);
    }
}
