use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// TermFrequency
/// Counts how often each term occurs within one group.
///
/// Terms keep the order in which they were first added.
///
/// Per-term counts are `u32` and saturate at `u32::MAX`; the running total
/// is `u64` and does not.
///
/// # Examples
/// ```
/// use group_similarity::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_terms(&["sunset", "sea", "sunset"]);
/// assert_eq!(freq.term_count("sunset"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFrequency {
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

/// Adding terms
impl TermFrequency {
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Add one occurrence of `term`
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        self.add_term_n(term, 1)
    }

    /// Add `n` occurrences of `term`
    #[inline]
    pub fn add_term_n(&mut self, term: &str, n: u32) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count = count.saturating_add(n);
        } else {
            self.term_count.insert(term.to_string(), n);
        }
        self.total_term_count += n as u64;
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
}

impl<'a> FromIterator<&'a str> for TermFrequency {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut freq = TermFrequency::new();
        for term in iter {
            freq.add_term(term);
        }
        freq
    }
}

/// Reading counts
impl TermFrequency {
    /// Occurrences of `term`, 0 if it never occurred
    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// Total occurrences of all terms
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    /// (term, count) in first-added order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Most frequent terms first, ties broken by term
    pub fn sorted_frequency_vector(&self) -> Vec<(&str, u32)> {
        let mut term_list: Vec<(&str, u32)> = self.iter().collect();
        term_list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        term_list
    }

    /// The `n` most frequent terms, joined for log lines
    pub fn top_terms(&self, n: usize) -> String {
        self.sorted_frequency_vector()
            .into_iter()
            .take(n)
            .map(|(term, count)| format!("{term}:{count}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_totals() {
        let mut freq = TermFrequency::new();
        freq.add_terms(&["a", "b", "a"]).add_term("c").add_term_n("b", 2);
        assert_eq!(freq.term_count("a"), 2);
        assert_eq!(freq.term_count("b"), 3);
        assert_eq!(freq.term_count("c"), 1);
        assert_eq!(freq.term_count("z"), 0);
        assert_eq!(freq.term_sum(), 6);
        assert_eq!(freq.term_num(), 3);
        let terms: Vec<&str> = freq.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["a", "b", "c"]);
    }

    #[test]
    fn sorted_by_frequency_then_term() {
        let freq: TermFrequency = ["b", "a", "c", "c", "a"].into_iter().collect();
        assert_eq!(freq.sorted_frequency_vector(), vec![("a", 2), ("c", 2), ("b", 1)]);
        assert_eq!(freq.top_terms(2), "a:2 c:2");
        assert_eq!(TermFrequency::new().top_terms(3), "");
    }

    #[test]
    fn term_count_saturates_but_total_keeps_counting() {
        let mut freq = TermFrequency::new();
        freq.add_term_n("sunset", u32::MAX).add_term_n("sunset", 5);
        assert_eq!(freq.term_count("sunset"), u32::MAX);
        assert_eq!(freq.term_sum(), u32::MAX as u64 + 5);
    }
}
