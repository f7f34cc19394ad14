use std::collections::{HashMap, HashSet};

use group_similarity::{Pipeline, PipelineConfig, Row, TermSplitter};
use proptest::prelude::*;

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    let row = ("[A-F]", prop::collection::vec("[a-h]{1,2}", 0..6))
        .prop_map(|(group, terms)| Row::new(group, format!("{{{}}}", terms.join(","))));
    prop::collection::vec(row, 1..40)
}

fn serial(min_rows: usize) -> PipelineConfig {
    PipelineConfig { min_rows, parallel: false, ..Default::default() }
}

proptest! {
    #[test]
    fn vocabulary_counts_every_distinct_term(rows in rows_strategy(), min_rows in 1usize..5) {
        let out = Pipeline::new(serial(min_rows)).unwrap().run(&rows).unwrap();
        let splitter = TermSplitter::default();
        let distinct: HashSet<&str> = splitter.terms_of(&rows).collect();
        prop_assert_eq!(out.vocabulary.len(), distinct.len());
    }

    #[test]
    fn vector_sums_match_token_totals(rows in rows_strategy()) {
        let out = Pipeline::new(serial(1)).unwrap().run(&rows).unwrap();
        let splitter = TermSplitter::default();
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for row in &rows {
            *totals.entry(row.group.as_str()).or_default() += splitter.split(&row.terms).count() as u64;
        }
        for (group, vector) in &out.vectors {
            prop_assert_eq!(vector.sum::<u64>(), totals[group.as_str()]);
            prop_assert_eq!(vector.dim(), out.vocabulary.len());
        }
    }

    #[test]
    fn matrix_is_a_bounded_symmetric_similarity(rows in rows_strategy()) {
        let out = Pipeline::new(serial(1)).unwrap().run(&rows).unwrap();
        let m = &out.matrix;
        for i in 0..m.len() {
            prop_assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..m.len() {
                let v = m.get(i, j).unwrap();
                prop_assert!((0.0..=1.0).contains(&v), "out of range: {}", v);
                prop_assert_eq!(Some(v), m.get(j, i));
            }
        }
    }

    #[test]
    fn only_groups_at_threshold_survive(rows in rows_strategy(), min_rows in 1usize..6) {
        let out = Pipeline::new(serial(min_rows)).unwrap().run(&rows).unwrap();
        let mut sizes: HashMap<&str, usize> = HashMap::new();
        for row in &rows {
            *sizes.entry(row.group.as_str()).or_default() += 1;
        }
        for label in out.matrix.labels() {
            prop_assert!(sizes[label] >= min_rows);
        }
        let expected = sizes.values().filter(|&&n| n >= min_rows).count();
        prop_assert_eq!(out.matrix.len(), expected);
    }

    #[test]
    fn serial_and_parallel_are_identical(rows in rows_strategy(), workers in 2usize..6) {
        let serial_out = Pipeline::new(serial(1)).unwrap().run(&rows).unwrap();
        let config = PipelineConfig {
            min_rows: 1,
            parallel: true,
            workers: Some(workers),
            parallel_similarity: true,
            ..Default::default()
        };
        let parallel_out = Pipeline::new(config).unwrap().run(&rows).unwrap();
        prop_assert_eq!(serial_out.matrix, parallel_out.matrix);
    }
}
