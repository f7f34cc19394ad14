use std::time::Instant;

use tracing::{info, warn};

use crate::{
    config::PipelineConfig,
    error::{Result, SimilarityError},
    persist,
    row::{read_rows_from_path, Row, TermSplitter},
    vectorizer::{
        aggregate::{aggregate_groups, GroupTermCounts},
        matrix::{compute_similarity_matrix, SimilarityMatrix},
        vector::{GroupVectors, VectorBuilder},
        vocabulary::Vocabulary,
    },
};

/// Everything one run derives from its input.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub vocabulary: Vocabulary,
    pub counts: GroupTermCounts,
    pub vectors: GroupVectors,
    pub matrix: SimilarityMatrix,
}

/// Pipeline driver
/// aggregation -> vocabulary -> vectors (serial or parallel) -> similarity.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    splitter: TermSplitter,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let splitter = TermSplitter::new(&config.terms);
        Ok(Self { config, splitter })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pool for the parallel phases, `None` when running serially.
    fn worker_pool(&self) -> Result<Option<rayon::ThreadPool>> {
        if !self.config.runs_parallel() {
            return Ok(None);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count())
            .thread_name(|i| format!("vector-worker-{}", i + 1))
            .build()?;
        Ok(Some(pool))
    }

    /// Run on in-memory rows.
    pub fn run(&self, rows: &[Row]) -> Result<PipelineOutput> {
        info!(rows = rows.len(), "preprocessing rows");
        let counts = aggregate_groups(rows, &self.splitter, self.config.min_rows);
        let vocabulary = Vocabulary::from_rows(rows, &self.splitter, self.config.vocabulary_order);
        info!(size = vocabulary.len(), "corpus vocabulary built");
        self.finish(vocabulary, counts)
    }

    /// Run on a term count snapshot instead of raw rows.
    ///
    /// The vocabulary is rebuilt from the snapshot's own terms. Terms that
    /// only occurred in dropped groups are missing from it, which only
    /// removes all-zero dimensions and leaves every similarity unchanged.
    pub fn run_from_counts(&self, counts: GroupTermCounts) -> Result<PipelineOutput> {
        let vocabulary = Vocabulary::from_term_counts(&counts, self.config.vocabulary_order);
        info!(size = vocabulary.len(), groups = counts.len(), "vocabulary rebuilt from snapshot");
        self.finish(vocabulary, counts)
    }

    fn finish(&self, vocabulary: Vocabulary, counts: GroupTermCounts) -> Result<PipelineOutput> {
        let pool = self.worker_pool()?;
        let builder = VectorBuilder::new(&vocabulary, &counts);

        let start = Instant::now();
        let vectors = match &pool {
            Some(pool) => builder.build_parallel(pool)?,
            None => builder.build_serial()?,
        };
        info!(elapsed_ms = start.elapsed().as_millis() as u64, vectors = vectors.len(), "term vectors ready");

        let start = Instant::now();
        let similarity_pool = pool.as_ref().filter(|_| self.config.parallel_similarity);
        let matrix = compute_similarity_matrix(&counts.group_keys(), &vectors, similarity_pool)?;
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "similarity matrix ready");

        Ok(PipelineOutput { vocabulary, counts, vectors, matrix })
    }

    /// Full batch job: load the configured input, save the term count
    /// snapshot, compute and save the matrix.
    ///
    /// A failing snapshot write is logged and skipped.
    pub fn execute(&self) -> Result<PipelineOutput> {
        let input = self.config.input.as_ref().ok_or_else(|| SimilarityError::InvalidConfig {
            reason: "no input path given".to_string(),
        })?;
        let matrix_output = self.required_matrix_output()?;

        let start = Instant::now();
        let rows = read_rows_from_path(input, &self.config.group_column, &self.config.term_column)?;
        info!(path = %input.display(), rows = rows.len(), elapsed_ms = start.elapsed().as_millis() as u64, "input loaded");

        let counts = aggregate_groups(&rows, &self.splitter, self.config.min_rows);
        self.save_counts(&counts);
        let vocabulary = Vocabulary::from_rows(&rows, &self.splitter, self.config.vocabulary_order);
        info!(size = vocabulary.len(), "corpus vocabulary built");
        drop(rows);

        let output = self.finish(vocabulary, counts)?;
        persist::write_matrix_csv(matrix_output, &output.matrix)?;
        Ok(output)
    }

    /// Snapshot variant of `execute`.
    pub fn execute_from_snapshot(&self, snapshot: impl AsRef<std::path::Path>) -> Result<PipelineOutput> {
        let matrix_output = self.required_matrix_output()?;
        let counts = persist::read_term_counts(snapshot)?;
        let output = self.run_from_counts(counts)?;
        persist::write_matrix_csv(matrix_output, &output.matrix)?;
        Ok(output)
    }

    fn required_matrix_output(&self) -> Result<&std::path::Path> {
        self.config
            .matrix_output
            .as_deref()
            .ok_or_else(|| SimilarityError::InvalidConfig { reason: "no matrix output path given".to_string() })
    }

    fn save_counts(&self, counts: &GroupTermCounts) {
        let Some(path) = self.config.counts_output.as_ref() else {
            return;
        };
        if let Err(err) = persist::write_term_counts(path, counts) {
            warn!(error = %err, "could not save term counts, continuing");
        }
    }
}
