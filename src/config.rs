use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimilarityError};

pub const DEFAULT_GROUP_COLUMN: &str = "su_a3";
pub const DEFAULT_TERM_COLUMN: &str = "user_terms";
pub const DEFAULT_MIN_ROWS: usize = 25;

/// Order in which vocabulary indices are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyOrder {
    /// Terms sorted by byte order before indexing
    #[default]
    Lexicographic,
    /// Terms indexed in order of first appearance in the input
    FirstSeen,
}

/// How a raw term blob is cut into terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    /// Characters trimmed from both ends of the blob before splitting.
    pub strip_chars: String,
    pub delimiter: char,
    /// Keep empty terms (e.g. the one produced by an empty blob).
    pub keep_empty: bool,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            strip_chars: "{}".to_string(),
            delimiter: ',',
            keep_empty: false,
        }
    }
}

/// Everything the pipeline driver needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: Option<PathBuf>,
    /// Destination of the similarity matrix CSV.
    pub matrix_output: Option<PathBuf>,
    /// Destination of the per-group term count snapshot.
    /// A `.json` extension selects JSON, anything else CBOR.
    pub counts_output: Option<PathBuf>,
    pub group_column: String,
    pub term_column: String,
    /// Groups with fewer rows are dropped.
    pub min_rows: usize,
    pub parallel: bool,
    /// Worker count; `None` uses the rayon default (hardware concurrency).
    pub workers: Option<usize>,
    /// Fan the similarity pair space out over the worker pool as well.
    pub parallel_similarity: bool,
    pub terms: TermConfig,
    pub vocabulary_order: VocabularyOrder,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: None,
            matrix_output: None,
            counts_output: None,
            group_column: DEFAULT_GROUP_COLUMN.to_string(),
            term_column: DEFAULT_TERM_COLUMN.to_string(),
            min_rows: DEFAULT_MIN_ROWS,
            parallel: true,
            workers: None,
            parallel_similarity: false,
            terms: TermConfig::default(),
            vocabulary_order: VocabularyOrder::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_rows == 0 {
            return Err(invalid("min_rows must be at least 1"));
        }
        if self.workers == Some(0) {
            return Err(invalid("workers must be at least 1"));
        }
        if self.group_column.is_empty() || self.term_column.is_empty() {
            return Err(invalid("column names must not be empty"));
        }
        if self.group_column == self.term_column {
            return Err(invalid("group and term columns must differ"));
        }
        if self.terms.strip_chars.contains(self.terms.delimiter) {
            return Err(invalid("delimiter must not be one of the strip characters"));
        }
        Ok(())
    }

    /// Number of workers the vector builder will use.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(rayon::current_num_threads).max(1)
    }

    /// Parallel only pays off with more than one worker.
    pub fn runs_parallel(&self) -> bool {
        self.parallel && self.worker_count() > 1
    }
}

fn invalid(reason: &str) -> SimilarityError {
    SimilarityError::InvalidConfig { reason: reason.to_string() }
}

/// A named input/output path preset, e.g. one per phenomenon and source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub input: PathBuf,
    pub matrix_output: PathBuf,
    #[serde(default)]
    pub counts_output: Option<PathBuf>,
}

/// On-disk TOML configuration.
///
/// ```toml
/// [pipeline]
/// min_rows = 25
///
/// [[datasets]]
/// name = "flickr-sunset"
/// input = "data/flickr_sunset.csv"
/// matrix_output = "out/flickr_sunset_similarity.csv"
/// counts_output = "out/flickr_sunset_counts.cbor"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub pipeline: PipelineConfig,
    pub datasets: Vec<DatasetConfig>,
}

impl ConfigFile {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimilarityError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Pipeline config with the paths of dataset `name` laid over it.
    /// `None` returns the `[pipeline]` table unchanged.
    pub fn select(&self, name: Option<&str>) -> Result<PipelineConfig> {
        let mut config = self.pipeline.clone();
        let Some(name) = name else {
            return Ok(config);
        };
        let dataset = self
            .datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SimilarityError::UnknownDataset { name: name.to_string() })?;
        config.input = Some(dataset.input.clone());
        config.matrix_output = Some(dataset.matrix_output.clone());
        if dataset.counts_output.is_some() {
            config.counts_output = dataset.counts_output.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[pipeline]
min_rows = 3
parallel = false
vocabulary_order = "first_seen"

[pipeline.terms]
strip_chars = "[]"

[[datasets]]
name = "flickr-sunset"
input = "in/sunset.csv"
matrix_output = "out/sunset.csv"
counts_output = "out/sunset.cbor"

[[datasets]]
name = "flickr-sunrise"
input = "in/sunrise.csv"
matrix_output = "out/sunrise.csv"
"#;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.min_rows, DEFAULT_MIN_ROWS);
        assert_eq!(config.terms.delimiter, ',');
        assert!(!config.terms.keep_empty);
    }

    #[test]
    fn parses_pipeline_table_and_keeps_defaults() {
        let file = ConfigFile::from_toml_str(SAMPLE).unwrap();
        assert_eq!(file.pipeline.min_rows, 3);
        assert!(!file.pipeline.parallel);
        assert_eq!(file.pipeline.vocabulary_order, VocabularyOrder::FirstSeen);
        assert_eq!(file.pipeline.terms.strip_chars, "[]");
        assert_eq!(file.pipeline.terms.delimiter, ',');
        assert_eq!(file.pipeline.group_column, DEFAULT_GROUP_COLUMN);
        assert_eq!(file.datasets.len(), 2);
    }

    #[test]
    fn select_overlays_dataset_paths() {
        let file = ConfigFile::from_toml_str(SAMPLE).unwrap();
        let config = file.select(Some("flickr-sunset")).unwrap();
        assert_eq!(config.input, Some(PathBuf::from("in/sunset.csv")));
        assert_eq!(config.matrix_output, Some(PathBuf::from("out/sunset.csv")));
        assert_eq!(config.counts_output, Some(PathBuf::from("out/sunset.cbor")));
        assert_eq!(config.min_rows, 3);

        let sunrise = file.select(Some("flickr-sunrise")).unwrap();
        assert_eq!(sunrise.counts_output, None);
    }

    #[test]
    fn select_rejects_unknown_dataset() {
        let file = ConfigFile::from_toml_str(SAMPLE).unwrap();
        let err = file.select(Some("instagram")).unwrap_err();
        assert!(matches!(err, SimilarityError::UnknownDataset { .. }));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = PipelineConfig { min_rows: 0, ..Default::default() };
        assert!(config.validate().is_err());

        config.min_rows = 1;
        config.workers = Some(0);
        assert!(config.validate().is_err());

        config.workers = Some(2);
        config.terms.delimiter = '}';
        assert!(config.validate().is_err());
    }

    #[test]
    fn single_worker_never_runs_parallel() {
        let config = PipelineConfig { workers: Some(1), ..Default::default() };
        assert!(!config.runs_parallel());
        let config = PipelineConfig { workers: Some(4), ..Default::default() };
        assert!(config.runs_parallel());
        let config = PipelineConfig { workers: Some(4), parallel: false, ..Default::default() };
        assert!(!config.runs_parallel());
    }
}
