/// This crate compares groups of documents by cosine similarity of their term counts.
pub mod config;
pub mod error;
pub mod persist;
pub mod pipeline;
pub mod row;
pub mod vectorizer;

/// Pipeline Driver
/// The top-level entry point of this crate.
/// It sequences the whole batch computation:
/// - Aggregating rows into per-group term counts, dropping small groups
/// - Building the corpus vocabulary from every row
/// - Building one term vector per surviving group, optionally on a worker pool
/// - Computing the all-pairs cosine similarity matrix
///
/// `run` works on rows already in memory, `execute` reads the configured
/// input and writes the configured outputs.
pub use pipeline::{Pipeline, PipelineOutput};

/// Pipeline Configuration
/// An explicit configuration object passed to the driver at construction.
/// `ConfigFile` loads it from TOML and selects named dataset presets.
pub use config::{ConfigFile, DatasetConfig, PipelineConfig, TermConfig, VocabularyOrder};

/// Error type and result alias used throughout the crate.
pub use error::{Result, SimilarityError};

/// Row and Term Splitting
/// A `Row` is one input record with a group key and a delimited term blob.
/// `TermSplitter` strips enclosing bracket characters and splits the blob.
pub use row::{Row, TermSplitter};

/// Term Frequency structure
/// Per-group counter of term occurrences with a running total.
pub use vectorizer::term::TermFrequency;

/// Vocabulary
/// Deterministic term -> index mapping over the full corpus.
/// Its size is the dimension of every group vector.
pub use vectorizer::vocabulary::Vocabulary;

/// Group Term Counts
/// Term frequencies of every group that met the row threshold, plus row
/// statistics of both surviving and excluded groups.
///
/// # Serialization
/// Supported. Used as the intermediate snapshot.
pub use vectorizer::aggregate::{GroupSummary, GroupTermCounts};

/// Group Vector
/// A group's term counts laid out over the vocabulary.
/// Stored sparsely; `to_dense` yields the full-length form.
pub use vectorizer::vector::{GroupVector, GroupVectors, VectorBuilder};

/// Similarity Matrix
/// Square, symmetric matrix of cosine similarities labelled by group key.
pub use vectorizer::matrix::SimilarityMatrix;
