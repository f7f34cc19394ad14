use std::path::PathBuf;

/// Errors raised while configuring or running the similarity pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("unknown dataset `{name}`")]
    UnknownDataset { name: String },

    #[error("failed to read input {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed input: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is missing column `{column}`")]
    MissingColumn { column: String },

    /// Aggregation and vocabulary disagree. Always a logic error.
    #[error("term `{term}` of group `{group}` is not in the vocabulary")]
    TermNotInVocabulary { group: String, term: String },

    #[error("no vector was built for group `{group}`")]
    MissingVector { group: String },

    #[error("group `{group}` was assigned to more than one worker")]
    DuplicateGroup { group: String },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path}: {reason}")]
    Snapshot { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, SimilarityError>;
