use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use tracing::info;

use crate::{
    error::{Result, SimilarityError},
    vectorizer::{aggregate::GroupTermCounts, matrix::SimilarityMatrix},
};

/// Snapshot encoding, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Cbor,
    Json,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Cbor,
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let output_err = |source| SimilarityError::Output { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(output_err)?;
    }
    File::create(path).map(BufWriter::new).map_err(output_err)
}

fn snapshot_err(path: &Path, reason: impl ToString) -> SimilarityError {
    SimilarityError::Snapshot { path: path.to_path_buf(), reason: reason.to_string() }
}

/// Persist per-group term counts for reuse without the raw rows.
pub fn write_term_counts(path: impl AsRef<Path>, counts: &GroupTermCounts) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    match SnapshotFormat::from_path(path) {
        SnapshotFormat::Json => serde_json::to_writer(&mut writer, counts).map_err(|e| snapshot_err(path, e))?,
        SnapshotFormat::Cbor => serde_cbor::to_writer(&mut writer, counts).map_err(|e| snapshot_err(path, e))?,
    }
    writer
        .flush()
        .map_err(|source| SimilarityError::Output { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), groups = counts.len(), "term counts saved");
    Ok(())
}

pub fn read_term_counts(path: impl AsRef<Path>) -> Result<GroupTermCounts> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| snapshot_err(path, e))?;
    let reader = BufReader::new(file);
    let counts = match SnapshotFormat::from_path(path) {
        SnapshotFormat::Json => serde_json::from_reader(reader).map_err(|e| snapshot_err(path, e))?,
        SnapshotFormat::Cbor => serde_cbor::from_reader(reader).map_err(|e| snapshot_err(path, e))?,
    };
    Ok(counts)
}

pub fn write_matrix_csv(path: impl AsRef<Path>, matrix: &SimilarityMatrix) -> Result<()> {
    let path = path.as_ref();
    let writer = create(path)?;
    matrix.write_csv(writer)?;
    info!(path = %path.display(), groups = matrix.len(), "similarity matrix saved");
    Ok(())
}
