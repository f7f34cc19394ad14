use std::{fs::File, io::Read, path::Path};

use crate::{config::TermConfig, error::{Result, SimilarityError}};

/// One input record: a group key and its raw, delimited term blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub group: String,
    pub terms: String,
}

impl Row {
    pub fn new(group: impl Into<String>, terms: impl Into<String>) -> Self {
        Self { group: group.into(), terms: terms.into() }
    }
}

/// Cuts term blobs like `{sunset,sea,sky}` into terms.
///
/// Stripping only removes the configured characters from both ends of the
/// blob; terms themselves are compared byte for byte.
#[derive(Debug, Clone)]
pub struct TermSplitter {
    strip_chars: Vec<char>,
    delimiter: char,
    keep_empty: bool,
}

impl TermSplitter {
    pub fn new(config: &TermConfig) -> Self {
        Self {
            strip_chars: config.strip_chars.chars().collect(),
            delimiter: config.delimiter,
            keep_empty: config.keep_empty,
        }
    }

    #[inline]
    pub fn strip<'a>(&self, blob: &'a str) -> &'a str {
        blob.trim_matches(|c: char| self.strip_chars.contains(&c))
    }

    /// Terms of one blob, in order, duplicates kept.
    #[inline]
    pub fn split<'a>(&'a self, blob: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let keep_empty = self.keep_empty;
        self.strip(blob)
            .split(self.delimiter)
            .filter(move |term| keep_empty || !term.is_empty())
    }

    /// Every term of every row, in input order.
    pub fn terms_of<'a>(&'a self, rows: &'a [Row]) -> impl Iterator<Item = &'a str> + 'a {
        rows.iter().flat_map(move |row| self.split(&row.terms))
    }
}

impl Default for TermSplitter {
    fn default() -> Self {
        Self::new(&TermConfig::default())
    }
}

/// Read rows from CSV with a header line.
///
/// Both columns must be present in the header; other columns are ignored.
/// A record that is too short to hold either column is a hard error.
pub fn read_rows<R: Read>(reader: R, group_column: &str, term_column: &str) -> Result<Vec<Row>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let position = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| SimilarityError::MissingColumn { column: column.to_string() })
    };
    let group_idx = position(group_column)?;
    let term_idx = position(term_column)?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let (Some(group), Some(terms)) = (record.get(group_idx), record.get(term_idx)) else {
            let missing = if record.get(group_idx).is_none() { group_column } else { term_column };
            return Err(SimilarityError::MissingColumn { column: missing.to_string() });
        };
        rows.push(Row::new(group, terms));
    }
    Ok(rows)
}

pub fn read_rows_from_path(path: impl AsRef<Path>, group_column: &str, term_column: &str) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SimilarityError::Input {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    read_rows(file, group_column, term_column).map_err(|err| match err {
        SimilarityError::Csv(source) => SimilarityError::Input { path: path.to_path_buf(), source },
        other => other,
    })
}
