//! Data sources: where tabular data is pulled from and pushed to
//!
//! A source is addressed by a location string. CSV and TSV files are
//! recognized by extension; in-memory sources back projections and tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{DataError, Result, Table};

/// Kind of a data source, as recorded in the save file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Csv,
    Tsv,
    Memory,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Csv => "csv",
            SourceKind::Tsv => "tsv",
            SourceKind::Memory => "memory",
        }
    }

    /// Detect a file-backed kind from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceKind::Csv),
            "tsv" | "tab" => Some(SourceKind::Tsv),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(SourceKind::Csv),
            "tsv" => Ok(SourceKind::Tsv),
            "memory" => Ok(SourceKind::Memory),
            other => Err(DataError::UnrecognizedSource(other.to_string())),
        }
    }
}

/// External tabular store.
///
/// `pull` must fail with `DataError::Malformed` on ragged rows instead of
/// truncating, and `push` must fail with `DataError::ReadOnly` when the
/// source is read-only.
pub trait DataSource: fmt::Debug + Send {
    fn kind(&self) -> SourceKind;

    /// Read the whole table
    fn pull(&self) -> Result<Table>;

    /// Replace the stored table
    fn push(&self, table: &Table) -> Result<()>;

    /// Short display name
    fn name(&self) -> String;

    /// Full location, used to reopen the source
    fn location(&self) -> String;

    fn is_read_only(&self) -> bool;
}

/// Delimited text file with a header row
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    kind: SourceKind,
    read_only: bool,
}

impl CsvSource {
    /// Open a comma separated file
    pub fn new(path: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            path: path.into(),
            kind: SourceKind::Csv,
            read_only,
        }
    }

    /// Open a tab separated file
    pub fn tsv(path: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            path: path.into(),
            kind: SourceKind::Tsv,
            read_only,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn delimiter(&self) -> u8 {
        match self.kind {
            SourceKind::Tsv => b'\t',
            _ => b',',
        }
    }

    fn map_csv_error(&self, err: csv::Error) -> DataError {
        if let csv::ErrorKind::UnequalLengths { pos, expected_len, len } = err.kind() {
            let line = pos
                .as_ref()
                .map(|p| format!(" line {}", p.line()))
                .unwrap_or_default();
            return DataError::Malformed {
                location: format!("{}{}", self.path.display(), line),
                reason: format!("expected {} fields, found {}", expected_len, len),
            };
        }
        DataError::Csv(err)
    }
}

impl DataSource for CsvSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn pull(&self) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .delimiter(self.delimiter())
            .from_path(&self.path)
            .map_err(|e| self.map_csv_error(e))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| self.map_csv_error(e))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| self.map_csv_error(e))?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        let table = Table::from_rows(header, rows)?;
        log::debug!(
            "Pulled {} rows x {} fields from {}",
            table.num_rows(),
            table.num_fields(),
            self.path.display()
        );
        Ok(table)
    }

    fn push(&self, table: &Table) -> Result<()> {
        if self.read_only {
            return Err(DataError::ReadOnly(self.location()));
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter())
            .from_path(&self.path)?;
        writer.write_record(table.header())?;
        for row in table.rows() {
            writer.write_record(&row)?;
        }
        writer.flush()?;

        log::debug!("Pushed {} rows to {}", table.num_rows(), self.path.display());
        Ok(())
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.location())
    }

    fn location(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// Source kept entirely in memory
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    table: Mutex<Table>,
    read_only: bool,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, table: Table, read_only: bool) -> Self {
        Self {
            name: name.into(),
            table: Mutex::new(table),
            read_only,
        }
    }

    /// Current contents
    pub fn snapshot(&self) -> Table {
        self.table
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DataSource for MemorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Memory
    }

    fn pull(&self) -> Result<Table> {
        Ok(self.snapshot())
    }

    fn push(&self, table: &Table) -> Result<()> {
        if self.read_only {
            return Err(DataError::ReadOnly(self.location()));
        }
        let mut stored = self
            .table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *stored = table.clone();
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// Open a file-backed source, choosing the format from the extension
pub fn open_source(location: &str, read_only: bool) -> Result<Box<dyn DataSource>> {
    let path = PathBuf::from(location);
    match SourceKind::from_path(&path) {
        Some(kind) => reopen_source(kind, location, read_only),
        None => Err(DataError::UnrecognizedSource(location.to_string())),
    }
}

/// Reopen a source from its recorded kind and location
pub fn reopen_source(kind: SourceKind, location: &str, read_only: bool) -> Result<Box<dyn DataSource>> {
    match kind {
        SourceKind::Csv => Ok(Box::new(CsvSource::new(location, read_only))),
        SourceKind::Tsv => Ok(Box::new(CsvSource::tsv(location, read_only))),
        SourceKind::Memory => Err(DataError::UnrecognizedSource(format!(
            "{} (memory sources cannot be reopened)",
            location
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_pull_standard_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "csv_test.csv", "field_one,field_two\n11,12\n21,22\n");
        let source = CsvSource::new(&path, true);

        let table = source.pull().unwrap();
        assert_eq!(table.header(), vec!["field_one", "field_two"]);
        assert!(table.field("field_one").unwrap().contains(&"11".to_string()));
        assert!(table.field("field_two").unwrap().contains(&"22".to_string()));
        assert_eq!(source.name(), "csv_test.csv");
    }

    #[test]
    fn test_pull_ragged_csv_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "nonstd.csv", "a,b\n1,2\n3\n");
        let source = CsvSource::new(&path, true);

        let result = source.pull();
        assert!(matches!(result, Err(DataError::Malformed { .. })));
    }

    #[test]
    fn test_push_then_pull() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "rw.csv", "field_one,field_two\n11,12\n");
        let source = CsvSource::new(&path, false);

        let table = Table::from_columns(vec![
            ("field_three", vec!["13".to_string(), "23".to_string()]),
            ("field_four", vec!["14".to_string(), "24".to_string()]),
        ])
        .unwrap();
        source.push(&table).unwrap();

        let reread = CsvSource::new(&path, true).pull().unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn test_push_read_only_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ro.csv", "a,b\n1,2\n");
        let source = CsvSource::new(&path, true);

        let result = source.push(&Table::new());
        assert!(matches!(result, Err(DataError::ReadOnly(_))));
        // File untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn test_tsv_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "words.tsv", "word\tmeaning\nhund\tdog, hound\n");
        let source = open_source(&path.to_string_lossy(), false).unwrap();
        assert_eq!(source.kind(), SourceKind::Tsv);

        let table = source.pull().unwrap();
        assert_eq!(table.field("meaning").unwrap()[0], "dog, hound");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = open_source("deck.xlsx", true);
        assert!(matches!(result, Err(DataError::UnrecognizedSource(_))));
    }

    #[test]
    fn test_memory_source_push() {
        let source = MemorySource::new("scratch", Table::new(), false);
        let table = Table::from_columns(vec![("a", vec!["1".to_string()])]).unwrap();
        source.push(&table).unwrap();
        assert_eq!(source.pull().unwrap(), table);

        let frozen = MemorySource::new("frozen", Table::new(), true);
        assert!(matches!(frozen.push(&table), Err(DataError::ReadOnly(_))));
    }
}
