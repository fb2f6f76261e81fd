use crate::error::{PrepError, PrepResult, RowError};
use std::fs::File;
use std::path::{Component, Path};

/// Columns per row: relative path, category (unused), label.
const ROW_FIELDS: usize = 3;

/// One entry from the row file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    /// 1-based line in the row file.
    pub line: u64,
    pub relative_path: String,
    pub label_raw: String,
}

/// Single-pass reader over the row file. Reopen the file for a second pass.
pub struct RowSource {
    records: csv::StringRecordsIntoIter<File>,
    read: u64,
    exhausted: bool,
}

impl RowSource {
    pub fn open(path: &Path) -> PrepResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| PrepError::RowSource(format!("{}: {}", path.display(), e)))?;

        Ok(Self { records: reader.into_records(), read: 0, exhausted: false })
    }
}

impl Iterator for RowSource {
    type Item = Result<ManifestRow, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let record = self.records.next()?;
        self.read += 1;

        match record {
            Ok(record) => {
                let line = record.position().map_or(self.read, csv::Position::line);
                Some(parse_row(line, &record))
            }
            Err(e) => {
                // The reader cannot make progress past an I/O failure.
                if e.is_io_error() {
                    self.exhausted = true;
                }
                let line = e.position().map_or(self.read, csv::Position::line);
                Some(Err(RowError::RowFormat { line, reason: e.to_string() }))
            }
        }
    }
}

fn parse_row(line: u64, record: &csv::StringRecord) -> Result<ManifestRow, RowError> {
    if record.len() != ROW_FIELDS {
        return Err(RowError::RowFormat {
            line,
            reason: format!("expected {ROW_FIELDS} fields, found {}", record.len()),
        });
    }

    let relative_path = &record[0];
    let label_raw = &record[2];
    if relative_path.is_empty() {
        return Err(RowError::RowFormat { line, reason: "empty asset path".to_string() });
    }
    if label_raw.is_empty() {
        return Err(RowError::RowFormat { line, reason: "empty label".to_string() });
    }
    if !Path::new(relative_path).components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
        return Err(RowError::RowFormat {
            line,
            reason: format!("asset path `{relative_path}` must stay inside the asset folder"),
        });
    }

    Ok(ManifestRow { line, relative_path: relative_path.to_string(), label_raw: label_raw.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowErrorKind;
    use tempfile::TempDir;

    fn source(content: &str) -> (TempDir, RowSource) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rows.csv");
        std::fs::write(&path, content).unwrap();
        let rows = RowSource::open(&path).unwrap();
        (temp, rows)
    }

    #[test]
    fn test_rows_in_file_order() {
        let (_temp, rows) = source("tacos/1.jpg,tacos,0\nburrito/2.jpg,burrito,1\n");
        let rows: Vec<_> = rows.map(Result::unwrap).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].relative_path, "tacos/1.jpg");
        assert_eq!(rows[0].label_raw, "0");
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[1].relative_path, "burrito/2.jpg");
        assert_eq!(rows[1].label_raw, "1");
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_malformed_row_does_not_stop_iteration() {
        let (_temp, rows) = source("a.jpg,x,0\nbroken\nb.jpg,x,1\n");
        let results: Vec<_> = rows.collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), RowErrorKind::RowFormat);
        assert!(err.to_string().contains("line 2"));
        assert_eq!(results[2].as_ref().unwrap().relative_path, "b.jpg");
    }

    #[test]
    fn test_too_many_fields_and_empty_label() {
        let (_temp, rows) = source("a.jpg,x,0,extra\nb.jpg,x,\n");
        let results: Vec<_> = rows.collect();
        assert!(results.iter().all(Result::is_err));
    }

    #[test]
    fn test_paths_escaping_asset_folder_are_rejected() {
        let (_temp, rows) = source("/etc/passwd,x,0\n../secret.jpg,x,0\ntacos/../../b.jpg,x,1\n./tacos/ok.jpg,x,1\n");
        let results: Vec<_> = rows.collect();

        assert_eq!(results.len(), 4);
        for result in &results[..3] {
            let err = result.as_ref().unwrap_err();
            assert_eq!(err.kind(), RowErrorKind::RowFormat);
            assert!(err.to_string().contains("inside the asset folder"));
        }
        assert_eq!(results[3].as_ref().unwrap().relative_path, "./tacos/ok.jpg");
    }

    #[test]
    fn test_open_missing_row_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = RowSource::open(&temp.path().join("missing.csv")).err().unwrap();
        assert!(matches!(err, PrepError::RowSource(_)));
    }
}
