//! CSV-backed [`TableSource`]: the thin I/O edge of the crate.
//!
//! Delimiter resolution is extension-based (`.csv` → comma, `.tsv` → tab)
//! with manual override, and input decoding goes through `encoding_rs` so
//! Excel exports in Windows-1252 load cleanly. The core never touches this
//! module on the query path; it is called only during reload.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    engine::{EngineError, SourceInfo, TableFetch, TableSource},
    table::{RawRow, RawTable},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Reads a delimited inventory export from disk on every fetch, reporting
/// the file's modification time as the source version.
pub struct CsvTableSource {
    path: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl CsvTableSource {
    pub fn new(path: PathBuf, delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        let delimiter = resolve_input_delimiter(&path, delimiter);
        Self { path, delimiter, encoding }
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> EngineError {
        EngineError::SourceUnavailable {
            name: self.name(),
            reason: reason.to_string(),
        }
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn decode_record(&self, record: &csv::ByteRecord) -> Result<Vec<String>, EngineError> {
        record
            .iter()
            .map(|field| {
                let (text, _, had_errors) = self.encoding.decode(field);
                if had_errors {
                    Err(self.unavailable(format!(
                        "failed to decode field with encoding {}",
                        self.encoding.name()
                    )))
                } else {
                    Ok(text.into_owned())
                }
            })
            .collect()
    }
}

impl TableSource for CsvTableSource {
    fn fetch(&self) -> Result<TableFetch, EngineError> {
        let file = File::open(&self.path).map_err(|err| self.unavailable(err))?;
        let modified: DateTime<Utc> = file
            .metadata()
            .and_then(|meta| meta.modified())
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .double_quote(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers = reader
            .byte_headers()
            .map_err(|err| self.unavailable(err))
            .and_then(|h| self.decode_record(&h.clone()))?;

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record.map_err(|err| self.unavailable(err))?;
            rows.push(RawRow::new(self.decode_record(&record)?));
        }
        debug!(
            "Fetched {} row(s) across {} column(s) from '{}'",
            rows.len(),
            headers.len(),
            self.name()
        );

        Ok(TableFetch {
            table: RawTable::new(headers, rows),
            info: SourceInfo { name: self.name(), modified },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn resolve_input_delimiter_prefers_extension() {
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn resolve_encoding_accepts_known_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some("windows-1252")).unwrap().name(), "windows-1252");
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
    }

    #[test]
    fn fetch_reads_headers_and_rows() {
        let mut file = NamedTempFile::with_suffix(".csv").expect("temp file");
        writeln!(file, "Artículo,Descripción,Cantidad").expect("write");
        writeln!(file, "100000089,zapatilla running,3").expect("write");
        let source = CsvTableSource::new(file.path().to_path_buf(), None, UTF_8);
        let fetched = source.fetch().expect("fetch");
        assert_eq!(fetched.table.column_count(), 3);
        assert_eq!(fetched.table.row_count(), 1);
        assert_eq!(fetched.table.rows()[0].cell(1), "zapatilla running");
    }

    #[test]
    fn missing_file_reports_source_unavailable() {
        let source = CsvTableSource::new(PathBuf::from("/no/such/export.csv"), None, UTF_8);
        let err = source.fetch().expect_err("missing file should error");
        assert!(matches!(err, EngineError::SourceUnavailable { .. }));
    }
}
