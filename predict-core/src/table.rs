//! Tabular feature data as read from an uploaded CSV file.
//!
//! Cells are kept as the raw strings found in the file so that columns the
//! service does not touch are written back out exactly as they came in.

use thiserror::Error;

/// UTF-8 byte order mark some spreadsheet tools prepend to CSV exports.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("CSV file has no header row")]
    Empty,

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column {column} has {actual} values but the table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("CSV output is not valid UTF-8")]
    Encoding,
}

/// Zero or more rows sharing one header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FeatureTable {
    /// Build a table from already split cells.
    ///
    /// Callers are responsible for giving every row as many cells as there
    /// are headers.
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == headers.len()));
        Self { headers, rows }
    }

    /// Parse comma-separated UTF-8 text with a header row.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(TableError::Empty);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(columns = headers.len(), rows = rows.len(), "Parsed CSV table");

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column named `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// The first `n` rows, for previews.
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Return the table with `values` as the column `name`.
    ///
    /// An existing column with the same name is overwritten in place,
    /// otherwise the column is appended after the last one.
    pub fn with_column(
        mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<Self, TableError> {
        if values.len() != self.rows.len() {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }

        Ok(self)
    }

    /// Serialize to comma-separated UTF-8 text, header first.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, TableError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| TableError::Csv(e.into_error().into()))
    }

    /// Same as [`to_csv_bytes`](Self::to_csv_bytes) but as a `String`.
    pub fn to_csv_string(&self) -> Result<String, TableError> {
        String::from_utf8(self.to_csv_bytes()?).map_err(|_| TableError::Encoding)
    }
}
