//! Columnar input and output.
//!
//! Cells are kept as strings; only the feature builder interprets them, so
//! extra columns pass through untouched into the output file.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{LumpError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(LumpError::malformed("table has no header row"));
        }
        if let Some(pos) = rows.iter().position(|r| r.len() != headers.len()) {
            return Err(LumpError::malformed(format!(
                "row {} has {} cells, header has {}",
                pos + 1,
                rows[pos].len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    /// Read a table, picking the parser from the file extension.
    pub fn read_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let table = match ext.as_str() {
            "csv" => Self::from_csv_reader(File::open(path)?, b',')?,
            "tsv" => Self::from_csv_reader(File::open(path)?, b'\t')?,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::from_spreadsheet(path)?,
            other => {
                return Err(LumpError::malformed(format!(
                    "unsupported file format '{other}' (expected csv, tsv, xlsx, xls or ods)"
                )))
            }
        };

        debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.headers.len(),
            "table loaded"
        );
        Ok(table)
    }

    pub fn from_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(headers, rows)
    }

    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::from_csv_reader(data.as_bytes(), b',')
    }

    /// First worksheet of a workbook; the first row is the header.
    fn from_spreadsheet(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LumpError::malformed("workbook has no worksheets"))??;

        let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        let headers = rows
            .next()
            .ok_or_else(|| LumpError::malformed("worksheet is empty"))?;

        Self::new(headers, rows.collect())
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

    /// Append a column. `values` must have one entry per row.
    pub fn push_column(&mut self, header: impl Into<String>, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(LumpError::malformed(format!(
                "column has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        self.headers.push(header.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_path(&self, path: &Path) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(LumpError::malformed)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
