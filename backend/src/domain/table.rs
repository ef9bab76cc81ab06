//! Schema-less tabular model parsed from CSV entries.
//!
//! A [`Table`] keeps an ordered column list and rows of [`CellValue`]s. Column
//! types are inferred per column when parsing: a column is numeric only when
//! every non-null cell parses as a number. Tables are merged by union of
//! columns in first-seen order, padding missing cells with [`CellValue::Null`].

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::text_encoding::DecodeError;

/// Byte order mark written ahead of the serialised artifact.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Cell contents recognised as missing values.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One cell of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing value, written as an empty field.
    Null,
    /// Whole number from an all-integer column.
    Integer(i64),
    /// Number from a column holding at least one non-integer.
    Float(f64),
    /// Free text.
    Text(String),
}

impl CellValue {
    /// Render the cell as a CSV field.
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Integer(value) => Cow::Owned(value.to_string()),
            Self::Float(value) => Cow::Owned(render_float(*value)),
            Self::Text(value) => Cow::Borrowed(value.as_str()),
        }
    }
}

fn render_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Errors raised while turning one entry into a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableParseError {
    /// The bytes are malformed for the detected encoding.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The entry has no header row.
    #[error("no columns to parse from file")]
    Empty,
    /// The CSV reader rejected the input.
    #[error("malformed CSV: {message}")]
    Malformed {
        /// Reader diagnostic.
        message: String,
    },
    /// A data row has more fields than the header.
    #[error("expected {expected} fields in line {line}, saw {found}")]
    RaggedRow {
        /// One-based line number of the offending row.
        line: u64,
        /// Header width.
        expected: usize,
        /// Fields found in the row.
        found: usize,
    },
}

impl From<csv::Error> for TableParseError {
    fn from(error: csv::Error) -> Self {
        Self::Malformed {
            message: error.to_string(),
        }
    }
}

/// A row did not match the table width.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row has {found} cells but the table has {expected} columns")]
pub struct RowWidthError {
    /// Table width.
    pub expected: usize,
    /// Cells supplied.
    pub found: usize,
}

/// Ordered columns and rows of cells.
///
/// ## Invariants
/// - Every row has exactly `columns().len()` cells.
/// - Column names are unique.
///
/// # Examples
/// ```
/// use csvmerge::domain::{CellValue, Table};
///
/// let table = Table::parse_csv("id,val\n1,10\n").expect("valid CSV");
/// assert_eq!(table.columns(), ["id", "val"]);
/// assert_eq!(table.cell(0, "val"), Some(&CellValue::Integer(10)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given columns, de-duplicating names.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            columns: unique_column_names(columns),
            rows: Vec::new(),
        }
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Look up one cell by row index and column name.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let position = self.column_position(column)?;
        self.rows.get(row)?.get(position)
    }

    /// Append a row, enforcing the width invariant.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), RowWidthError> {
        if row.len() != self.columns.len() {
            return Err(RowWidthError {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Parse decoded CSV text whose first non-blank record is the header.
    ///
    /// Short rows are padded with nulls; long rows are rejected.
    pub fn parse_csv(text: &str) -> Result<Self, TableParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut header: Option<Vec<String>> = None;
        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            // The reader already skips empty lines.
            let record = record?;
            let Some(columns) = header.as_ref() else {
                header = Some(record.iter().map(str::to_owned).collect());
                continue;
            };
            if record.len() > columns.len() {
                return Err(TableParseError::RaggedRow {
                    line: record.position().map_or(0, csv::Position::line),
                    expected: columns.len(),
                    found: record.len(),
                });
            }
            let mut row: Vec<String> = record.iter().map(str::to_owned).collect();
            row.resize(columns.len(), String::new());
            raw_rows.push(row);
        }

        let header = header.ok_or(TableParseError::Empty)?;
        let mut columns: Vec<std::vec::IntoIter<CellValue>> = (0..header.len())
            .map(|index| {
                infer_column(
                    raw_rows
                        .iter()
                        .map(|row| row.get(index).map_or("", String::as_str)),
                )
                .into_iter()
            })
            .collect();

        let mut table = Self::new(header);
        for _ in 0..raw_rows.len() {
            let row = columns
                .iter_mut()
                .map(|column| column.next().unwrap_or(CellValue::Null))
                .collect();
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Set `column` to `value` on every row.
    ///
    /// An existing column of that name is overwritten in place; otherwise the
    /// column is appended.
    pub fn set_constant_column(&mut self, column: &str, value: &CellValue) {
        match self.column_position(column) {
            Some(position) => {
                for row in &mut self.rows {
                    if let Some(cell) = row.get_mut(position) {
                        *cell = value.clone();
                    }
                }
            }
            None => {
                self.columns.push(column.to_owned());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Tag every row with a provenance label column.
    #[must_use]
    pub fn labeled(mut self, column: &str, label: &str) -> Self {
        self.set_constant_column(column, &CellValue::from(label));
        self
    }

    /// Concatenate tables row-wise over the union of their columns.
    ///
    /// Columns appear in first-seen order and rows in input order. Cells for
    /// columns a source table lacks are null.
    #[must_use]
    pub fn concat(tables: Vec<Table>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for table in &tables {
            for column in &table.columns {
                if !positions.contains_key(column) {
                    positions.insert(column.clone(), columns.len());
                    columns.push(column.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(tables.iter().map(Self::row_count).sum());
        for table in tables {
            let targets: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|column| positions.get(column).copied())
                .collect();
            for row in table.rows {
                let mut merged = vec![CellValue::Null; columns.len()];
                for (cell, &target) in row.into_iter().zip(&targets) {
                    if let Some(slot) = merged.get_mut(target) {
                        *slot = cell;
                    }
                }
                rows.push(merged);
            }
        }

        Self { columns, rows }
    }

    /// Serialise as UTF-8 CSV with a BOM, `\n` terminators and minimal quoting.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buffer = UTF8_BOM.to_vec();
        {
            let mut writer = csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(&mut buffer);
            writer.write_record(&self.columns)?;
            for row in &self.rows {
                for cell in row {
                    writer.write_field(cell.render().as_bytes())?;
                }
                writer.write_record(None::<&[u8]>)?;
            }
            writer.flush()?;
        }
        Ok(buffer)
    }
}

fn is_na(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

fn looks_numeric(cell: &str) -> bool {
    cell.bytes().any(|byte| byte.is_ascii_digit())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

fn is_integer_token(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

fn infer_column<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> Vec<CellValue> {
    let mut kind = ColumnKind::Integer;
    for cell in cells.clone().filter(|cell| !is_na(cell)) {
        let trimmed = cell.trim();
        if is_integer_token(trimmed) {
            // Integers beyond i64 stay text so no digits are lost.
            if trimmed.parse::<i64>().is_ok() {
                continue;
            }
            kind = ColumnKind::Text;
            break;
        }
        if looks_numeric(trimmed) && trimmed.parse::<f64>().is_ok() {
            kind = ColumnKind::Float;
            continue;
        }
        kind = ColumnKind::Text;
        break;
    }

    cells
        .map(|cell| {
            if is_na(cell) {
                return CellValue::Null;
            }
            let trimmed = cell.trim();
            match kind {
                ColumnKind::Integer => trimmed
                    .parse()
                    .map_or_else(|_| CellValue::Text(cell.to_owned()), CellValue::Integer),
                ColumnKind::Float => trimmed
                    .parse()
                    .map_or_else(|_| CellValue::Text(cell.to_owned()), CellValue::Float),
                ColumnKind::Text => CellValue::Text(cell.to_owned()),
            }
        })
        .collect()
}

fn unique_column_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::new();
    for (index, name) in names.into_iter().enumerate() {
        let name = name.as_ref();
        let base = if name.trim().is_empty() {
            format!("Unnamed: {index}")
        } else {
            name.to_owned()
        };
        let mut candidate = base.clone();
        while seen.contains(&candidate) {
            let counter = counters.entry(base.clone()).or_insert(0);
            *counter += 1;
            candidate = format!("{base}.{counter}");
        }
        seen.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
