//! Tabular row sources.
//!
//! A source yields loosely-typed row objects in source order. Turning rows
//! into validated records is the dataset store's job; sources only fetch.

use crate::error::SourceError;
use crate::models::RawRow;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use tracing::debug;

/// Asynchronous provider of raw rows.
pub trait RowSource: Send + Sync {
    /// Fetch all rows, or report why they could not be read.
    fn fetch(&self) -> impl Future<Output = Result<Vec<RawRow>, SourceError>> + Send;
}

/// Rows stored on disk as a JSON array of objects.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for JsonFileSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<RawRow>, SourceError>> + Send {
        let path = self.path.clone();

        async move {
            debug!("Reading rows from {}", path.display());

            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })?;

            let value: Value =
                serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                    path: path.clone(),
                    source,
                })?;

            rows_from_value(value)
        }
    }
}

/// Split a decoded JSON document into row objects.
///
/// Array entries that are not objects are skipped, like rows without an
/// outcome.
pub fn rows_from_value(value: Value) -> Result<Vec<RawRow>, SourceError> {
    let Value::Array(items) = value else {
        return Err(SourceError::Shape(format!(
            "expected a JSON array, found {}",
            kind_of(&value)
        )));
    };

    let total = items.len();
    let rows: Vec<RawRow> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect();

    if rows.len() < total {
        debug!("Skipped {} non-object entries", total - rows.len());
    }

    Ok(rows)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Rows stored on disk as comma-separated values with a header line.
///
/// Cells are typed the way spreadsheet exports read: empty cells become
/// `null`, `true`/`false` become booleans, numeric cells become numbers and
/// everything else stays a string.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for CsvFileSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<RawRow>, SourceError>> + Send {
        let path = self.path.clone();

        async move {
            debug!("Reading CSV rows from {}", path.display());

            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })?;

            rows_from_csv(&content).map_err(|message| SourceError::Csv { path, message })
        }
    }
}

/// A file source whose format follows the file extension.
///
/// `.csv` files are read as CSV; anything else is read as a JSON array.
#[derive(Debug, Clone)]
pub enum FileSource {
    Json(JsonFileSource),
    Csv(CsvFileSource),
}

impl FileSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            Self::Csv(CsvFileSource::new(path))
        } else {
            Self::Json(JsonFileSource::new(path))
        }
    }
}

impl RowSource for FileSource {
    async fn fetch(&self) -> Result<Vec<RawRow>, SourceError> {
        match self {
            Self::Json(source) => source.fetch().await,
            Self::Csv(source) => source.fetch().await,
        }
    }
}

/// Parse CSV text into row objects keyed by the header line.
///
/// Quoted cells may contain commas, doubled quotes and line breaks. Blank
/// lines are skipped. Missing trailing cells read as `null`.
pub fn rows_from_csv(content: &str) -> Result<Vec<RawRow>, String> {
    let mut lines = parse_csv_records(content)?.into_iter();

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();

    let rows = lines
        .map(|cells| {
            let mut cells = cells.into_iter();
            header
                .iter()
                .map(|name| {
                    let value = cells.next().map_or(Value::Null, |cell| typed_cell(&cell));
                    (name.clone(), value)
                })
                .collect::<RawRow>()
        })
        .collect();

    Ok(rows)
}

fn parse_csv_records(content: &str) -> Result<Vec<Vec<String>>, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    cell.push(c);
                }
                _ => cell.push(c),
            }
            continue;
        }

        match c {
            '"' if cell.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                line += 1;
                record.push(std::mem::take(&mut cell));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => cell.push(c),
        }
    }

    if in_quotes {
        return Err(format!("unterminated quoted field starting on line {quote_line}"));
    }

    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        push_record(&mut records, record);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}

fn typed_cell(cell: &str) -> Value {
    let trimmed = cell.trim();

    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Some(n) = trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return Value::Number(n);
    }

    Value::String(cell.to_string())
}

/// In-memory source, for embedding and tests.
#[derive(Debug, Clone)]
#[allow(dead_code)] // The CLI only reads from files
pub enum StaticSource {
    /// Yields these rows.
    Rows(Vec<RawRow>),
    /// Fails with this message.
    Failing(String),
}

#[allow(dead_code)] // The CLI only reads from files
impl StaticSource {
    /// Build a source from a JSON array literal.
    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        rows_from_value(value).map(Self::Rows)
    }
}

impl RowSource for StaticSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<RawRow>, SourceError>> + Send {
        let result = match self {
            Self::Rows(rows) => Ok(rows.clone()),
            Self::Failing(message) => Err(SourceError::Shape(message.clone())),
        };

        async move { result }
    }
}
