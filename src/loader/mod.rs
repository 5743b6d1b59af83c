//! Spreadsheet loader for assessment responses.
//!
//! This module reads the first (or a named) sheet of a workbook into a
//! [`ResponseTable`], checking the header row against the required
//! columns. Individual cells are never repaired: a cell that cannot be
//! read as the expected type becomes a missing value.

use crate::error::{AnalysisError, Result};
use crate::models::{AnswerStatus, ResponseRecord, ResponseTable};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

pub const QUESTION_ID: &str = "Question ID";
pub const QUESTION_TEXT: &str = "Question Text";
pub const LOGIN_ID: &str = "Login ID";
pub const ANSWER_STATUS: &str = "Answer Status";
pub const TIME_SPENT: &str = "TimeSpent (InSeconds)";
pub const ATTEMPT_ID: &str = "Attempt ID";

/// Header names the input must carry, matched exactly.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    QUESTION_ID,
    QUESTION_TEXT,
    LOGIN_ID,
    ANSWER_STATUS,
    TIME_SPENT,
    ATTEMPT_ID,
];

/// Options for loading a workbook.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Sheet to read; the first sheet when `None`.
    pub sheet: Option<String>,
    /// Accepted file extensions, lowercase, without the dot.
    pub extensions: Vec<String>,
    /// Maximum input size in bytes.
    pub max_file_size: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            extensions: vec!["xlsx", "xls", "xlsm", "xlsb", "ods"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl From<&crate::config::LoaderConfig> for LoadOptions {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            sheet: config.sheet.clone(),
            extensions: config.extensions.clone(),
            max_file_size: config.max_file_size,
        }
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    question_id: usize,
    question_text: usize,
    login_id: usize,
    answer_status: usize,
    time_spent: usize,
    attempt_id: usize,
}

/// Reads response spreadsheets into tables.
pub struct SheetLoader {
    options: LoadOptions,
}

impl SheetLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Load a workbook from disk.
    pub fn load_path(&self, path: &Path) -> Result<ResponseTable> {
        let source = path.display().to_string();

        self.check_extension(&source)?;

        let metadata = fs::metadata(path).map_err(|e| AnalysisError::load(&source, e))?;
        if !metadata.is_file() {
            return Err(AnalysisError::load(&source, "not a regular file"));
        }
        self.check_size(&source, metadata.len())?;

        let mut workbook = open_workbook_auto(path).map_err(|e| AnalysisError::load(&source, e))?;
        self.read_workbook(&mut workbook, &source)
    }

    /// Load a workbook held in memory. `source_name` must carry the file
    /// extension, as an uploaded file name would.
    pub fn load_bytes(&self, bytes: Vec<u8>, source_name: &str) -> Result<ResponseTable> {
        self.check_extension(source_name)?;
        self.check_size(source_name, bytes.len() as u64)?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AnalysisError::load(source_name, e))?;
        self.read_workbook(&mut workbook, source_name)
    }

    fn check_extension(&self, source: &str) -> Result<()> {
        let ext = Path::new(source)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if self.options.extensions.iter().any(|allowed| *allowed == ext) {
            Ok(())
        } else {
            Err(AnalysisError::load(
                source,
                format!(
                    "unsupported file type '{}' (expected one of: {})",
                    ext,
                    self.options.extensions.join(", ")
                ),
            ))
        }
    }

    fn check_size(&self, source: &str, size: u64) -> Result<()> {
        if size > self.options.max_file_size {
            return Err(AnalysisError::load(
                source,
                format!(
                    "file is {} bytes, limit is {} bytes",
                    size, self.options.max_file_size
                ),
            ));
        }
        Ok(())
    }

    fn read_workbook<RS: Read + Seek>(
        &self,
        workbook: &mut Sheets<RS>,
        source: &str,
    ) -> Result<ResponseTable> {
        let range = self.read_range(workbook, source)?;
        let table = parse_range(&range, source)?;
        debug!("Loaded {} rows from {}", table.len(), source);

        if table.is_empty() {
            return Err(AnalysisError::EmptyDataset {
                source_name: source.to_string(),
            });
        }
        Ok(table)
    }

    fn read_range<RS: Read + Seek>(
        &self,
        workbook: &mut Sheets<RS>,
        source: &str,
    ) -> Result<Range<Data>> {
        match self.options.sheet {
            Some(ref name) => workbook
                .worksheet_range(name)
                .map_err(|e| AnalysisError::load(source, format!("sheet '{}': {}", name, e))),
            None => workbook
                .worksheet_range_at(0)
                .ok_or_else(|| AnalysisError::load(source, "workbook has no sheets"))?
                .map_err(|e| AnalysisError::load(source, e)),
        }
    }
}

/// Parse a sheet range: the first non-blank row is the header.
fn parse_range(range: &Range<Data>, source: &str) -> Result<ResponseTable> {
    let mut rows = range.rows().filter(|row| !is_blank_row(row));

    let header = match rows.next() {
        Some(header) => header,
        None => {
            return Err(AnalysisError::Schema {
                source_name: source.to_string(),
                columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            })
        }
    };
    let columns = resolve_columns(header, source)?;

    let records = rows.map(|row| parse_row(row, &columns)).collect();
    Ok(ResponseTable::new(source, records))
}

fn resolve_columns(header: &[Data], source: &str) -> Result<ColumnMap> {
    // a repeated header name resolves to its first column
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (i, cell) in header.iter().enumerate() {
        if let Data::String(name) = cell {
            positions.entry(name.as_str()).or_insert(i);
        }
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !positions.contains_key(**c))
        .map(|c| c.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(AnalysisError::Schema {
            source_name: source.to_string(),
            columns: missing,
        });
    }

    let at = |name: &str| positions.get(name).copied().unwrap_or_default();
    Ok(ColumnMap {
        question_id: at(QUESTION_ID),
        question_text: at(QUESTION_TEXT),
        login_id: at(LOGIN_ID),
        answer_status: at(ANSWER_STATUS),
        time_spent: at(TIME_SPENT),
        attempt_id: at(ATTEMPT_ID),
    })
}

fn parse_row(row: &[Data], columns: &ColumnMap) -> ResponseRecord {
    let cell = |i: usize| row.get(i).unwrap_or(&Data::Empty);

    ResponseRecord {
        student_id: cell_text(cell(columns.login_id)),
        question_id: cell_text(cell(columns.question_id)),
        question_text: cell_text(cell(columns.question_text)),
        attempt_id: cell_integer(cell(columns.attempt_id)),
        answer_status: AnswerStatus::from(cell_text(cell(columns.answer_status)).as_str()),
        time_spent_seconds: cell_number(cell(columns.time_spent)),
    }
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|cell| cell_text(cell).is_empty())
}

/// Cell as trimmed text; integral floats print without a fraction.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Finite numeric value, from a number cell or a numeric string.
fn cell_number(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Integral value; fractional numbers are treated as missing.
fn cell_integer(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| float_to_int(s.parse().ok()?))
        }
        Data::Float(f) => float_to_int(*f),
        _ => None,
    }
}

fn float_to_int(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then(|| value as i64)
}
