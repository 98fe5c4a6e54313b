//! Input sources for the marks and attendance tables.
//!
//! A source is either a spreadsheet workbook (`.xlsx`, `.xls`, `.xlsb`, `.ods`)
//! read through `calamine`, or a pair of CSV files. Both produce the same
//! [`Tables`]: two [`RawTable`]s whose first row became the headers.

use std::{
    fmt,
    io::{Cursor, Read, Seek},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use encoding_rs::Encoding;
use log::debug;

use crate::{data::Cell, error::LoadError, io_utils};

pub const MARKS_SHEET: &str = "Marks";
pub const ATTENDANCE_SHEET: &str = "Attendance";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Splits a cell grid into headers and data rows.
    ///
    /// Fully blank rows are dropped; short rows are padded with empty cells and
    /// long rows truncated to the header width.
    pub fn from_grid(name: &str, grid: Vec<Vec<Cell>>) -> Result<Self, LoadError> {
        let mut grid = grid.into_iter();
        let headers: Vec<String> = grid
            .next()
            .map(|row| row.iter().map(Cell::as_display).collect())
            .unwrap_or_default();
        if headers.is_empty() {
            return Err(LoadError::MissingHeader(name.to_string()));
        }
        let width = headers.len();
        let rows = grid
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub marks: RawTable,
    pub attendance: RawTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub marks: String,
    pub attendance: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            marks: MARKS_SHEET.to_string(),
            attendance: ATTENDANCE_SHEET.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Source {
    Workbook {
        path: PathBuf,
        sheets: SheetNames,
    },
    CsvPair {
        marks: PathBuf,
        attendance: PathBuf,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    },
}

impl Source {
    pub fn read(&self) -> Result<Tables> {
        match self {
            Source::Workbook { path, sheets } => read_workbook(path, sheets),
            Source::CsvPair {
                marks,
                attendance,
                delimiter,
                encoding,
            } => Ok(Tables {
                marks: read_csv_table(marks, MARKS_SHEET, *delimiter, encoding)?,
                attendance: read_csv_table(attendance, ATTENDANCE_SHEET, *delimiter, encoding)?,
            }),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Workbook { path, sheets } => write!(
                f,
                "workbook {path:?} (sheets '{}' and '{}')",
                sheets.marks, sheets.attendance
            ),
            Source::CsvPair {
                marks,
                attendance,
                delimiter,
                encoding,
            } => write!(
                f,
                "marks {marks:?} and attendance {attendance:?} (delimiter '{}', {})",
                crate::printable_delimiter(io_utils::resolve_input_delimiter(marks, *delimiter)),
                encoding.name()
            ),
        }
    }
}

pub fn read_workbook(path: &Path, sheets: &SheetNames) -> Result<Tables> {
    let mut workbook = open_workbook_auto(path)
        .map_err(LoadError::Workbook)
        .with_context(|| format!("Opening workbook {path:?}"))?;
    read_sheets(&mut workbook, sheets).with_context(|| format!("Reading workbook {path:?}"))
}

/// Reads an uploaded workbook held in memory.
pub fn read_workbook_bytes(bytes: Vec<u8>, sheets: &SheetNames) -> Result<Tables> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(LoadError::Workbook)
        .context("Opening uploaded workbook")?;
    read_sheets(&mut workbook, sheets).context("Reading uploaded workbook")
}

fn read_sheets<RS>(workbook: &mut Sheets<RS>, sheets: &SheetNames) -> Result<Tables>
where
    RS: Read + Seek,
{
    let marks = read_sheet(workbook, &sheets.marks)?;
    let attendance = read_sheet(workbook, &sheets.attendance)?;
    Ok(Tables { marks, attendance })
}

fn read_sheet<RS>(workbook: &mut Sheets<RS>, sheet: &str) -> Result<RawTable, LoadError>
where
    RS: Read + Seek,
{
    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(LoadError::MissingSheet {
            sheet: sheet.to_string(),
            available: available.join(", "),
        });
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|source| LoadError::Sheet {
            sheet: sheet.to_string(),
            source,
        })?;
    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    debug!("Sheet '{}' holds {} row(s) including headers", sheet, grid.len());
    RawTable::from_grid(sheet, grid)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::Bool(value) => Cell::Boolean(*value),
        Data::String(value) => Cell::from_text(value),
        other => Cell::Text(other.to_string()),
    }
}

pub fn read_csv_table(
    path: &Path,
    name: &str,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let mut grid: Vec<Vec<Cell>> = vec![headers.iter().map(|h| Cell::from_text(h)).collect()];
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} of {path:?}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} of {path:?}", row_idx + 2))?;
        grid.push(decoded.iter().map(|value| Cell::from_text(value)).collect());
    }
    Ok(RawTable::from_grid(name, grid)?)
}
