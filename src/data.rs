use std::fmt;

use serde::Serialize;

/// A raw cell as read from a workbook sheet or a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl Cell {
    pub fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Boolean(b) => b.to_string(),
        }
    }

    /// Text used to match student names across tables.
    pub fn as_key(&self) -> String {
        self.as_display().trim().to_string()
    }

    pub fn as_number(&self) -> Option<f64> {
        coerce_numeric(self)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Converts a cell to a number, or `None` when it holds nothing usable.
///
/// Never fails: dirty cells (free text, `NaN`, blanks) simply become missing.
pub fn coerce_numeric(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Empty => return None,
        Cell::Number(n) => *n,
        Cell::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Cell::Text(raw) => raw.trim().parse::<f64>().ok()?,
    };
    (!value.is_nan()).then_some(value)
}

/// Shortest text that parses back to the same `f64`; `NaN` renders empty.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}
