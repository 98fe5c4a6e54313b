//! Header normalization and the marks column layout.
//!
//! Headers are trimmed before anything looks them up, so `" Math "` in the
//! marks sheet and `"Math"` in a filter refer to the same column. The marks
//! layout is positional: the first column names the student and every other
//! column is a score.

use std::collections::HashSet;

use log::warn;

use crate::{
    dataset::{AVERAGE_COLUMN, GRADE_COLUMN, TOTAL_COLUMN},
    error::LoadError,
    workbook::RawTable,
};

const SCORE_COLLISION_PREFIX: &str = "marks_";

pub fn normalize_header(raw: &str, position: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        format!("column_{}", position + 1)
    } else {
        trimmed.to_string()
    }
}

pub fn normalize(table: RawTable) -> RawTable {
    let headers = table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, header)| normalize_header(header, idx))
        .collect();
    RawTable { headers, ..table }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarksLayout {
    pub name_column: String,
    pub score_columns: Vec<String>,
}

impl MarksLayout {
    /// Score headers that repeat the name column, a derived column, or an
    /// earlier score are renamed `marks_<header>` so joined headers stay unique.
    pub fn from_table(table: &RawTable) -> Result<Self, LoadError> {
        let (name_column, score_headers) = table
            .headers
            .split_first()
            .ok_or_else(|| LoadError::MissingHeader(table.name.clone()))?;
        let mut seen: HashSet<String> = std::iter::once(name_column.clone())
            .chain([TOTAL_COLUMN, AVERAGE_COLUMN, GRADE_COLUMN].map(String::from))
            .collect();
        let mut score_columns = Vec::with_capacity(score_headers.len());
        for header in score_headers {
            let mut candidate = header.clone();
            if seen.contains(&candidate) {
                candidate = format!("{SCORE_COLLISION_PREFIX}{header}");
                let mut counter = 1usize;
                while seen.contains(&candidate) {
                    candidate = format!("{SCORE_COLLISION_PREFIX}{header}_{counter}");
                    counter += 1;
                }
                warn!(
                    "Score column '{}' in '{}' clashes with another column; renamed to '{}'",
                    header, table.name, candidate
                );
            }
            seen.insert(candidate.clone());
            score_columns.push(candidate);
        }
        Ok(Self {
            name_column: name_column.clone(),
            score_columns,
        })
    }
}
