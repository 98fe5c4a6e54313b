use log::debug;

use crate::{
    data::{Cell, coerce_numeric},
    grade::Grade,
    workbook::RawTable,
};

/// One marks row after coercion, metrics, and grading, before the join.
#[derive(Debug, Clone, PartialEq)]
pub struct MarksRecord {
    pub name: String,
    pub scores: Vec<Option<f64>>,
    pub total: f64,
    pub average: f64,
    pub grade: Grade,
}

impl MarksRecord {
    pub fn from_scores(name: impl Into<String>, scores: Vec<Option<f64>>) -> Self {
        let total = total(&scores);
        let average = average(&scores);
        Self {
            name: name.into(),
            scores,
            total,
            average,
            grade: Grade::from_average(average),
        }
    }
}

/// Sum of present scores; zero when every score is missing.
pub fn total(scores: &[Option<f64>]) -> f64 {
    scores.iter().flatten().sum()
}

/// Mean of present scores; `NaN` when every score is missing.
pub fn average(scores: &[Option<f64>]) -> f64 {
    let (sum, count) = scores
        .iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, count), score| (sum + score, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

pub fn coerce_scores(cells: &[Cell]) -> Vec<Option<f64>> {
    cells.iter().map(coerce_numeric).collect()
}

/// Derives a record for every marks row. Column 0 is the name, the rest are scores.
pub fn derive_marks(table: &RawTable) -> Vec<MarksRecord> {
    let mut coerced_to_missing = 0usize;
    let records = table
        .rows
        .iter()
        .map(|row| {
            let name = row.first().map(Cell::as_key).unwrap_or_default();
            let score_cells = row.get(1..).unwrap_or_default();
            let scores = coerce_scores(score_cells);
            coerced_to_missing += score_cells
                .iter()
                .zip(&scores)
                .filter(|(cell, score)| !cell.is_empty() && score.is_none())
                .count();
            MarksRecord::from_scores(name, scores)
        })
        .collect::<Vec<_>>();
    debug!(
        "Derived metrics for {} marks row(s); {} unparseable score cell(s) treated as missing",
        records.len(),
        coerced_to_missing
    );
    records
}
