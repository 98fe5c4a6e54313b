//! The derived state of one load.
//!
//! A [`Dataset`] is built once from a pair of raw tables (normalize, coerce,
//! derive, grade, join) and never changes afterwards. Filtering produces a
//! [`View`] that borrows the dataset and lists the surviving row positions.
//! Loading another file means building another dataset.

use anyhow::{Context, Result};
use log::info;

use crate::{
    data::Cell,
    derive::{self, MarksRecord},
    grade::Grade,
    join,
    schema::{self, MarksLayout},
    workbook::{self, SheetNames, Source, Tables},
};

pub const TOTAL_COLUMN: &str = "Total";
pub const AVERAGE_COLUMN: &str = "Average";
pub const GRADE_COLUMN: &str = "Grade";
pub const ATTENDANCE_COLUMN: &str = "Attendance";

/// One row of the joined table.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub name: String,
    pub scores: Vec<Option<f64>>,
    pub total: f64,
    pub average: f64,
    pub grade: Grade,
    /// Attendance-side cells, aligned with [`Dataset::attendance_columns`].
    pub attendance: Vec<Cell>,
    pub matched_attendance: bool,
}

impl StudentRecord {
    pub fn from_marks(marks: &MarksRecord, attendance: Vec<Cell>, matched: bool) -> Self {
        Self {
            name: marks.name.clone(),
            scores: marks.scores.clone(),
            total: marks.total,
            average: marks.average,
            grade: marks.grade,
            attendance,
            matched_attendance: matched,
        }
    }

    pub fn value(&self, column: Column) -> Cell {
        match column {
            Column::Name => Cell::from_text(&self.name),
            Column::Score(idx) => self
                .scores
                .get(idx)
                .copied()
                .flatten()
                .map_or(Cell::Empty, Cell::Number),
            Column::Total => Cell::Number(self.total),
            Column::Average => {
                if self.average.is_nan() {
                    Cell::Empty
                } else {
                    Cell::Number(self.average)
                }
            }
            Column::Attendance(idx) => self.attendance.get(idx).cloned().unwrap_or_default(),
            Column::Grade => Cell::Text(self.grade.to_string()),
        }
    }
}

/// Position of a column in the joined table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Score(usize),
    Total,
    Average,
    Attendance(usize),
    Grade,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name_column: String,
    score_columns: Vec<String>,
    attendance_columns: Vec<String>,
    records: Vec<StudentRecord>,
}

impl Dataset {
    pub fn load(source: &Source) -> Result<Self> {
        let tables = source.read()?;
        Self::from_tables(tables).with_context(|| format!("Deriving dataset from {source}"))
    }

    pub fn from_workbook_bytes(bytes: Vec<u8>, sheets: &SheetNames) -> Result<Self> {
        let tables = workbook::read_workbook_bytes(bytes, sheets)?;
        Self::from_tables(tables)
    }

    pub fn from_tables(tables: Tables) -> Result<Self> {
        let marks = schema::normalize(tables.marks);
        let attendance = schema::normalize(tables.attendance);
        let layout = MarksLayout::from_table(&marks)?;
        let derived = derive::derive_marks(&marks);
        let joined = join::left_join(derived, &attendance, &layout)?;
        info!(
            "Joined {} marks row(s) with {} attendance row(s) into {} student row(s)",
            marks.rows.len(),
            attendance.rows.len(),
            joined.records.len()
        );
        Ok(Self {
            name_column: layout.name_column,
            score_columns: layout.score_columns,
            attendance_columns: joined.attendance_columns,
            records: joined.records,
        })
    }

    pub fn name_column(&self) -> &str {
        &self.name_column
    }

    pub fn score_columns(&self) -> &[String] {
        &self.score_columns
    }

    pub fn attendance_columns(&self) -> &[String] {
        &self.attendance_columns
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Joined column order: name, scores, Total, Average, attendance columns, Grade.
    pub fn columns(&self) -> Vec<(String, Column)> {
        let mut columns =
            Vec::with_capacity(self.score_columns.len() + self.attendance_columns.len() + 4);
        columns.push((self.name_column.clone(), Column::Name));
        columns.extend(
            self.score_columns
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), Column::Score(idx))),
        );
        columns.push((TOTAL_COLUMN.to_string(), Column::Total));
        columns.push((AVERAGE_COLUMN.to_string(), Column::Average));
        columns.extend(
            self.attendance_columns
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), Column::Attendance(idx))),
        );
        columns.push((GRADE_COLUMN.to_string(), Column::Grade));
        columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns().into_iter().map(|(name, _)| name).collect()
    }

    /// The attendance-percentage column, when the attendance table has one.
    pub fn attendance_column(&self) -> Option<Column> {
        self.attendance_columns
            .iter()
            .position(|name| name == ATTENDANCE_COLUMN)
            .map(Column::Attendance)
    }

    pub fn view_all(&self) -> View<'_> {
        View {
            dataset: self,
            indices: (0..self.records.len()).collect(),
        }
    }

    pub(crate) fn view_of(&self, indices: Vec<usize>) -> View<'_> {
        View {
            dataset: self,
            indices,
        }
    }
}

/// A filtered subset of a [`Dataset`], in joined-table order.
#[derive(Debug, Clone)]
pub struct View<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> View<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a StudentRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |idx| &dataset.records[*idx])
    }

    /// Every row rendered as display strings, in [`Dataset::columns`] order.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        let columns = self.dataset.columns();
        self.records()
            .map(|record| {
                columns
                    .iter()
                    .map(|(_, column)| record.value(*column).as_display())
                    .collect()
            })
            .collect()
    }
}
