use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::{
    data::Cell,
    dataset::{AVERAGE_COLUMN, GRADE_COLUMN, StudentRecord, TOTAL_COLUMN},
    derive::MarksRecord,
    error::LoadError,
    schema::MarksLayout,
    workbook::RawTable,
};

const COLLISION_PREFIX: &str = "attendance_";

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub attendance_columns: Vec<String>,
    pub records: Vec<StudentRecord>,
}

/// Left-joins derived marks rows onto the attendance table by student name.
///
/// Every marks row survives. A name with several attendance rows fans out into
/// one joined row per match, in attendance-table order; a name with none keeps a
/// single row whose attendance cells are empty. Output follows marks order.
pub fn left_join(
    marks: Vec<MarksRecord>,
    attendance: &RawTable,
    layout: &MarksLayout,
) -> Result<JoinedTable, LoadError> {
    let key_index = attendance.column_index(&layout.name_column).ok_or_else(|| {
        LoadError::MissingJoinColumn {
            table: attendance.name.clone(),
            column: layout.name_column.clone(),
        }
    })?;
    let (attendance_columns, right_columns) =
        build_output_headers(layout, &attendance.headers, key_index);
    let lookup = build_lookup(attendance, key_index);

    for (name, bucket) in &lookup {
        if bucket.len() > 1 {
            warn!(
                "Attendance lists '{}' {} times; joined rows fan out",
                name,
                bucket.len()
            );
        }
    }

    let mut records = Vec::with_capacity(marks.len());
    let mut matched_rows = 0usize;
    let mut unmatched_rows = 0usize;
    for record in marks {
        match lookup.get(record.name.as_str()) {
            Some(bucket) => {
                for row in bucket {
                    let cells = right_columns
                        .iter()
                        .map(|idx| row.get(*idx).cloned().unwrap_or_default())
                        .collect();
                    records.push(StudentRecord::from_marks(&record, cells, true));
                    matched_rows += 1;
                }
            }
            None => {
                let cells = vec![Cell::Empty; right_columns.len()];
                records.push(StudentRecord::from_marks(&record, cells, false));
                unmatched_rows += 1;
            }
        }
    }

    debug!(
        "Join complete: {} output row(s), {} matched, {} without attendance",
        records.len(),
        matched_rows,
        unmatched_rows
    );
    Ok(JoinedTable {
        attendance_columns,
        records,
    })
}

fn build_lookup(table: &RawTable, key_index: usize) -> HashMap<String, Vec<&[Cell]>> {
    let mut map: HashMap<String, Vec<&[Cell]>> = HashMap::new();
    for row in &table.rows {
        let key = row.get(key_index).map(Cell::as_key).unwrap_or_default();
        map.entry(key).or_default().push(row.as_slice());
    }
    map
}

fn build_output_headers(
    layout: &MarksLayout,
    right_headers: &[String],
    key_index: usize,
) -> (Vec<String>, Vec<usize>) {
    let mut seen: HashSet<String> = std::iter::once(layout.name_column.clone())
        .chain(layout.score_columns.iter().cloned())
        .chain([TOTAL_COLUMN, AVERAGE_COLUMN, GRADE_COLUMN].map(String::from))
        .collect();
    let mut headers = Vec::new();
    let mut right_columns = Vec::new();

    for (idx, name) in right_headers.iter().enumerate() {
        if idx == key_index {
            continue;
        }
        let mut candidate = name.clone();
        if seen.contains(&candidate) {
            candidate = format!("{COLLISION_PREFIX}{name}");
            let mut counter = 1usize;
            while seen.contains(&candidate) {
                candidate = format!("{COLLISION_PREFIX}{name}_{counter}");
                counter += 1;
            }
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
        right_columns.push(idx);
    }

    (headers, right_columns)
}
