use std::fmt::Write as _;

use anyhow::{Result, anyhow};
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::ProfileArgs,
    data::{Cell, format_number, format_optional},
    dataset::{Dataset, StudentRecord},
    grade::Grade,
    table,
};

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let dataset = crate::load_dataset(&args.source)?;
    let profile = StudentProfile::lookup(&dataset, &args.student)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print!("{}", profile.render());
    }
    info!(
        "Profiled '{}' across {} subject(s)",
        profile.name,
        profile.subjects.len()
    );
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScore {
    pub subject: String,
    pub score: Option<f64>,
    /// Percentage of the student's Total contributed by this subject.
    pub share_percent: Option<f64>,
}

/// One student's details, taken from the first joined row with that name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    pub name: String,
    pub grade: Grade,
    pub total: f64,
    pub average: Option<f64>,
    pub average_display: String,
    /// Present only when the joined table has an attendance column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Cell>,
    /// Score breakdown in column order; also the trend series.
    pub subjects: Vec<SubjectScore>,
    /// Further rows with the same name that were ignored.
    pub duplicates_ignored: usize,
}

impl StudentProfile {
    pub fn lookup(dataset: &Dataset, name: &str) -> Result<Self> {
        let mut matches = dataset
            .records()
            .iter()
            .filter(|record| record.name == name);
        let record = matches
            .next()
            .ok_or_else(|| anyhow!("Student '{name}' not found"))?;
        let duplicates_ignored = matches.count();
        if duplicates_ignored > 0 {
            warn!(
                "'{}' appears {} more time(s); showing the first row",
                name, duplicates_ignored
            );
        }
        Ok(Self::from_record(dataset, record, duplicates_ignored))
    }

    fn from_record(dataset: &Dataset, record: &StudentRecord, duplicates_ignored: usize) -> Self {
        let subjects = dataset
            .score_columns()
            .iter()
            .zip(&record.scores)
            .map(|(subject, score)| SubjectScore {
                subject: subject.clone(),
                score: *score,
                share_percent: score
                    .filter(|_| record.total > 0.0)
                    .map(|score| score / record.total * 100.0),
            })
            .collect();
        let average = (!record.average.is_nan()).then_some(record.average);
        Self {
            name: record.name.clone(),
            grade: record.grade,
            total: record.total,
            average,
            average_display: format_average(record.average),
            attendance: dataset
                .attendance_column()
                .map(|column| record.value(column)),
            subjects,
            duplicates_ignored,
        }
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Profile: {}", self.name);
        let _ = writeln!(output, "Grade: {}", self.grade);
        let _ = writeln!(output, "Total Score: {}", format_number(self.total));
        let _ = writeln!(output, "Average Score: {}", self.average_display);
        if let Some(attendance) = &self.attendance {
            let shown = match attendance {
                Cell::Empty => "n/a".to_string(),
                other => format!("{other}%"),
            };
            let _ = writeln!(output, "Attendance: {shown}");
        }
        if self.duplicates_ignored > 0 {
            let _ = writeln!(
                output,
                "Note: {} other row(s) share this name; showing the first",
                self.duplicates_ignored
            );
        }
        let _ = writeln!(output, "\nMarks breakdown");
        let headers = vec!["subject".to_string(), "score".to_string(), "share".to_string()];
        let rows = self
            .subjects
            .iter()
            .map(|subject| {
                vec![
                    subject.subject.clone(),
                    format_optional(subject.score),
                    subject
                        .share_percent
                        .map(|share| format!("{share:.1}%"))
                        .unwrap_or_default(),
                ]
            })
            .collect::<Vec<_>>();
        output.push_str(&table::render_table(&headers, &rows));
        output
    }
}

/// Two decimals; an undefined average shows as `nan`.
pub fn format_average(average: f64) -> String {
    if average.is_nan() {
        "nan".to_string()
    } else {
        format!("{average:.2}")
    }
}
