use std::{fmt, path::PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    export::EXPORT_FILE_NAME,
    filter::FilterPreset,
    grade::Grade,
    io_utils,
    report::DEFAULT_TOP_N,
    workbook::{ATTENDANCE_SHEET, MARKS_SHEET, SheetNames, Source},
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Analyze student marks and attendance workbooks",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the filtered dataset, summary statistics, and top performers
    Report(ReportArgs),
    /// Summary statistics for every score column of the filtered dataset
    Stats(StatsArgs),
    /// Rank the filtered dataset by Total
    Top(TopArgs),
    /// Write the filtered dataset to a CSV file
    Export(ExportArgs),
    /// Produce the data behind the Total bar plot or the correlation heatmap
    Chart(ChartArgs),
    /// Show one student's grade, totals, attendance, and marks breakdown
    Profile(ProfileArgs),
    /// List the average bounds, grades, and students available for filtering
    Facets(FacetsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Workbook holding the marks and attendance sheets (.xlsx, .xls, .xlsb, .ods)
    #[arg(
        short = 'i',
        long = "input",
        conflicts_with_all = ["marks", "attendance"],
        required_unless_present_all = ["marks", "attendance"]
    )]
    pub input: Option<PathBuf>,
    /// Name of the marks sheet inside the workbook
    #[arg(long = "marks-sheet", default_value = MARKS_SHEET)]
    pub marks_sheet: String,
    /// Name of the attendance sheet inside the workbook
    #[arg(long = "attendance-sheet", default_value = ATTENDANCE_SHEET)]
    pub attendance_sheet: String,
    /// Marks table as a CSV file (instead of a workbook)
    #[arg(long = "marks", requires = "attendance")]
    pub marks: Option<PathBuf>,
    /// Attendance table as a CSV file (instead of a workbook)
    #[arg(long = "attendance", requires = "marks")]
    pub attendance: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the CSV inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl SourceArgs {
    pub fn to_source(&self) -> Result<Source> {
        match (&self.input, &self.marks, &self.attendance) {
            (_, Some(marks), Some(attendance)) => Ok(Source::CsvPair {
                marks: marks.clone(),
                attendance: attendance.clone(),
                delimiter: self.delimiter,
                encoding: io_utils::resolve_encoding(self.input_encoding.as_deref())?,
            }),
            (Some(path), _, _) => Ok(Source::Workbook {
                path: path.clone(),
                sheets: SheetNames {
                    marks: self.marks_sheet.clone(),
                    attendance: self.attendance_sheet.clone(),
                },
            }),
            _ => Err(anyhow::anyhow!(
                "Provide a workbook with --input, or both --marks and --attendance"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive substring to look for in student names
    #[arg(short = 's', long = "search")]
    pub search: Option<String>,
    /// Lowest average to include (defaults to the lowest observed average)
    #[arg(long = "min-average", allow_hyphen_values = true)]
    pub min_average: Option<f64>,
    /// Highest average to include (defaults to the highest observed average)
    #[arg(long = "max-average", allow_hyphen_values = true)]
    pub max_average: Option<f64>,
    /// Grades to include, repeatable or comma separated (defaults to every grade present)
    #[arg(
        short = 'g',
        long = "grade",
        value_delimiter = ',',
        value_parser = parse_grade,
        action = clap::ArgAction::Append
    )]
    pub grades: Vec<Grade>,
    /// YAML file with saved filter settings; flags given here take precedence
    #[arg(long = "filters")]
    pub preset: Option<PathBuf>,
}

impl FilterArgs {
    pub fn to_preset(&self) -> Result<FilterPreset> {
        let base = match &self.preset {
            Some(path) => FilterPreset::load(path)?,
            None => FilterPreset::default(),
        };
        Ok(base.merge(FilterPreset {
            search: self.search.clone(),
            min_average: self.min_average,
            max_average: self.max_average,
            grades: self.grades.clone(),
        }))
    }
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Also write the filtered dataset to this CSV file ('-' for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Number of students in the top performers table
    #[arg(long = "top", default_value_t = DEFAULT_TOP_N)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Number of students to list
    #[arg(short = 'n', long = "count", default_value_t = DEFAULT_TOP_N)]
    pub count: usize,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Destination CSV file ('-' for stdout)
    #[arg(short = 'o', long = "output", default_value = EXPORT_FILE_NAME)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ChartKind {
    BarTotal,
    CorrelationHeatmap,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::BarTotal => f.write_str("Bar Plot (Total)"),
            ChartKind::CorrelationHeatmap => f.write_str("Correlation Heatmap"),
        }
    }
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Which chart to build
    #[arg(long = "kind", value_enum, default_value = "bar-total")]
    pub kind: ChartKind,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Student name, matched exactly; the first matching row is shown
    #[arg(long = "student")]
    pub student: String,
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FacetsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn parse_grade(value: &str) -> Result<Grade, String> {
    value.parse::<Grade>().map_err(|err| err.to_string())
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
