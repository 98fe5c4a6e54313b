//! Data behind the two dataset charts.
//!
//! Rendering is left to whatever plots the output; this module only shapes the
//! series: Total per student for the bar plot, and a Pearson correlation
//! matrix over the numeric columns of the filtered view for the heatmap.

use anyhow::Result;
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::{ChartArgs, ChartKind},
    data::format_number,
    dataset::{Column, TOTAL_COLUMN, View},
    report, stats, table,
};

pub const INSUFFICIENT_NUMERIC_WARNING: &str = "Not enough numeric data for correlation heatmap.";

pub fn execute(args: &ChartArgs) -> Result<()> {
    let (dataset, filters) = crate::load_filtered(&args.source, &args.filters)?;
    let view = filters.apply(&dataset);
    match args.kind {
        ChartKind::BarTotal => {
            let series = bar_total(&view);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                println!("{}", args.kind);
                table::print_table(&series.headers(), &series.rows());
            }
            info!("Built {} bar(s) of {}", series.bars.len(), TOTAL_COLUMN);
        }
        ChartKind::CorrelationHeatmap => {
            let heatmap = correlation_heatmap(&view);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&heatmap)?);
            }
            match &heatmap {
                Heatmap::Matrix(matrix) => {
                    if !args.json {
                        println!("{}", args.kind);
                        table::print_table(&matrix.headers(), &matrix.rows());
                    }
                    info!(
                        "Correlated {} numeric column(s) over {} row(s)",
                        matrix.columns.len(),
                        view.len()
                    );
                }
                Heatmap::Insufficient { numeric_columns } => {
                    if !args.json {
                        println!("warning: {INSUFFICIENT_NUMERIC_WARNING}");
                    }
                    warn!(
                        "Correlation heatmap skipped: {} numeric column(s) after filtering",
                        numeric_columns
                    );
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub label_column: String,
    pub value_column: String,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn headers(&self) -> Vec<String> {
        vec![self.label_column.clone(), self.value_column.clone()]
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.bars
            .iter()
            .map(|bar| vec![bar.label.clone(), format_number(bar.value)])
            .collect()
    }
}

/// Total per student, highest first, ties in original order.
pub fn bar_total(view: &View<'_>) -> BarSeries {
    BarSeries {
        label_column: view.dataset().name_column().to_string(),
        value_column: TOTAL_COLUMN.to_string(),
        bars: report::ranked(view)
            .into_iter()
            .map(|record| Bar {
                label: record.name.clone(),
                value: record.total,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major coefficients; `None` where the correlation is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let row = self.columns.iter().position(|name| name == row)?;
        let column = self.columns.iter().position(|name| name == column)?;
        self.values[row][column]
    }

    pub fn headers(&self) -> Vec<String> {
        std::iter::once(String::new())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.columns
            .iter()
            .zip(&self.values)
            .map(|(name, values)| {
                std::iter::once(name.clone())
                    .chain(values.iter().map(|value| stats::format_metric(*value)))
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Heatmap {
    Matrix(CorrelationMatrix),
    Insufficient { numeric_columns: usize },
}

/// Numeric columns of the view with their per-row values.
///
/// Score columns, Total, and Average are numeric by construction, even in an
/// empty view. An attendance column qualifies when every present value is
/// numeric and at least one is present. Name and Grade never qualify.
pub fn numeric_columns(view: &View<'_>) -> Vec<(String, Vec<Option<f64>>)> {
    view.dataset()
        .columns()
        .into_iter()
        .filter_map(|(name, column)| match column {
            Column::Name | Column::Grade => None,
            Column::Score(_) | Column::Total | Column::Average => Some((
                name,
                view.records()
                    .map(|record| record.value(column).as_number())
                    .collect(),
            )),
            Column::Attendance(_) => {
                let mut present = 0usize;
                let mut values = Vec::with_capacity(view.len());
                for record in view.records() {
                    let cell = record.value(column);
                    if cell.is_empty() {
                        values.push(None);
                        continue;
                    }
                    values.push(Some(cell.as_number()?));
                    present += 1;
                }
                (present > 0).then_some((name, values))
            }
        })
        .collect()
}

pub fn correlation_heatmap(view: &View<'_>) -> Heatmap {
    correlation_matrix(numeric_columns(view))
}

/// Pairwise correlations of `columns`; fewer than two columns is insufficient.
pub fn correlation_matrix(columns: Vec<(String, Vec<Option<f64>>)>) -> Heatmap {
    if columns.len() <= 1 {
        return Heatmap::Insufficient {
            numeric_columns: columns.len(),
        };
    }
    let values = columns
        .iter()
        .map(|(_, left)| {
            columns
                .iter()
                .map(|(_, right)| pearson(left, right))
                .collect()
        })
        .collect();
    Heatmap::Matrix(CorrelationMatrix {
        columns: columns.into_iter().map(|(name, _)| name).collect(),
        values,
    })
}

/// Pearson coefficient over rows where both values are present.
pub fn pearson(left: &[Option<f64>], right: &[Option<f64>]) -> Option<f64> {
    let pairs = left
        .iter()
        .zip(right)
        .filter_map(|(l, r)| Some(((*l)?, (*r)?)))
        .collect::<Vec<_>>();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_left = pairs.iter().map(|(l, _)| l).sum::<f64>() / n;
    let mean_right = pairs.iter().map(|(_, r)| r).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (l, r) in &pairs {
        let dl = l - mean_left;
        let dr = r - mean_right;
        sxy += dl * dr;
        sxx += dl * dl;
        syy += dr * dr;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
