use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::{cli::StatsArgs, dataset::View, table};

pub const SUMMARY_HEADERS: [&str; 9] = [
    "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
];

pub fn execute(args: &StatsArgs) -> Result<()> {
    let (dataset, filters) = crate::load_filtered(&args.source, &args.filters)?;
    let view = filters.apply(&dataset);
    let summaries = summarize(&view);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        table::print_table(&summary_headers(), &render_rows(&summaries));
    }
    info!(
        "Computed summary statistics for {} column(s) over {} row(s)",
        summaries.len(),
        view.len()
    );
    Ok(())
}

/// Descriptive statistics for one score column; undefined metrics are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

/// One summary per score column over the rows of `view`. Missing scores are not counted.
pub fn summarize(view: &View<'_>) -> Vec<ColumnSummary> {
    let dataset = view.dataset();
    dataset
        .score_columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut stats = ColumnStats::with_column(name.clone());
            for record in view.records() {
                if let Some(Some(score)) = record.scores.get(idx) {
                    stats.add_value(*score);
                }
            }
            stats.summary()
        })
        .collect()
}

pub fn summary_headers() -> Vec<String> {
    SUMMARY_HEADERS.iter().map(|h| h.to_string()).collect()
}

pub fn render_rows(summaries: &[ColumnSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|summary| {
            vec![
                summary.column.clone(),
                summary.count.to_string(),
                format_metric(summary.mean),
                format_metric(summary.std),
                format_metric(summary.min),
                format_metric(summary.q1),
                format_metric(summary.median),
                format_metric(summary.q3),
                format_metric(summary.max),
            ]
        })
        .collect()
}

struct ColumnStats {
    name: String,
    values: Vec<f64>,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnStats {
    fn with_column(name: String) -> Self {
        Self {
            name,
            values: Vec::new(),
            sum: 0.0,
            min: None,
            max: None,
        }
    }

    fn add_value(&mut self, value: f64) {
        self.sum += value;
        self.min = Some(match self.min {
            Some(current) => current.min(value),
            None => value,
        });
        self.max = Some(match self.max {
            Some(current) => current.max(value),
            None => value,
        });
        self.values.push(value);
    }

    fn count(&self) -> usize {
        self.values.len()
    }

    fn mean(&self) -> Option<f64> {
        if self.count() > 0 {
            Some(self.sum / self.count() as f64)
        } else {
            None
        }
    }

    /// Sample standard deviation (n - 1 denominator).
    fn std_dev(&self) -> Option<f64> {
        if self.count() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let squared: f64 = self.values.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((squared / (self.count() as f64 - 1.0)).sqrt())
    }

    fn summary(self) -> ColumnSummary {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        ColumnSummary {
            count: self.count(),
            mean: self.mean(),
            std: self.std_dev(),
            min: self.min,
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: self.max,
            column: self.name,
        }
    }
}

/// Linearly interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn format_metric(metric: Option<f64>) -> String {
    match metric {
        Some(value) if value.is_finite() && value.fract() == 0.0 => format!("{value:.0}"),
        Some(value) if value.is_finite() => format!("{value:.4}"),
        Some(value) => value.to_string(),
        None => String::new(),
    }
}
