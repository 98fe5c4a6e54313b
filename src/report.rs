use std::fmt::Write as _;

use anyhow::Result;
use log::info;

use crate::{
    cli::{ReportArgs, TopArgs},
    data::format_number,
    dataset::{AVERAGE_COLUMN, Dataset, GRADE_COLUMN, StudentRecord, TOTAL_COLUMN, View},
    export, stats, table,
};

pub const DEFAULT_TOP_N: usize = 5;

pub fn execute(args: &ReportArgs) -> Result<()> {
    let (dataset, filters) = crate::load_filtered(&args.source, &args.filters)?;
    let view = filters.apply(&dataset);
    print!("{}", render_report(&view, args.top));
    if let Some(path) = &args.output {
        let rows = export::export_to_path(&view, path)?;
        info!("Wrote {} filtered row(s) to {:?}", rows, path);
    }
    info!(
        "Reported on {} of {} student row(s)",
        view.len(),
        dataset.len()
    );
    Ok(())
}

pub fn execute_top(args: &TopArgs) -> Result<()> {
    let (dataset, filters) = crate::load_filtered(&args.source, &args.filters)?;
    let view = filters.apply(&dataset);
    let (headers, rows) = top_table(&view, args.count);
    table::print_table(&headers, &rows);
    info!("Ranked top {} of {} row(s) by Total", rows.len(), view.len());
    Ok(())
}

/// Filtered rows, their summary statistics, and the top performers.
pub fn render_report(view: &View<'_>, top: usize) -> String {
    let dataset = view.dataset();
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Filtered dataset ({} of {} rows)",
        view.len(),
        dataset.len()
    );
    output.push_str(&table::render_table(&dataset.headers(), &view.display_rows()));

    let _ = writeln!(output, "\nSummary statistics");
    output.push_str(&table::render_table(
        &stats::summary_headers(),
        &stats::render_rows(&stats::summarize(view)),
    ));

    let _ = writeln!(output, "\nTop {top} students by {TOTAL_COLUMN}");
    let (headers, rows) = top_table(view, top);
    output.push_str(&table::render_table(&headers, &rows));
    output
}

/// Rows of `view` by Total, highest first; ties keep their original order.
pub fn ranked<'a>(view: &View<'a>) -> Vec<&'a StudentRecord> {
    let mut records = view.records().collect::<Vec<_>>();
    records.sort_by(|a, b| b.total.total_cmp(&a.total));
    records
}

pub fn top_n<'a>(view: &View<'a>, n: usize) -> Vec<&'a StudentRecord> {
    let mut records = ranked(view);
    records.truncate(n);
    records
}

pub fn top_table(view: &View<'_>, n: usize) -> (Vec<String>, Vec<Vec<String>>) {
    (top_headers(view.dataset()), top_n(view, n).into_iter().map(top_row).collect())
}

fn top_headers(dataset: &Dataset) -> Vec<String> {
    vec![
        dataset.name_column().to_string(),
        TOTAL_COLUMN.to_string(),
        AVERAGE_COLUMN.to_string(),
        GRADE_COLUMN.to_string(),
    ]
}

fn top_row(record: &StudentRecord) -> Vec<String> {
    vec![
        record.name.clone(),
        format_number(record.total),
        format_number(record.average),
        record.grade.to_string(),
    ]
}
