pub mod chart;
pub mod cli;
pub mod data;
pub mod dataset;
pub mod derive;
pub mod error;
pub mod export;
pub mod filter;
pub mod grade;
pub mod io_utils;
pub mod join;
pub mod profile;
pub mod report;
pub mod schema;
pub mod stats;
pub mod table;
pub mod workbook;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, FacetsArgs, FilterArgs, SourceArgs},
    data::format_number,
    dataset::Dataset,
    filter::{Facets, FilterSet},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("student_performance", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => report::execute(&args),
        Commands::Stats(args) => stats::execute(&args),
        Commands::Top(args) => report::execute_top(&args),
        Commands::Export(args) => export::execute(&args),
        Commands::Chart(args) => chart::execute(&args),
        Commands::Profile(args) => profile::execute(&args),
        Commands::Facets(args) => handle_facets(&args),
    }
}

pub(crate) fn load_dataset(args: &SourceArgs) -> Result<Dataset> {
    let source = args.to_source()?;
    info!("Loading {source}");
    let dataset = Dataset::load(&source).with_context(|| format!("Loading {source}"))?;
    info!(
        "Loaded {} student row(s) with {} score column(s)",
        dataset.len(),
        dataset.score_columns().len()
    );
    Ok(dataset)
}

/// Loads the dataset and resolves the filter flags against it.
pub(crate) fn load_filtered(
    source: &SourceArgs,
    filters: &FilterArgs,
) -> Result<(Dataset, FilterSet)> {
    let dataset = load_dataset(source)?;
    let preset = filters.to_preset()?;
    debug!("Filter preset: {:?}", preset);
    let filters = preset.resolve(&dataset);
    Ok((dataset, filters))
}

fn handle_facets(args: &FacetsArgs) -> Result<()> {
    let dataset = load_dataset(&args.source)?;
    let facets = Facets::from_dataset(&dataset);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&facets)?);
    } else {
        match &facets.average_range {
            Some(range) => println!(
                "Average range: {} to {}",
                format_number(range.min),
                format_number(range.max)
            ),
            None => println!("Average range: none"),
        }
        println!("Grades: {}", facets.grades.iter().join(", "));
        println!("Students: {}", facets.students.iter().join(", "));
    }
    info!(
        "Listed facets for {} student(s) and {} grade(s)",
        facets.students.len(),
        facets.grades.len()
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
