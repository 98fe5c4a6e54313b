use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ExportArgs, dataset::View, io_utils};

/// Default file name for a filtered extract.
pub const EXPORT_FILE_NAME: &str = "student_performance.csv";
/// Media type of the extract.
pub const EXPORT_MEDIA_TYPE: &str = "text/csv";

pub fn execute(args: &ExportArgs) -> Result<()> {
    let (dataset, filters) = crate::load_filtered(&args.source, &args.filters)?;
    let view = filters.apply(&dataset);
    let rows = export_to_path(&view, &args.output)?;
    info!(
        "Exported {} of {} row(s) to {:?} ({})",
        rows,
        dataset.len(),
        args.output,
        EXPORT_MEDIA_TYPE
    );
    Ok(())
}

/// Writes the header row and every row of `view`; returns the data row count.
///
/// Numbers use their shortest round-trip form; missing values are empty cells.
pub fn write_view<W: Write>(view: &View<'_>, writer: &mut csv::Writer<W>) -> Result<usize> {
    writer
        .write_record(view.dataset().headers())
        .context("Writing export headers")?;
    let rows = view.display_rows();
    for row in &rows {
        writer.write_record(row).context("Writing export row")?;
    }
    writer.flush().context("Flushing export output")?;
    Ok(rows.len())
}

pub fn export_to_path(view: &View<'_>, path: &Path) -> Result<usize> {
    let mut writer = io_utils::open_csv_writer(path)?;
    write_view(view, &mut writer).with_context(|| format!("Exporting to {path:?}"))
}

/// The extract as UTF-8 bytes, ready to hand to a download.
pub fn to_csv_bytes(view: &View<'_>) -> Result<Vec<u8>> {
    let mut writer = io_utils::csv_writer(Vec::new());
    write_view(view, &mut writer)?;
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Finishing export buffer: {}", err.error()))
}
