use thiserror::Error;

/// Failures that stop a workbook or CSV pair from becoming a dataset.
///
/// Any of these halts processing: no derived tables are produced and nothing
/// is rendered.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to open workbook")]
    Workbook(#[source] calamine::Error),
    #[error("sheet '{sheet}' not found (available sheets: {available})")]
    MissingSheet { sheet: String, available: String },
    #[error("sheet '{sheet}' could not be read")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("table '{0}' has no header row")]
    MissingHeader(String),
    #[error("table '{table}' has no '{column}' column to join on")]
    MissingJoinColumn { table: String, column: String },
}
