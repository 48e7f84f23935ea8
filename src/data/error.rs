use thiserror::Error;

// ---------------------------------------------------------------------------
// Fatal schema errors
// ---------------------------------------------------------------------------

/// A table whose layout cannot be mapped onto the tidy schema.
/// These stop the whole load and are shown to the user verbatim.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("{table}: no year columns (1700–2100) found. Detected columns: {headers:?}")]
    NoYearColumns { table: String, headers: Vec<String> },

    #[error("{table}: could not find a year column. Detected columns: {headers:?}")]
    MissingYearColumn { table: String, headers: Vec<String> },

    #[error("{table}: could not find a '{wanted}' column. Detected columns: {headers:?}")]
    MissingColumn {
        table: String,
        wanted: String,
        headers: Vec<String>,
    },

    #[error("{table}: table has no columns")]
    NoColumns { table: String },

    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("{table}: column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType {
        table: String,
        column: String,
        data_type: String,
    },
}

// ---------------------------------------------------------------------------
// Non-fatal: empty results and unavailable statistics
// ---------------------------------------------------------------------------

/// Why a derived chart or statistic cannot be shown. Rendered as an
/// informational placeholder, never as a number.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Unavailable {
    #[error("No data for {0} in the selected window.")]
    Empty(String),

    #[error("No overlapping years between {left} and {right} in the selected window.")]
    NoOverlap { left: String, right: String },

    #[error("Need at least 2 overlapping years between {left} and {right} (found {found}).")]
    TooFewPoints {
        left: String,
        right: String,
        found: usize,
    },

    #[error("{0} is constant over the selected window, so the statistic is undefined.")]
    Constant(String),

    #[error("No year range is shared by every loaded series.")]
    NoCommonYears,
}
