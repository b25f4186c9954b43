use std::fmt;

/// Every failure the loading, aggregation and pagination pipeline can report.
#[derive(Debug)]
pub enum TripError {
    IoError(std::io::Error),
    ParsingError(String),
    /// The city identifier or its file could not be resolved.
    SourceNotFound(String),
    /// A source is missing required columns or has cells that don't parse.
    SourceFormat(String),
    /// Aggregation over a table (or column) with no values; carries the column name.
    EmptyTable(String),
    UnknownColumn(String),
    /// A column that exists in general but not in this table's schema.
    InvalidColumn(String),
    InvalidBatchSize(usize),
    Msg(String),
}

impl fmt::Display for TripError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TripError::IoError(err) => write!(f, "I/O error: {err}"),
            TripError::ParsingError(msg) => write!(f, "parsing error: {msg}"),
            TripError::SourceNotFound(msg) => write!(f, "no data source for {msg}"),
            TripError::SourceFormat(msg) => write!(f, "malformed source: {msg}"),
            TripError::EmptyTable(column) => {
                write!(f, "no values to aggregate in column '{column}'")
            }
            TripError::UnknownColumn(name) => write!(f, "unknown column '{name}'"),
            TripError::InvalidColumn(name) => {
                write!(f, "column '{name}' is not available for this table")
            }
            TripError::InvalidBatchSize(size) => {
                write!(f, "batch size must be a positive integer, got {size}")
            }
            TripError::Msg(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for TripError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TripError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TripError {
    fn from(err: std::io::Error) -> Self {
        TripError::IoError(err)
    }
}

impl From<csv::Error> for TripError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io_err) => TripError::IoError(io_err),
                other => TripError::SourceFormat(format!("{other:?}")),
            }
        } else {
            TripError::SourceFormat(err.to_string())
        }
    }
}

macro_rules! source_format_error {
    ($($arg:tt)*) => {
        $crate::error::TripError::SourceFormat(format!($($arg)*))
    };
}

pub(crate) use source_format_error;
