//! Errors raised while building a model or running one of the algorithms on it.
use thiserror::Error;

/// The two probability tables of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Transition,
    Emission,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::Transition => write!(f, "transition"),
            Table::Emission => write!(f, "emission"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HmmError {
    /// A table, a sequence, or a path does not fit the declared states/alphabet.
    #[error("shape mismatch: {0}")]
    Shape(String),
    /// A row of a table does not sum up to one.
    #[error("row `{row}` of the {table} table sums to {sum}, not 1")]
    Normalization { table: Table, row: String, sum: f64 },
    #[error("invalid probability {value} at ({row}, {column}) of the {table} table")]
    Probability {
        table: Table,
        row: String,
        column: String,
        value: f64,
    },
    /// Some normalizer became exactly zero during re-estimation.
    #[error("degenerate model: {0}")]
    DegenerateModel(String),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HmmError>;
