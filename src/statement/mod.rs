//! Statement-file parsing: a pure function over a decoded 2-D grid of typed
//! cells, plus the decoder trait that produces the grid from raw bytes.

pub mod decoder;
pub mod parser;

pub use decoder::{CsvStatementDecoder, StatementDecoder};
pub use parser::{parse, ParsedCharge, ParsedStatement};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// One cell of the decoded statement grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    pub fn text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }
}

pub type Row = Vec<Cell>;

/// Structural failures while decoding or parsing a statement file.
/// Individually malformed charge rows are skipped, not raised; only a
/// zero-charge result is an error.
#[derive(Debug, Error, PartialEq)]
pub enum StatementError {
    #[error("statement has {0} rows; at least {min} are required", min = parser::MIN_ROWS)]
    TooShort(usize),
    #[error("card digits not found in the card identification row")]
    CardDigitsNotFound,
    #[error("holder name is missing")]
    HolderMissing,
    #[error("charge header row not found")]
    HeaderNotFound,
    #[error("no charges found in statement")]
    NoCharges,
    #[error("statement is for card ending {found}, not {expected}")]
    CardMismatch { expected: String, found: String },
    #[error("failed to decode statement file: {0}")]
    Decode(String),
}
