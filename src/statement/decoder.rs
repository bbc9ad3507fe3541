use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{Cell, Row, StatementError};

/// Converts a raw statement file into the typed 2-D grid the parser consumes.
/// Implementations own all byte-level concerns; the parser never sees bytes.
pub trait StatementDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Row>, StatementError>;
}

/// Decoder for delimited-text statement exports. Cells are typed by
/// inference: date, then number, then text.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvStatementDecoder;

impl StatementDecoder for CsvStatementDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Row>, StatementError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| StatementError::Decode(err.to_string()))?;
            rows.push(record.iter().map(infer_cell).collect());
        }
        Ok(rows)
    }
}

fn infer_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
        return Cell::Date(date);
    }
    if let Ok(number) = trimmed.parse::<Decimal>() {
        return Cell::Number(number);
    }
    Cell::Text(trimmed.to_string())
}
