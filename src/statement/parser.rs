use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use super::{Cell, Row, StatementError};

/// A statement needs at least the title, card, and holder rows, a header row,
/// and one charge row.
pub const MIN_ROWS: usize = 5;

/// How many leading rows are scanned for the charge header.
const HEADER_SCAN_ROWS: usize = 10;

/// Row index (0-based) holding the card identification.
const CARD_ROW: usize = 1;
/// Row index (0-based) holding the holder name.
const HOLDER_ROW: usize = 2;
/// Column index of the holder name within its row.
const HOLDER_COLUMN: usize = 1;

static CARD_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid regex"));

/// A single accepted charge row. `amount` is the absolute local-currency
/// value; `refund` records whether the original amount was negative, so the
/// caller can derive the charge kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCharge {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub secondary_amount: Option<Decimal>,
    pub refund: bool,
}

/// Normalized result of parsing one card section of a statement file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub card_last4: String,
    pub holder_name: String,
    pub charges: Vec<ParsedCharge>,
    /// Signed sum of the accepted local-currency amounts.
    pub total_amount: Decimal,
}

/// Parses a decoded statement grid into the card identity and its charges.
///
/// Structural anomalies (missing identification rows, no header, zero
/// accepted charges) are hard errors; individually malformed charge rows
/// (unparseable date, blank description, zero amount) are skipped.
pub fn parse(rows: &[Row]) -> Result<ParsedStatement, StatementError> {
    if rows.len() < MIN_ROWS {
        return Err(StatementError::TooShort(rows.len()));
    }

    let card_last4 = extract_card_last4(&rows[CARD_ROW])?;
    let holder_name = extract_holder(&rows[HOLDER_ROW])?;
    let first_charge_row = find_header(rows)? + 1;

    let mut charges = Vec::new();
    let mut total_amount = Decimal::ZERO;

    for row in &rows[first_charge_row..] {
        if is_sentinel(row) {
            break;
        }
        let Some(date) = parse_date(row.first()) else {
            continue;
        };
        let Some(description) = parse_description(row.get(1)) else {
            continue;
        };
        let secondary_amount = row.get(2).and_then(parse_amount);
        let Some(signed) = row.get(3).and_then(parse_amount) else {
            continue;
        };
        if signed.is_zero() {
            continue;
        }
        total_amount += signed;
        charges.push(ParsedCharge {
            date,
            description,
            amount: signed.abs(),
            secondary_amount: secondary_amount.map(|value| value.abs()),
            refund: signed.is_sign_negative(),
        });
    }

    if charges.is_empty() {
        return Err(StatementError::NoCharges);
    }

    Ok(ParsedStatement {
        card_last4,
        holder_name,
        charges,
        total_amount,
    })
}

fn extract_card_last4(row: &Row) -> Result<String, StatementError> {
    for cell in row {
        let rendered = match cell {
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => value.normalize().to_string(),
            _ => continue,
        };
        if let Some(found) = CARD_DIGITS.find(&rendered) {
            return Ok(found.as_str().to_string());
        }
    }
    Err(StatementError::CardDigitsNotFound)
}

fn extract_holder(row: &Row) -> Result<String, StatementError> {
    row.get(HOLDER_COLUMN)
        .and_then(Cell::text)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or(StatementError::HolderMissing)
}

/// Finds the header row by its first two column labels and returns its index.
fn find_header(rows: &[Row]) -> Result<usize, StatementError> {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            matches_label(row.first(), &["data", "date"])
                && matches_label(row.get(1), &["descrição", "descricao", "description"])
        })
        .ok_or(StatementError::HeaderNotFound)
}

fn matches_label(cell: Option<&Cell>, labels: &[&str]) -> bool {
    cell.and_then(Cell::text)
        .map(|text| {
            let text = text.trim().to_lowercase();
            labels.iter().any(|label| text == *label)
        })
        .unwrap_or(false)
}

/// A sentinel ends the charge-row run: an empty row, a subtotal row, or the
/// start of another card section.
fn is_sentinel(row: &Row) -> bool {
    if row.iter().all(Cell::is_empty) {
        return true;
    }
    row.iter().filter_map(Cell::text).any(|text| {
        let text = text.trim().to_lowercase();
        text.starts_with("subtotal")
            || text.starts_with("cartão")
            || text.starts_with("cartao")
    })
}

fn parse_date(cell: Option<&Cell>) -> Option<NaiveDate> {
    match cell? {
        Cell::Date(date) => Some(*date),
        Cell::Text(value) => {
            let value = value.trim();
            NaiveDate::parse_from_str(value, "%d/%m/%Y")
                .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
                .or_else(|_| NaiveDate::parse_from_str(value, "%d-%m-%Y"))
                .ok()
        }
        _ => None,
    }
}

fn parse_description(cell: Option<&Cell>) -> Option<String> {
    cell.and_then(Cell::text)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Parses a monetary cell, stripping currency symbols and normalizing the
/// `1.234,56` decimal-comma convention.
fn parse_amount(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Number(value) => Some(*value),
        Cell::Text(value) => {
            let mut cleaned: String = value
                .chars()
                .filter(|ch| ch.is_ascii_digit() || matches!(ch, '-' | ',' | '.'))
                .collect();
            if cleaned.contains(',') {
                cleaned = cleaned.replace('.', "").replace(',', ".");
            }
            if cleaned.is_empty() || cleaned == "-" {
                return None;
            }
            cleaned.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            vec![text("Lançamentos")],
            vec![text("Cartão"), text("Final 3415")],
            vec![text("Titular"), text("Jane Doe")],
            vec![
                text("Data"),
                text("Descrição"),
                text("Valor(US$)"),
                text("Valor(R$)"),
            ],
            vec![
                text("01/01/2026"),
                text("Store A"),
                Cell::Number(dec!(10)),
                Cell::Number(dec!(50)),
            ],
            vec![text("Subtotal")],
        ]
    }

    #[test]
    fn parses_reference_statement() {
        let parsed = parse(&sample_rows()).unwrap();
        assert_eq!(parsed.card_last4, "3415");
        assert_eq!(parsed.holder_name, "Jane Doe");
        assert_eq!(parsed.charges.len(), 1);
        assert_eq!(parsed.charges[0].amount, dec!(50));
        assert_eq!(parsed.charges[0].secondary_amount, Some(dec!(10)));
        assert!(!parsed.charges[0].refund);
        assert_eq!(parsed.total_amount, dec!(50));
    }

    #[test]
    fn too_few_rows_is_structural_error() {
        let rows = sample_rows()[..4].to_vec();
        assert_eq!(parse(&rows), Err(StatementError::TooShort(4)));
    }

    #[test]
    fn missing_card_digits_is_fatal() {
        let mut rows = sample_rows();
        rows[1] = vec![text("Cartão"), text("Final ????")];
        assert_eq!(parse(&rows), Err(StatementError::CardDigitsNotFound));
    }

    #[test]
    fn blank_holder_is_fatal() {
        let mut rows = sample_rows();
        rows[2] = vec![text("Titular"), text("   ")];
        assert_eq!(parse(&rows), Err(StatementError::HolderMissing));
    }

    #[test]
    fn missing_header_is_fatal() {
        let mut rows = sample_rows();
        rows[3] = vec![text("Dia"), text("Loja")];
        assert_eq!(parse(&rows), Err(StatementError::HeaderNotFound));
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let mut rows = sample_rows();
        rows.insert(
            5,
            vec![
                text("not a date"),
                text("Store B"),
                Cell::Empty,
                Cell::Number(dec!(30)),
            ],
        );
        rows.insert(
            5,
            vec![text("02/01/2026"), text(""), Cell::Empty, Cell::Number(dec!(30))],
        );
        rows.insert(
            5,
            vec![
                text("02/01/2026"),
                text("Zero charge"),
                Cell::Empty,
                Cell::Number(dec!(0)),
            ],
        );
        let parsed = parse(&rows).unwrap();
        assert_eq!(parsed.charges.len(), 1);
        assert_eq!(parsed.total_amount, dec!(50));
    }

    #[test]
    fn all_rows_skipped_means_no_charges() {
        let mut rows = sample_rows();
        rows[4] = vec![
            text("not a date"),
            text("Store A"),
            Cell::Empty,
            Cell::Number(dec!(50)),
        ];
        assert_eq!(parse(&rows), Err(StatementError::NoCharges));
    }

    #[test]
    fn refunds_keep_sign_in_total_but_abs_amount() {
        let mut rows = sample_rows();
        rows.insert(
            5,
            vec![
                text("05/01/2026"),
                text("Store refund"),
                Cell::Empty,
                text("-R$ 20,00"),
            ],
        );
        let parsed = parse(&rows).unwrap();
        assert_eq!(parsed.charges.len(), 2);
        let refund = &parsed.charges[1];
        assert!(refund.refund);
        assert_eq!(refund.amount, dec!(20.00));
        assert_eq!(parsed.total_amount, dec!(30.00));
    }

    #[test]
    fn stops_at_new_card_section() {
        let mut rows = sample_rows();
        rows[5] = vec![text("Cartão"), text("Final 9001")];
        rows.push(vec![
            text("09/01/2026"),
            text("Other card store"),
            Cell::Empty,
            Cell::Number(dec!(99)),
        ]);
        let parsed = parse(&rows).unwrap();
        assert_eq!(parsed.charges.len(), 1);
        assert_eq!(parsed.card_last4, "3415");
    }

    #[test]
    fn normalizes_brazilian_amount_formats() {
        assert_eq!(parse_amount(&text("R$ 1.234,56")), Some(dec!(1234.56)));
        assert_eq!(parse_amount(&text("US$ 10.25")), Some(dec!(10.25)));
        assert_eq!(parse_amount(&text("-R$ 20,00")), Some(dec!(-20.00)));
        assert_eq!(parse_amount(&text("")), None);
    }

    #[test]
    fn parses_textual_and_native_dates() {
        assert_eq!(
            parse_date(Some(&text("31/01/2026"))),
            NaiveDate::from_ymd_opt(2026, 1, 31)
        );
        assert_eq!(
            parse_date(Some(&text("2026-01-31"))),
            NaiveDate::from_ymd_opt(2026, 1, 31)
        );
        assert_eq!(parse_date(Some(&text("31/13/2026"))), None);
    }
}
