use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ledger_core::engine::LedgerEngine;
use ledger_core::ledger::{Account, ChargeKind, CreditCard, InvoiceStatus, Period, Workspace};
use ledger_core::statement::{CsvStatementDecoder, StatementError};
use ledger_core::{EngineError, FixedClock};
use rust_decimal_macros::dec;
use uuid::Uuid;

const STATEMENT: &str = "\
Lançamentos
Cartão,Final 3415
Titular,Jane Doe
Data,Descrição,Valor(US$),Valor(R$)
01/01/2026,Store A,10,50
Subtotal
";

fn engine() -> LedgerEngine {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap());
    LedgerEngine::new(Arc::new(clock), Box::new(CsvStatementDecoder))
}

fn workspace_with_card(last4: &str) -> (Workspace, Uuid) {
    let mut workspace = Workspace::new("home");
    let account_id = workspace.add_account(Account::new("Checking"));
    let mut card = CreditCard::new("Platinum", "Visa", last4, 25, 5);
    card.default_account_id = Some(account_id);
    let card_id = workspace.add_card(card);
    (workspace, card_id)
}

#[test]
fn upload_imports_charges_and_closes_the_invoice() {
    let engine = engine();
    let (mut workspace, card_id) = workspace_with_card("3415");
    let period = Period::new(2026, 1).unwrap();

    let import = engine
        .upload_statement(&mut workspace, card_id, period, STATEMENT.as_bytes())
        .unwrap();

    assert_eq!(import.created.len(), 1);
    assert_eq!(import.duplicates, 0);
    let invoice = workspace.invoice(import.invoice_id).unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Closed);
    assert_eq!(invoice.total_amount, dec!(50));

    let charge = workspace.charge(import.created[0]).unwrap();
    assert_eq!(charge.description, "Store A");
    assert_eq!(charge.amount, dec!(50));
    assert_eq!(charge.kind, ChargeKind::Purchase);
    assert!(charge.external_ref.is_some());
}

#[test]
fn reuploading_the_same_file_is_idempotent() {
    let engine = engine();
    let (mut workspace, card_id) = workspace_with_card("3415");
    let period = Period::new(2026, 1).unwrap();

    let first = engine
        .upload_statement(&mut workspace, card_id, period, STATEMENT.as_bytes())
        .unwrap();
    let second = engine
        .upload_statement(&mut workspace, card_id, period, STATEMENT.as_bytes())
        .unwrap();

    assert_eq!(first.created.len(), 1);
    assert!(second.created.is_empty());
    assert_eq!(second.duplicates, 1);
    assert_eq!(workspace.invoice(first.invoice_id).unwrap().total_amount, dec!(50));
}

#[test]
fn card_mismatch_commits_nothing() {
    let engine = engine();
    let (mut workspace, card_id) = workspace_with_card("9999");
    let period = Period::new(2026, 1).unwrap();

    let err = engine
        .upload_statement(&mut workspace, card_id, period, STATEMENT.as_bytes())
        .unwrap_err();
    match err {
        EngineError::Statement(StatementError::CardMismatch { expected, found }) => {
            assert_eq!(expected, "9999");
            assert_eq!(found, "3415");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(workspace.charges.is_empty());
    assert!(workspace.invoices.is_empty());
}

#[test]
fn refund_rows_become_refund_charges() {
    let engine = engine();
    let (mut workspace, card_id) = workspace_with_card("3415");
    let statement = "\
Lançamentos
Cartão,Final 3415
Titular,Jane Doe
Data,Descrição,Valor(US$),Valor(R$)
01/01/2026,Store A,10,50
05/01/2026,Store A estorno,,\"-R$ 20,00\"
Subtotal
";

    let import = engine
        .upload_statement(
            &mut workspace,
            card_id,
            Period::new(2026, 1).unwrap(),
            statement.as_bytes(),
        )
        .unwrap();

    assert_eq!(import.created.len(), 2);
    let refund = workspace.charge(import.created[1]).unwrap();
    assert_eq!(refund.kind, ChargeKind::Refund);
    assert_eq!(refund.amount, dec!(-20.00));
    assert_eq!(
        workspace.invoice(import.invoice_id).unwrap().total_amount,
        dec!(30.00)
    );
}

#[test]
fn structurally_broken_file_is_a_statement_error() {
    let engine = engine();
    let (mut workspace, card_id) = workspace_with_card("3415");
    let period = Period::new(2026, 1).unwrap();

    let err = engine
        .upload_statement(&mut workspace, card_id, period, b"only,one,row\n")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Statement(StatementError::TooShort(_))
    ));
}
