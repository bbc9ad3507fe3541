use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::Period;

/// Aggregation of a card's charges for one billing period.
///
/// Keyed uniquely by `(card_id, period)`. The lifecycle is strictly forward:
/// `Open -> Closed -> Paid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditCardInvoice {
    pub id: Uuid,
    pub card_id: Uuid,
    pub period: Period,
    pub status: InvoiceStatus,
    /// Cached sum of the invoice's charge amounts, recomputed after every
    /// charge mutation.
    pub total_amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CreditCardInvoice {
    pub fn open(card_id: Uuid, period: Period, due_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id,
            period,
            status: InvoiceStatus::Open,
            total_amount: Decimal::ZERO,
            due_date,
            closed_at: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self.status, InvoiceStatus::Paid)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvoiceStatus {
    Open,
    Closed,
    Paid,
}

/// One line item on an invoice. Refund amounts are stored negative so the
/// invoice total is a plain sum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditCardCharge {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub kind: ChargeKind,
    pub purchased_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<Uuid>,
    /// Stable key used to de-duplicate statement imports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChargeKind {
    Purchase,
    Refund,
}

/// Reconciliation record created when an invoice is paid. At most one per
/// invoice; `entry_id` points at the card-payment ledger entry it produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoicePayment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub account_id: Uuid,
    pub paid_at: DateTime<Utc>,
    pub entry_id: Uuid,
}
