use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::Period;

/// A single posted financial movement in a workspace's transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub date: NaiveDate,
    /// Budget month this entry is attributed to, independent of `date`.
    pub competence: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_plan_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_rule_id: Option<Uuid>,
}

impl LedgerEntry {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        kind: EntryKind,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            kind,
            status: EntryStatus::Pending,
            date,
            competence: Period::from_date(date),
            category_id: None,
            account_id: None,
            person_id: None,
            card_id: None,
            installment_plan_id: None,
            recurring_rule_id: None,
        }
    }

    pub fn with_competence(mut self, competence: Period) -> Self {
        self.competence = competence;
        self
    }

    /// Card-payment entries settle an invoice and are excluded from ordinary
    /// spend aggregation.
    pub fn counts_toward_spending(&self) -> bool {
        !matches!(self.kind, EntryKind::CardPayment)
    }
}

/// Nature of a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryKind {
    Expense,
    Income,
    CardPayment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Settled,
}
