use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A credit card whose monthly charges are aggregated into invoices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditCard {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    /// Last four digits printed on the card, matched against statement files.
    pub last4: String,
    /// Day of month the invoice closes.
    pub closing_day: u32,
    /// Day of month the invoice is due, clamped to 28 when computing due dates.
    pub due_day: u32,
    pub status: CardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_account_id: Option<Uuid>,
}

impl CreditCard {
    pub fn new(
        name: impl Into<String>,
        brand: impl Into<String>,
        last4: impl Into<String>,
        closing_day: u32,
        due_day: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            brand: brand.into(),
            last4: last4.into(),
            closing_day,
            due_day,
            status: CardStatus::Active,
            default_account_id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, CardStatus::Active)
    }
}

/// Cards are deactivated, never deleted, so history stays referable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CardStatus {
    Active,
    Inactive,
}
