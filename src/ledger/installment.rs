use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::Period;

/// A purchase split into N dated ledger entries across consecutive periods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallmentPlan {
    pub id: Uuid,
    pub description: String,
    pub total_amount: Decimal,
    pub installment_count: u32,
    pub start_period: Period,
}

impl InstallmentPlan {
    pub fn new(
        description: impl Into<String>,
        total_amount: Decimal,
        installment_count: u32,
        start_period: Period,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            total_amount,
            installment_count,
            start_period,
        }
    }
}

/// One slice of an installment plan. Maps to exactly one ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Installment {
    pub id: Uuid,
    pub plan_id: Uuid,
    /// 1-based position within the plan.
    pub number: u32,
    pub period: Period,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub entry_id: Uuid,
}
