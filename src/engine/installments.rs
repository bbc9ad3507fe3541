use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::errors::{EngineError, Result};
use crate::ledger::{
    period::shift_month, EntryKind, Installment, InstallmentPlan, LedgerEntry, Period, Workspace,
};

/// Minimal currency unit: two decimal places.
const CURRENCY_SCALE: u32 = 2;

/// Request to split one purchase into dated installment entries.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub description: String,
    pub amount: Decimal,
    pub count: u32,
    pub start_date: NaiveDate,
    pub kind: EntryKind,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub person_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
}

impl SplitRequest {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        count: u32,
        start_date: NaiveDate,
        kind: EntryKind,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            count,
            start_date,
            kind,
            category_id: None,
            account_id: None,
            person_id: None,
            card_id: None,
        }
    }
}

/// What a split produced: a single plain entry, or a plan with its entries.
#[derive(Debug, Clone)]
pub enum SplitOutcome {
    Single { entry_id: Uuid },
    Plan { plan_id: Uuid, entry_ids: Vec<Uuid> },
}

/// Expands one purchase into N dated ledger entries across consecutive
/// periods.
pub struct InstallmentService;

impl InstallmentService {
    /// Splits `request.amount` over `request.count` monthly installments.
    ///
    /// A count of one degenerates to a single ordinary entry with no plan.
    /// For larger counts every row (plan, installments, entries) is staged
    /// locally and appended in one pass, so a validation failure leaves the
    /// workspace untouched.
    ///
    /// Each installment is `amount / count` rounded to the currency scale;
    /// the last installment absorbs the rounding remainder so the plan total
    /// always equals the purchase amount exactly.
    pub fn split(workspace: &mut Workspace, request: SplitRequest) -> Result<SplitOutcome> {
        Self::validate(workspace, &request)?;

        if request.count == 1 {
            let entry = Self::build_entry(&request, request.description.clone(), request.amount, 0);
            let entry_id = workspace.add_entry(entry);
            return Ok(SplitOutcome::Single { entry_id });
        }

        let plan = InstallmentPlan::new(
            request.description.clone(),
            request.amount,
            request.count,
            Period::from_date(request.start_date),
        );

        let per_installment = (request.amount / Decimal::from(request.count))
            .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        let mut entries = Vec::with_capacity(request.count as usize);
        let mut installments = Vec::with_capacity(request.count as usize);

        for index in 0..request.count {
            let number = index + 1;
            let amount = if number == request.count {
                request.amount - per_installment * Decimal::from(request.count - 1)
            } else {
                per_installment
            };
            let description = format!("{} ({}/{})", request.description, number, request.count);
            let mut entry = Self::build_entry(&request, description, amount, index as i32);
            entry.installment_plan_id = Some(plan.id);
            installments.push(Installment {
                id: Uuid::new_v4(),
                plan_id: plan.id,
                number,
                period: entry.competence,
                due_date: entry.date,
                amount,
                entry_id: entry.id,
            });
            entries.push(entry);
        }

        let plan_id = plan.id;
        let entry_ids = entries.iter().map(|entry| entry.id).collect();
        workspace.installment_plans.push(plan);
        workspace.installments.extend(installments);
        workspace.entries.extend(entries);
        workspace.touch();

        Ok(SplitOutcome::Plan { plan_id, entry_ids })
    }

    fn build_entry(
        request: &SplitRequest,
        description: String,
        amount: Decimal,
        month_offset: i32,
    ) -> LedgerEntry {
        let date = shift_month(request.start_date, month_offset);
        let mut entry = LedgerEntry::new(description, amount, request.kind, date);
        entry.category_id = request.category_id;
        entry.account_id = request.account_id;
        entry.person_id = request.person_id;
        entry.card_id = request.card_id;
        entry
    }

    fn validate(workspace: &Workspace, request: &SplitRequest) -> Result<()> {
        if request.count == 0 {
            return Err(EngineError::Validation(
                "installment count must be at least 1".into(),
            ));
        }
        if request.amount.is_zero() {
            return Err(EngineError::Validation("amount must be non-zero".into()));
        }
        if request.description.trim().is_empty() {
            return Err(EngineError::Validation("description is required".into()));
        }
        if let Some(category_id) = request.category_id {
            if workspace.category(category_id).is_none() {
                return Err(EngineError::CategoryNotFound(category_id.to_string()));
            }
        }
        if let Some(account_id) = request.account_id {
            if workspace.account(account_id).is_none() {
                return Err(EngineError::AccountNotFound(account_id.to_string()));
            }
        }
        if let Some(card_id) = request.card_id {
            if workspace.card(card_id).is_none() {
                return Err(EngineError::CardNotFound(card_id.to_string()));
            }
        }
        Ok(())
    }
}
