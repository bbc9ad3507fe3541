use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::{EngineError, Result};
use crate::ledger::{
    ChargeKind, CreditCardCharge, CreditCardInvoice, EntryKind, EntryStatus, InvoicePayment,
    InvoiceStatus, LedgerEntry, Period, Workspace,
};
use crate::statement::{ParsedStatement, StatementError};

/// Request to append one charge to an invoice. Refund amounts are negative.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub description: String,
    pub amount: Decimal,
    pub kind: ChargeKind,
    pub purchased_at: NaiveDate,
    pub category_id: Option<Uuid>,
    pub person_id: Option<Uuid>,
    pub external_ref: Option<String>,
}

impl ChargeRequest {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        kind: ChargeKind,
        purchased_at: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            kind,
            purchased_at,
            category_id: None,
            person_id: None,
            external_ref: None,
        }
    }
}

/// Partial update of a charge; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ChargeUpdate {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<ChargeKind>,
    pub purchased_at: Option<NaiveDate>,
    pub category_id: Option<Option<Uuid>>,
    pub person_id: Option<Option<Uuid>>,
}

/// Request to settle an invoice. Missing fields fall back to the card's
/// default account, the recomputed total, and the current time.
#[derive(Debug, Clone, Default)]
pub struct PayRequest {
    pub account_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Outcome of paying an invoice.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment_id: Uuid,
    pub entry_id: Uuid,
    pub amount: Decimal,
}

/// One bucket of [`InvoiceService::totals_by_category`].
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// `None` for charges without a category.
    pub category_id: Option<Uuid>,
    pub name: String,
    pub total: Decimal,
}

/// Outcome of importing a parsed statement into an invoice.
#[derive(Debug, Clone)]
pub struct StatementImport {
    pub invoice_id: Uuid,
    pub created: Vec<Uuid>,
    /// Charges skipped because an identical external reference already
    /// exists on the invoice.
    pub duplicates: usize,
}

const UNCATEGORIZED: &str = "Uncategorized";

/// Owns the invoice state machine: charge aggregation, closing, payment.
///
/// All state transitions are strictly forward, `Open -> Closed -> Paid`.
pub struct InvoiceService;

impl InvoiceService {
    /// Idempotent get-or-create of the invoice for `(card, period)`.
    pub fn ensure_invoice(
        workspace: &mut Workspace,
        card_id: Uuid,
        period: Period,
    ) -> Result<Uuid> {
        let card = workspace
            .card(card_id)
            .ok_or_else(|| EngineError::CardNotFound(card_id.to_string()))?;
        if !card.is_active() {
            return Err(EngineError::Validation(format!(
                "card `{}` is inactive",
                card.name
            )));
        }
        if let Some(existing) = workspace.invoice_for(card_id, period) {
            return Ok(existing.id);
        }
        let due_date = period.due_date(card.due_day);
        let invoice = CreditCardInvoice::open(card_id, period, due_date);
        let invoice_id = invoice.id;
        workspace.invoices.push(invoice);
        workspace.touch();
        Ok(invoice_id)
    }

    /// Appends a charge and recomputes the invoice total. Closed invoices
    /// still accept charges; paid invoices do not.
    pub fn create_charge(
        workspace: &mut Workspace,
        invoice_id: Uuid,
        request: ChargeRequest,
    ) -> Result<Uuid> {
        Self::ensure_not_paid(workspace, invoice_id)?;
        Self::validate_charge_refs(workspace, request.category_id, request.person_id)?;
        if request.description.trim().is_empty() {
            return Err(EngineError::Validation("description is required".into()));
        }
        if request.amount.is_zero() {
            return Err(EngineError::Validation("amount must be non-zero".into()));
        }

        let charge = CreditCardCharge {
            id: Uuid::new_v4(),
            invoice_id,
            description: request.description,
            amount: request.amount,
            kind: request.kind,
            purchased_at: request.purchased_at,
            category_id: request.category_id,
            person_id: request.person_id,
            external_ref: request.external_ref,
        };
        let charge_id = charge.id;
        workspace.charges.push(charge);
        Self::recompute_total(workspace, invoice_id)?;
        workspace.touch();
        Ok(charge_id)
    }

    /// Applies a partial update and recomputes the invoice total.
    pub fn update_charge(
        workspace: &mut Workspace,
        charge_id: Uuid,
        update: ChargeUpdate,
    ) -> Result<()> {
        let invoice_id = workspace
            .charge(charge_id)
            .map(|charge| charge.invoice_id)
            .ok_or_else(|| EngineError::ChargeNotFound(charge_id.to_string()))?;
        Self::ensure_not_paid(workspace, invoice_id)?;
        if let Some(Some(category_id)) = update.category_id {
            if workspace.category(category_id).is_none() {
                return Err(EngineError::CategoryNotFound(category_id.to_string()));
            }
        }
        if let Some(amount) = update.amount {
            if amount.is_zero() {
                return Err(EngineError::Validation("amount must be non-zero".into()));
            }
        }

        let charge = workspace
            .charge_mut(charge_id)
            .ok_or_else(|| EngineError::ChargeNotFound(charge_id.to_string()))?;
        if let Some(description) = update.description {
            charge.description = description;
        }
        if let Some(amount) = update.amount {
            charge.amount = amount;
        }
        if let Some(kind) = update.kind {
            charge.kind = kind;
        }
        if let Some(purchased_at) = update.purchased_at {
            charge.purchased_at = purchased_at;
        }
        if let Some(category_id) = update.category_id {
            charge.category_id = category_id;
        }
        if let Some(person_id) = update.person_id {
            charge.person_id = person_id;
        }
        Self::recompute_total(workspace, invoice_id)?;
        workspace.touch();
        Ok(())
    }

    /// Removes a charge and recomputes the invoice total.
    pub fn delete_charge(workspace: &mut Workspace, charge_id: Uuid) -> Result<CreditCardCharge> {
        let invoice_id = workspace
            .charge(charge_id)
            .map(|charge| charge.invoice_id)
            .ok_or_else(|| EngineError::ChargeNotFound(charge_id.to_string()))?;
        Self::ensure_not_paid(workspace, invoice_id)?;
        let removed = workspace
            .remove_charge(charge_id)
            .ok_or_else(|| EngineError::ChargeNotFound(charge_id.to_string()))?;
        Self::recompute_total(workspace, invoice_id)?;
        Ok(removed)
    }

    /// Freezes the invoice for payment. Legal only from `Open`.
    pub fn close_invoice(
        workspace: &mut Workspace,
        invoice_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        Self::recompute_total(workspace, invoice_id)?;
        let invoice = workspace
            .invoice_mut(invoice_id)
            .ok_or_else(|| EngineError::InvoiceNotFound(invoice_id.to_string()))?;
        if invoice.status != InvoiceStatus::Open {
            return Err(EngineError::Conflict(format!(
                "invoice {} cannot be closed from {:?}",
                invoice.period, invoice.status
            )));
        }
        invoice.status = InvoiceStatus::Closed;
        invoice.closed_at = Some(now);
        workspace.touch();
        Ok(())
    }

    /// Settles the invoice: creates the card-payment ledger entry and the
    /// payment record, then marks the invoice `Paid`.
    ///
    /// The no-existing-payment check and the payment creation happen inside
    /// one `&mut` call, so two payment attempts cannot both succeed.
    pub fn pay_invoice(
        workspace: &mut Workspace,
        invoice_id: Uuid,
        request: PayRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome> {
        let invoice = workspace
            .invoice(invoice_id)
            .ok_or_else(|| EngineError::InvoiceNotFound(invoice_id.to_string()))?;
        if invoice.is_paid() {
            return Err(EngineError::Conflict(format!(
                "invoice {} is already paid",
                invoice.period
            )));
        }
        if workspace.payment_of(invoice_id).is_some() {
            return Err(EngineError::Conflict(format!(
                "invoice {} already has a payment",
                invoice.period
            )));
        }

        let card_id = invoice.card_id;
        let period = invoice.period;
        let (card_name, default_account_id) = workspace
            .card(card_id)
            .map(|card| (card.name.clone(), card.default_account_id))
            .ok_or_else(|| EngineError::CardNotFound(card_id.to_string()))?;
        let account_id = request
            .account_id
            .or(default_account_id)
            .ok_or_else(|| {
                EngineError::Validation(
                    "no settlement account given and the card has no default".into(),
                )
            })?;
        if workspace.account(account_id).is_none() {
            return Err(EngineError::AccountNotFound(account_id.to_string()));
        }

        // The stored total must reflect exactly what was charged at
        // settlement time.
        Self::recompute_total(workspace, invoice_id)?;
        let total = workspace
            .invoice(invoice_id)
            .map(|invoice| invoice.total_amount)
            .unwrap_or_default();
        let amount = request.amount.unwrap_or(total);
        let paid_at = request.paid_at.unwrap_or(now);

        // Posted on the payment date but attributed to the billing period.
        let mut entry = LedgerEntry::new(
            format!("{} invoice {}", card_name, period),
            amount,
            EntryKind::CardPayment,
            paid_at.date_naive(),
        )
        .with_competence(period);
        entry.status = EntryStatus::Settled;
        entry.account_id = Some(account_id);
        entry.card_id = Some(card_id);
        let entry_id = workspace.add_entry(entry);

        let payment = InvoicePayment {
            id: Uuid::new_v4(),
            invoice_id,
            amount,
            account_id,
            paid_at,
            entry_id,
        };
        let payment_id = payment.id;
        workspace.payments.push(payment);
        if let Some(invoice) = workspace.invoice_mut(invoice_id) {
            invoice.status = InvoiceStatus::Paid;
        }
        workspace.touch();

        tracing::info!(%invoice_id, %amount, "invoice paid");
        Ok(PaymentOutcome {
            payment_id,
            entry_id,
            amount,
        })
    }

    /// Read-only aggregation of the invoice's charges by category, sorted by
    /// descending total. Uncategorized charges fall into their own bucket.
    pub fn totals_by_category(
        workspace: &Workspace,
        invoice_id: Uuid,
    ) -> Result<Vec<CategoryTotal>> {
        if workspace.invoice(invoice_id).is_none() {
            return Err(EngineError::InvoiceNotFound(invoice_id.to_string()));
        }
        let mut buckets: Vec<CategoryTotal> = Vec::new();
        for charge in workspace.charges_of(invoice_id) {
            let (category_id, name) = match charge.category_id {
                Some(id) => (
                    Some(id),
                    workspace
                        .category(id)
                        .map(|category| category.name.clone())
                        .unwrap_or_else(|| id.to_string()),
                ),
                None => (None, UNCATEGORIZED.to_string()),
            };
            match buckets
                .iter_mut()
                .find(|bucket| bucket.category_id == category_id)
            {
                Some(bucket) => bucket.total += charge.amount,
                None => buckets.push(CategoryTotal {
                    category_id,
                    name,
                    total: charge.amount,
                }),
            }
        }
        buckets.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        Ok(buckets)
    }

    /// Imports a parsed statement into the card's invoice for `period`:
    /// verifies the card identity, creates the non-duplicate charges, and
    /// closes the invoice. Re-importing the same file is idempotent.
    pub fn import_statement(
        workspace: &mut Workspace,
        card_id: Uuid,
        period: Period,
        parsed: &ParsedStatement,
        now: DateTime<Utc>,
    ) -> Result<StatementImport> {
        let card = workspace
            .card(card_id)
            .ok_or_else(|| EngineError::CardNotFound(card_id.to_string()))?;
        if card.last4 != parsed.card_last4 {
            return Err(StatementError::CardMismatch {
                expected: card.last4.clone(),
                found: parsed.card_last4.clone(),
            }
            .into());
        }

        let invoice_id = Self::ensure_invoice(workspace, card_id, period)?;
        Self::ensure_not_paid(workspace, invoice_id)?;

        let mut created = Vec::new();
        let mut duplicates = 0usize;
        for charge in &parsed.charges {
            let external_ref = format!(
                "{}|{}|{}",
                charge.date,
                charge.description.trim().to_lowercase(),
                charge.amount
            );
            let exists = workspace
                .charges_of(invoice_id)
                .any(|existing| existing.external_ref.as_deref() == Some(external_ref.as_str()));
            if exists {
                duplicates += 1;
                continue;
            }
            let (kind, amount) = if charge.refund {
                (ChargeKind::Refund, -charge.amount)
            } else {
                (ChargeKind::Purchase, charge.amount)
            };
            let mut request =
                ChargeRequest::new(charge.description.clone(), amount, kind, charge.date);
            request.external_ref = Some(external_ref);
            created.push(Self::create_charge(workspace, invoice_id, request)?);
        }

        let still_open = workspace
            .invoice(invoice_id)
            .map(|invoice| invoice.status == InvoiceStatus::Open)
            .unwrap_or(false);
        if still_open {
            Self::close_invoice(workspace, invoice_id, now)?;
        }

        tracing::info!(
            %invoice_id,
            imported = created.len(),
            duplicates,
            "statement imported"
        );
        Ok(StatementImport {
            invoice_id,
            created,
            duplicates,
        })
    }

    fn ensure_not_paid(workspace: &Workspace, invoice_id: Uuid) -> Result<()> {
        let invoice = workspace
            .invoice(invoice_id)
            .ok_or_else(|| EngineError::InvoiceNotFound(invoice_id.to_string()))?;
        if invoice.is_paid() {
            return Err(EngineError::Conflict(format!(
                "invoice {} is paid; charges are frozen",
                invoice.period
            )));
        }
        Ok(())
    }

    fn validate_charge_refs(
        workspace: &Workspace,
        category_id: Option<Uuid>,
        person_id: Option<Uuid>,
    ) -> Result<()> {
        if let Some(category_id) = category_id {
            if workspace.category(category_id).is_none() {
                return Err(EngineError::CategoryNotFound(category_id.to_string()));
            }
        }
        // People are free-form collaborators; only categories are validated.
        let _ = person_id;
        Ok(())
    }

    /// The cached invoice total must always equal the sum of its charges.
    fn recompute_total(workspace: &mut Workspace, invoice_id: Uuid) -> Result<()> {
        let total: Decimal = workspace
            .charges_of(invoice_id)
            .map(|charge| charge.amount)
            .sum();
        let invoice = workspace
            .invoice_mut(invoice_id)
            .ok_or_else(|| EngineError::InvoiceNotFound(invoice_id.to_string()))?;
        invoice.total_amount = total;
        Ok(())
    }
}
