use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::Account,
    card::CreditCard,
    category::Category,
    entry::LedgerEntry,
    installment::{Installment, InstallmentPlan},
    invoice::{CreditCardCharge, CreditCardInvoice, InvoicePayment},
    period::Period,
    recurring::RecurringRule,
};

const CURRENT_SCHEMA_VERSION: u8 = 1;

/// One logically independent ledger: all entities of a personal or shared
/// finance workspace, persisted and mutated as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
    #[serde(default)]
    pub recurring_rules: Vec<RecurringRule>,
    #[serde(default)]
    pub installment_plans: Vec<InstallmentPlan>,
    #[serde(default)]
    pub installments: Vec<Installment>,
    #[serde(default)]
    pub cards: Vec<CreditCard>,
    #[serde(default)]
    pub invoices: Vec<CreditCardInvoice>,
    #[serde(default)]
    pub charges: Vec<CreditCardCharge>,
    #[serde(default)]
    pub payments: Vec<InvoicePayment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Workspace::schema_version_default")]
    pub schema_version: u8,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            accounts: Vec::new(),
            categories: Vec::new(),
            entries: Vec::new(),
            recurring_rules: Vec::new(),
            installment_plans: Vec::new(),
            installments: Vec::new(),
            cards: Vec::new(),
            invoices: Vec::new(),
            charges: Vec::new(),
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        self.touch();
        id
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        self.touch();
        id
    }

    pub fn add_entry(&mut self, entry: LedgerEntry) -> Uuid {
        let id = entry.id;
        self.entries.push(entry);
        self.touch();
        id
    }

    pub fn add_rule(&mut self, rule: RecurringRule) -> Uuid {
        let id = rule.id;
        self.recurring_rules.push(rule);
        self.touch();
        id
    }

    pub fn add_card(&mut self, card: CreditCard) -> Uuid {
        let id = card.id;
        self.cards.push(card);
        self.touch();
        id
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn entry(&self, id: Uuid) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn rule(&self, id: Uuid) -> Option<&RecurringRule> {
        self.recurring_rules.iter().find(|rule| rule.id == id)
    }

    pub fn rule_mut(&mut self, id: Uuid) -> Option<&mut RecurringRule> {
        self.recurring_rules.iter_mut().find(|rule| rule.id == id)
    }

    pub fn card(&self, id: Uuid) -> Option<&CreditCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn plan(&self, id: Uuid) -> Option<&InstallmentPlan> {
        self.installment_plans.iter().find(|plan| plan.id == id)
    }

    pub fn installments_of(&self, plan_id: Uuid) -> impl Iterator<Item = &Installment> {
        self.installments
            .iter()
            .filter(move |installment| installment.plan_id == plan_id)
    }

    pub fn invoice(&self, id: Uuid) -> Option<&CreditCardInvoice> {
        self.invoices.iter().find(|invoice| invoice.id == id)
    }

    pub fn invoice_mut(&mut self, id: Uuid) -> Option<&mut CreditCardInvoice> {
        self.invoices.iter_mut().find(|invoice| invoice.id == id)
    }

    /// Invoices are keyed by `(card, period)`; there is at most one.
    pub fn invoice_for(&self, card_id: Uuid, period: Period) -> Option<&CreditCardInvoice> {
        self.invoices
            .iter()
            .find(|invoice| invoice.card_id == card_id && invoice.period == period)
    }

    pub fn charge(&self, id: Uuid) -> Option<&CreditCardCharge> {
        self.charges.iter().find(|charge| charge.id == id)
    }

    pub fn charge_mut(&mut self, id: Uuid) -> Option<&mut CreditCardCharge> {
        self.charges.iter_mut().find(|charge| charge.id == id)
    }

    pub fn charges_of(&self, invoice_id: Uuid) -> impl Iterator<Item = &CreditCardCharge> {
        self.charges
            .iter()
            .filter(move |charge| charge.invoice_id == invoice_id)
    }

    pub fn remove_charge(&mut self, id: Uuid) -> Option<CreditCardCharge> {
        let index = self.charges.iter().position(|charge| charge.id == id)?;
        let removed = self.charges.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn payment_of(&self, invoice_id: Uuid) -> Option<&InvoicePayment> {
        self.payments
            .iter()
            .find(|payment| payment.invoice_id == invoice_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
