//! Ledger domain models, persistence-friendly types, and helpers.

pub mod account;
pub mod card;
pub mod category;
pub mod entry;
pub mod installment;
pub mod invoice;
pub mod period;
pub mod recurring;
pub mod workspace;

pub use account::Account;
pub use card::{CardStatus, CreditCard};
pub use category::Category;
pub use entry::{EntryKind, EntryStatus, LedgerEntry};
pub use installment::{Installment, InstallmentPlan};
pub use invoice::{
    ChargeKind, CreditCardCharge, CreditCardInvoice, InvoicePayment, InvoiceStatus,
};
pub use period::Period;
pub use recurring::{Frequency, RecurringRule};
pub use workspace::Workspace;
