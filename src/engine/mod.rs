//! Engine services: the recurring scheduler, the installment splitter, and
//! the invoice lifecycle, plus the facade that wires them to a clock and a
//! statement decoder.

pub mod installments;
pub mod invoices;
pub mod scheduler;

pub use installments::{InstallmentService, SplitOutcome, SplitRequest};
pub use invoices::{
    CategoryTotal, ChargeRequest, ChargeUpdate, InvoiceService, PayRequest, PaymentOutcome,
    StatementImport,
};
pub use scheduler::{RuleFailure, SchedulerService, TickReport};

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::errors::Result;
use crate::ledger::{Period, Workspace};
use crate::statement::{self, CsvStatementDecoder, StatementDecoder};

/// Facade that coordinates the engine services with a clock and a statement
/// decoder, so callers never read ambient time or raw bytes themselves.
pub struct LedgerEngine {
    clock: Arc<dyn Clock>,
    decoder: Box<dyn StatementDecoder>,
}

impl LedgerEngine {
    pub fn new(clock: Arc<dyn Clock>, decoder: Box<dyn StatementDecoder>) -> Self {
        Self { clock, decoder }
    }

    /// System clock and the delimited-text statement decoder.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(SystemClock), Box::new(CsvStatementDecoder))
    }

    pub fn tick(&self, workspace: &mut Workspace) -> TickReport {
        SchedulerService::tick(workspace, self.clock.now())
    }

    pub fn split(&self, workspace: &mut Workspace, request: SplitRequest) -> Result<SplitOutcome> {
        InstallmentService::split(workspace, request)
    }

    pub fn ensure_invoice(
        &self,
        workspace: &mut Workspace,
        card_id: Uuid,
        period: Period,
    ) -> Result<Uuid> {
        InvoiceService::ensure_invoice(workspace, card_id, period)
    }

    pub fn create_charge(
        &self,
        workspace: &mut Workspace,
        invoice_id: Uuid,
        request: ChargeRequest,
    ) -> Result<Uuid> {
        InvoiceService::create_charge(workspace, invoice_id, request)
    }

    pub fn update_charge(
        &self,
        workspace: &mut Workspace,
        charge_id: Uuid,
        update: ChargeUpdate,
    ) -> Result<()> {
        InvoiceService::update_charge(workspace, charge_id, update)
    }

    pub fn delete_charge(&self, workspace: &mut Workspace, charge_id: Uuid) -> Result<()> {
        InvoiceService::delete_charge(workspace, charge_id).map(|_| ())
    }

    pub fn close_invoice(&self, workspace: &mut Workspace, invoice_id: Uuid) -> Result<()> {
        InvoiceService::close_invoice(workspace, invoice_id, self.clock.now())
    }

    pub fn pay_invoice(
        &self,
        workspace: &mut Workspace,
        invoice_id: Uuid,
        request: PayRequest,
    ) -> Result<PaymentOutcome> {
        InvoiceService::pay_invoice(workspace, invoice_id, request, self.clock.now())
    }

    pub fn totals_by_category(
        &self,
        workspace: &Workspace,
        invoice_id: Uuid,
    ) -> Result<Vec<CategoryTotal>> {
        InvoiceService::totals_by_category(workspace, invoice_id)
    }

    /// Decodes and parses a statement file, then imports its charges into the
    /// card's invoice for `period` and closes it.
    pub fn upload_statement(
        &self,
        workspace: &mut Workspace,
        card_id: Uuid,
        period: Period,
        bytes: &[u8],
    ) -> Result<StatementImport> {
        let rows = self.decoder.decode(bytes)?;
        let parsed = statement::parse(&rows)?;
        InvoiceService::import_statement(workspace, card_id, period, &parsed, self.clock.now())
    }
}
