//! Boundary to the host ERP that stores invoices.

use std::sync::Arc;

use acm_core::DomainResult;
use acm_invoicing::{Invoice, InvoiceId, InvoiceLine};

use crate::contract::{Contract, RecurringLine};

/// Host operations the recurring invoice pipeline relies on.
///
/// Implementations own persistence and the base behaviour the pipeline
/// extends: default line values (product account and taxes, description,
/// price) and invoice headers (partner, journal, dates).
pub trait InvoiceHost: Send + Sync {
    /// Base values of an invoice line for `line`, before any override.
    fn prepare_invoice_line(
        &self,
        contract: &Contract,
        line: &RecurringLine,
        invoice_id: InvoiceId,
    ) -> DomainResult<InvoiceLine>;

    /// Create and persist an invoice header (no lines) for the contract's current cycle.
    fn create_invoice(&self, contract: &Contract) -> DomainResult<Invoice>;

    /// Persist the invoice as given (lines and stamped fields).
    fn write_invoice(&self, invoice: &Invoice) -> DomainResult<()>;

    /// Delete invoices. Unknown ids are an error.
    fn unlink_invoices(&self, ids: &[InvoiceId]) -> DomainResult<()>;

    fn find_invoice(&self, id: InvoiceId) -> Option<Invoice>;
}

impl<H> InvoiceHost for Arc<H>
where
    H: InvoiceHost + ?Sized,
{
    fn prepare_invoice_line(
        &self,
        contract: &Contract,
        line: &RecurringLine,
        invoice_id: InvoiceId,
    ) -> DomainResult<InvoiceLine> {
        (**self).prepare_invoice_line(contract, line, invoice_id)
    }

    fn create_invoice(&self, contract: &Contract) -> DomainResult<Invoice> {
        (**self).create_invoice(contract)
    }

    fn write_invoice(&self, invoice: &Invoice) -> DomainResult<()> {
        (**self).write_invoice(invoice)
    }

    fn unlink_invoices(&self, ids: &[InvoiceId]) -> DomainResult<()> {
        (**self).unlink_invoices(ids)
    }

    fn find_invoice(&self, id: InvoiceId) -> Option<Invoice> {
        (**self).find_invoice(id)
    }
}
