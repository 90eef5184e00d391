use std::collections::HashMap;
use std::sync::RwLock;

use acm_contracts::{Contract, InvoiceHost, RecurringLine};
use acm_core::{DomainError, DomainResult};
use acm_invoicing::{AccountId, Invoice, InvoiceId, InvoiceLine, TaxId};
use acm_products::ProductId;

/// Default income account and taxes of a product.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductAccounting {
    pub account_id: Option<AccountId>,
    pub tax_ids: Vec<TaxId>,
}

/// In-memory invoice host.
///
/// Intended for tests/dev. Base line values come from the per-product
/// accounting registered with [`with_product_accounting`](Self::with_product_accounting).
#[derive(Debug, Default)]
pub struct InMemoryInvoiceHost {
    invoices: RwLock<HashMap<InvoiceId, Invoice>>,
    accounting: HashMap<ProductId, ProductAccounting>,
}

impl InMemoryInvoiceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product_accounting(mut self, product_id: ProductId, accounting: ProductAccounting) -> Self {
        self.accounting.insert(product_id, accounting);
        self
    }

    /// All stored invoices, ordered by id.
    pub fn invoices(&self) -> DomainResult<Vec<Invoice>> {
        let map = self.invoices.read().map_err(|_| Self::poisoned())?;
        let mut invoices: Vec<Invoice> = map.values().cloned().collect();
        invoices.sort_by_key(Invoice::id);
        Ok(invoices)
    }

    pub fn len(&self) -> DomainResult<usize> {
        Ok(self.invoices.read().map_err(|_| Self::poisoned())?.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len()? == 0)
    }

    fn poisoned() -> DomainError {
        DomainError::conflict("invoice store lock poisoned")
    }
}

impl InvoiceHost for InMemoryInvoiceHost {
    fn prepare_invoice_line(
        &self,
        _contract: &Contract,
        line: &RecurringLine,
        _invoice_id: InvoiceId,
    ) -> DomainResult<InvoiceLine> {
        let accounting = self
            .accounting
            .get(&line.product.id)
            .cloned()
            .unwrap_or_default();

        Ok(InvoiceLine {
            product_id: line.product.id,
            name: line.name.clone(),
            quantity: line.quantity,
            price_unit: line.price_unit,
            account_id: accounting.account_id,
            tax_ids: accounting.tax_ids,
        })
    }

    fn create_invoice(&self, contract: &Contract) -> DomainResult<Invoice> {
        let invoice = Invoice::new(
            InvoiceId::generate(),
            contract.id_typed().0,
            contract.name(),
            contract.recurring_next_date(),
        );
        let mut invoices = self.invoices.write().map_err(|_| Self::poisoned())?;
        invoices.insert(invoice.id(), invoice.clone());
        Ok(invoice)
    }

    fn write_invoice(&self, invoice: &Invoice) -> DomainResult<()> {
        let mut invoices = self.invoices.write().map_err(|_| Self::poisoned())?;
        match invoices.get_mut(&invoice.id()) {
            Some(stored) => {
                *stored = invoice.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!("invoice {}", invoice.id()))),
        }
    }

    fn unlink_invoices(&self, ids: &[InvoiceId]) -> DomainResult<()> {
        let mut invoices = self.invoices.write().map_err(|_| Self::poisoned())?;
        if let Some(missing) = ids.iter().find(|id| !invoices.contains_key(*id)) {
            return Err(DomainError::not_found(format!("invoice {missing}")));
        }
        for id in ids {
            invoices.remove(id);
        }
        Ok(())
    }

    fn find_invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.invoices.read().ok()?.get(&id).cloned()
    }
}
