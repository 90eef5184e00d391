use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use acm_core::{AggregateId, DomainError, DomainResult, define_id};
use acm_products::ProductId;

define_id!(
    /// Invoice identifier (assigned by the host).
    InvoiceId
);

define_id!(
    /// Income account identifier.
    AccountId
);

define_id!(
    /// Tax identifier.
    TaxId
);

/// Secondary invoice classification ("type2" in the host ERP).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    #[default]
    Rent,
    LumpSumRent,
    SecurityDeposit,
    Transfer,
}

/// One invoice line, as prepared from a recurring contract line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., satang).
    pub price_unit: u64,
    pub account_id: Option<AccountId>,
    pub tax_ids: Vec<TaxId>,
}

impl InvoiceLine {
    /// Untaxed amount, `None` on overflow or negative quantity.
    pub fn subtotal(&self) -> Option<u64> {
        u64::try_from(self.quantity)
            .ok()?
            .checked_mul(self.price_unit)
    }
}

/// Fields written on an invoice right after the host created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStamp {
    pub invoice_type: InvoiceType,
    pub name: Option<String>,
}

/// A customer invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    /// Contract the invoice was generated from.
    contract_id: AggregateId,
    /// Contract reference shown on the invoice.
    origin: String,
    name: Option<String>,
    invoice_type: InvoiceType,
    date_invoice: NaiveDate,
    lines: Vec<InvoiceLine>,
}

impl Invoice {
    pub fn new(
        id: InvoiceId,
        contract_id: AggregateId,
        origin: impl Into<String>,
        date_invoice: NaiveDate,
    ) -> Self {
        Self {
            id,
            contract_id,
            origin: origin.into(),
            name: None,
            invoice_type: InvoiceType::default(),
            date_invoice,
            lines: Vec::new(),
        }
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn contract_id(&self) -> AggregateId {
        self.contract_id
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn invoice_type(&self) -> InvoiceType {
        self.invoice_type
    }

    pub fn date_invoice(&self) -> NaiveDate {
        self.date_invoice
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn has_lines(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn push_line(&mut self, line: InvoiceLine) {
        self.lines.push(line);
    }

    pub fn stamp(&mut self, stamp: &InvoiceStamp) {
        self.invoice_type = stamp.invoice_type;
        self.name = stamp.name.clone();
    }

    /// Sum of line subtotals.
    pub fn total_untaxed(&self) -> DomainResult<u64> {
        self.lines.iter().try_fold(0u64, |acc, line| {
            line.subtotal()
                .and_then(|s| acc.checked_add(s))
                .ok_or_else(|| DomainError::invariant("invoice total overflow"))
        })
    }
}
