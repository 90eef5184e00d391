//! Customer invoices produced from recurring contracts.
//!
//! The host ERP owns invoice storage and numbering; this crate only models
//! the fields the contract pipeline reads and writes.

pub mod invoice;

pub use invoice::{AccountId, Invoice, InvoiceId, InvoiceLine, InvoiceStamp, InvoiceType, TaxId};
