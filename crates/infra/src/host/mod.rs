//! Host adapters implementing [`acm_contracts::InvoiceHost`].

pub mod in_memory;

pub use in_memory::{InMemoryInvoiceHost, ProductAccounting};
