//! Scheduled jobs.
//!
//! - `RecurringInvoicingJob`: the daily recurring invoice run over due contracts.

pub mod recurring_invoicing;

pub use recurring_invoicing::{RecurringInvoicingJob, RunReport, SkippedContract};
