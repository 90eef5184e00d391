//! Recurring contracts of rental agreements.
//!
//! Decides which recurring lines of a contract are billed on the current
//! cycle, overrides their accounting attributes from the contract's income
//! type, and applies the post-creation policies of a recurring invoice run.
//! Invoice storage stays with the host behind [`InvoiceHost`].

pub mod agreement;
pub mod contract;
pub mod eligibility;
pub mod host;
pub mod pipeline;
pub mod recurrence;

pub use agreement::{Agreement, AgreementId, IncomeType, IncomeTypeId};
pub use contract::{Contract, ContractId, LineId, RecurringLine};
pub use eligibility::{apply_income_type_overrides, is_line_eligible};
pub use host::InvoiceHost;
pub use pipeline::{RecurringInvoicer, check_can_invoice, invoice_stamp};
pub use recurrence::{RecurrenceRule, RecurrenceUnit, with_day_clamped};
