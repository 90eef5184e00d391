//! Daily recurring invoice run.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use acm_contracts::{Contract, ContractId, InvoiceHost, RecurringInvoicer, check_can_invoice};
use acm_core::DomainResult;
use acm_invoicing::InvoiceId;

/// A due contract left out of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedContract {
    pub contract_id: ContractId,
    pub name: String,
    pub reason: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_date: NaiveDate,
    /// Invoices kept (with at least one line).
    pub invoice_ids: Vec<InvoiceId>,
    /// Invoices created and deleted again because no line was billed.
    pub discarded: usize,
    /// Contracts whose next date is after the run date.
    pub not_due: usize,
    pub skipped: Vec<SkippedContract>,
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Invoices every contract due on the run date.
///
/// A contract is due when its next date is on or before the run date. Due
/// contracts that may not be invoiced (inactive, past termination) are
/// skipped and reported instead of failing the whole run.
pub struct RecurringInvoicingJob<H> {
    invoicer: RecurringInvoicer<H>,
}

impl<H: InvoiceHost> RecurringInvoicingJob<H> {
    pub fn new(host: H) -> Self {
        Self {
            invoicer: RecurringInvoicer::new(host),
        }
    }

    pub fn host(&self) -> &H {
        self.invoicer.host()
    }

    /// On error the host and every contract are left as they were.
    pub fn run(&self, contracts: &mut [Contract], run_date: NaiveDate) -> DomainResult<RunReport> {
        let mut not_due = 0;
        let mut skipped = Vec::new();
        let mut due = Vec::new();

        for (idx, contract) in contracts.iter().enumerate() {
            if contract.recurring_next_date() > run_date {
                not_due += 1;
                continue;
            }
            match check_can_invoice(contract) {
                Ok(()) => due.push(idx),
                Err(err) => {
                    warn!(contract = contract.name(), error = %err, "contract skipped");
                    skipped.push(SkippedContract {
                        contract_id: contract.id_typed(),
                        name: contract.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let mut batch: Vec<Contract> = due.iter().map(|&idx| contracts[idx].clone()).collect();
        let invoices = self.invoicer.recurring_create_invoices(&mut batch)?;
        let discarded = batch.len() - invoices.len();
        for (idx, updated) in due.into_iter().zip(batch) {
            contracts[idx] = updated;
        }

        let report = RunReport {
            run_date,
            invoice_ids: invoices.iter().map(|inv| inv.id()).collect(),
            discarded,
            not_due,
            skipped,
        };
        info!(
            %run_date,
            invoices = report.invoice_ids.len(),
            discarded,
            not_due,
            skipped = report.skipped.len(),
            "recurring invoicing job finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryInvoiceHost;
    use acm_contracts::{RecurrenceRule, RecurrenceUnit};
    use acm_core::DomainError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_run_reports_nothing() {
        let job = RecurringInvoicingJob::new(InMemoryInvoiceHost::new());
        let report = job.run(&mut [], date(2024, 3, 15)).unwrap();
        assert!(report.invoice_ids.is_empty());
        assert_eq!(report.discarded, 0);
        assert_eq!(report.not_due, 0);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn due_contract_without_lines_is_discarded_and_advanced() {
        let job = RecurringInvoicingJob::new(InMemoryInvoiceHost::new());
        let mut contracts = vec![Contract::new("CT-0001", date(2024, 3, 1), RecurrenceRule::monthly())];

        let report = job.run(&mut contracts, date(2024, 3, 15)).unwrap();
        assert_eq!(report.discarded, 1);
        assert!(job.host().is_empty().unwrap());
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 4, 1));
    }

    #[test]
    fn skipped_contracts_keep_their_date() {
        let job = RecurringInvoicingJob::new(InMemoryInvoiceHost::new());
        let mut contract = Contract::new("CT-0002", date(2024, 3, 1), RecurrenceRule::monthly());
        contract.set_active(false);
        let mut contracts = vec![contract];

        let report = job.run(&mut contracts, date(2024, 3, 1)).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            "validation failed: Can not create invoice of CT-0002 with inactive contract."
        );
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 3, 1));
    }

    #[test]
    fn failed_batch_leaves_host_and_dates_untouched() {
        let job = RecurringInvoicingJob::new(InMemoryInvoiceHost::new());
        let overflowing = RecurrenceRule::new(u32::MAX, RecurrenceUnit::Yearly).unwrap();
        let mut contracts = vec![
            Contract::new("CT-A", date(2024, 3, 15), RecurrenceRule::monthly()),
            Contract::new("CT-B", date(2024, 3, 15), overflowing),
        ];

        let err = job.run(&mut contracts, date(2024, 3, 15)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(job.host().is_empty().unwrap());
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 3, 15));
        assert_eq!(contracts[1].recurring_next_date(), date(2024, 3, 15));

        let mut retry = vec![contracts[0].clone()];
        let report = job.run(&mut retry, date(2024, 3, 15)).unwrap();
        assert_eq!(report.discarded, 1);
        assert!(job.host().is_empty().unwrap());
        assert_eq!(retry[0].recurring_next_date(), date(2024, 4, 15));
    }
}
