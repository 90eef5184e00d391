//! Recurring invoice pipeline: guard → prepare lines → override → stamp,
//! then the batch policies (drop empty invoices, align cycle dates).

use chrono::Datelike;
use tracing::{debug, info, warn};

use acm_core::{DomainError, DomainResult};
use acm_invoicing::{Invoice, InvoiceId, InvoiceLine, InvoiceStamp, InvoiceType};

use crate::contract::{Contract, RecurringLine};
use crate::eligibility::{apply_income_type_overrides, is_line_eligible};
use crate::host::InvoiceHost;

/// Fail when no invoice may be generated for the contract's current cycle.
pub fn check_can_invoice(contract: &Contract) -> DomainResult<()> {
    if !contract.is_active() {
        return Err(DomainError::validation(format!(
            "Can not create invoice of {} with inactive contract.",
            contract.name()
        )));
    }
    if contract
        .agreement()
        .is_some_and(|a| a.is_terminated_at(contract.recurring_next_date()))
    {
        return Err(DomainError::validation(format!(
            "Can not create invoice of {} after termination date.",
            contract.name()
        )));
    }
    Ok(())
}

/// Type and name written on a freshly created invoice.
///
/// The type is `rent` unless the contract's income type matches the value
/// type of its rental product; the name is the rental product's name.
pub fn invoice_stamp(contract: &Contract) -> InvoiceStamp {
    let rent_product = contract.rent_product();
    let invoice_type = contract
        .income_type()
        .filter(|income| income.matches(rent_product.and_then(|p| p.value_type)))
        .map_or(InvoiceType::Rent, |income| income.invoice_type);

    InvoiceStamp {
        invoice_type,
        name: rent_product.map(|p| p.name.clone()),
    }
}

/// Runs recurring invoicing against a host.
pub struct RecurringInvoicer<H> {
    host: H,
}

impl<H: InvoiceHost> RecurringInvoicer<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Invoice line values for `line`, or `None` when the line is not billed
    /// on the contract's current cycle.
    pub fn prepare_invoice_line(
        &self,
        contract: &Contract,
        line: &RecurringLine,
        invoice_id: InvoiceId,
    ) -> DomainResult<Option<InvoiceLine>> {
        let next_date = contract.recurring_next_date();
        if !is_line_eligible(line, next_date) {
            debug!(
                contract = contract.name(),
                line = %line.id,
                %next_date,
                "recurring line not billed this cycle"
            );
            return Ok(None);
        }

        let mut values = self.host.prepare_invoice_line(contract, line, invoice_id)?;
        if let Some(income_type) = contract.income_type() {
            apply_income_type_overrides(&mut values, line.product.value_type, income_type);
        }
        Ok(Some(values))
    }

    /// Create the invoice of the contract's current cycle.
    ///
    /// The invoice may end up without lines; the batch run discards those.
    /// When filling or writing fails, the invoice is unlinked again.
    pub fn create_invoice(&self, contract: &Contract) -> DomainResult<Invoice> {
        check_can_invoice(contract)?;

        let mut invoice = self.host.create_invoice(contract)?;
        if let Err(err) = self.fill_invoice(contract, &mut invoice) {
            self.discard(&[invoice.id()]);
            return Err(err);
        }

        debug!(
            contract = contract.name(),
            invoice = %invoice.id(),
            lines = invoice.lines().len(),
            "invoice created"
        );
        Ok(invoice)
    }

    fn fill_invoice(&self, contract: &Contract, invoice: &mut Invoice) -> DomainResult<()> {
        for line in contract.lines() {
            if let Some(values) = self.prepare_invoice_line(contract, line, invoice.id())? {
                invoice.push_line(values);
            }
        }
        invoice.stamp(&invoice_stamp(contract));
        self.host.write_invoice(invoice)
    }

    /// Best-effort removal of invoices created by a run that failed.
    fn discard(&self, ids: &[InvoiceId]) {
        if ids.is_empty() {
            return;
        }
        if let Err(err) = self.host.unlink_invoices(ids) {
            warn!(invoices = ids.len(), error = %err, "failed to unlink invoices of an aborted run");
        }
    }

    /// Invoice every contract of the batch and advance their cycle dates.
    ///
    /// The batch is all-or-nothing: guards and next cycle dates are checked
    /// before anything is created, a host failure unlinks every invoice the
    /// run created, and contract dates only change once the host side has
    /// succeeded. Invoices without lines are deleted and left out of the
    /// result.
    pub fn recurring_create_invoices(&self, contracts: &mut [Contract]) -> DomainResult<Vec<Invoice>> {
        for contract in contracts.iter() {
            check_can_invoice(contract)?;
        }
        let next_dates = contracts
            .iter()
            .map(Contract::following_recurring_date)
            .collect::<DomainResult<Vec<_>>>()?;

        let mut invoices: Vec<Invoice> = Vec::with_capacity(contracts.len());
        for contract in contracts.iter() {
            match self.create_invoice(contract) {
                Ok(invoice) => invoices.push(invoice),
                Err(err) => {
                    let created: Vec<InvoiceId> = invoices.iter().map(Invoice::id).collect();
                    self.discard(&created);
                    return Err(err);
                }
            }
        }

        let (kept, empty): (Vec<Invoice>, Vec<Invoice>) =
            invoices.into_iter().partition(Invoice::has_lines);
        if !empty.is_empty() {
            let ids: Vec<InvoiceId> = empty.iter().map(Invoice::id).collect();
            if let Err(err) = self.host.unlink_invoices(&ids) {
                let created: Vec<InvoiceId> =
                    kept.iter().chain(&empty).map(Invoice::id).collect();
                self.discard(&created);
                return Err(err);
            }
            info!(discarded = ids.len(), "discarded invoices without lines");
        }

        for (contract, next_date) in contracts.iter_mut().zip(next_dates) {
            contract.set_recurring_next_date(next_date);
            let previous = contract.recurring_next_date();
            if let Some(aligned) = contract.align_to_invoice_day() {
                if let Some(day) = contract.agreement().and_then(|a| a.target_invoice_day()) {
                    if aligned.day() != day {
                        warn!(contract = contract.name(), day, %aligned, "invoice day clamped to month end");
                    }
                }
                info!(
                    contract = contract.name(),
                    %previous,
                    %aligned,
                    "moved next invoice date to agreement invoice day"
                );
            }
        }

        info!(
            contracts = contracts.len(),
            invoices = kept.len(),
            "recurring invoice run finished"
        );
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use acm_invoicing::{AccountId, TaxId};
    use acm_products::{ProductId, ProductRef, ValueType};

    use super::*;
    use crate::agreement::{Agreement, IncomeType};
    use crate::recurrence::{RecurrenceRule, RecurrenceUnit};

    /// Minimal host: every line gets the same default account and tax.
    /// Creation or writes fail for the contract named in `fail_create` / `fail_write`.
    struct TestHost {
        default_account: AccountId,
        default_tax: TaxId,
        invoices: Mutex<HashMap<InvoiceId, Invoice>>,
        fail_create: Option<&'static str>,
        fail_write: Option<&'static str>,
    }

    impl TestHost {
        fn new() -> Self {
            Self {
                default_account: AccountId::generate(),
                default_tax: TaxId::generate(),
                invoices: Mutex::new(HashMap::new()),
                fail_create: None,
                fail_write: None,
            }
        }

        fn count(&self) -> usize {
            self.invoices.lock().unwrap().len()
        }
    }

    impl InvoiceHost for TestHost {
        fn prepare_invoice_line(
            &self,
            _contract: &Contract,
            line: &RecurringLine,
            _invoice_id: InvoiceId,
        ) -> DomainResult<InvoiceLine> {
            Ok(InvoiceLine {
                product_id: line.product.id,
                name: line.name.clone(),
                quantity: line.quantity,
                price_unit: line.price_unit,
                account_id: Some(self.default_account),
                tax_ids: vec![self.default_tax],
            })
        }

        fn create_invoice(&self, contract: &Contract) -> DomainResult<Invoice> {
            if self.fail_create == Some(contract.name()) {
                return Err(DomainError::conflict("journal locked"));
            }
            let invoice = Invoice::new(
                InvoiceId::generate(),
                contract.id_typed().0,
                contract.name(),
                contract.recurring_next_date(),
            );
            self.invoices
                .lock()
                .unwrap()
                .insert(invoice.id(), invoice.clone());
            Ok(invoice)
        }

        fn write_invoice(&self, invoice: &Invoice) -> DomainResult<()> {
            if self.fail_write == Some(invoice.origin()) {
                return Err(DomainError::conflict("invoice is being edited"));
            }
            self.invoices
                .lock()
                .unwrap()
                .insert(invoice.id(), invoice.clone());
            Ok(())
        }

        fn unlink_invoices(&self, ids: &[InvoiceId]) -> DomainResult<()> {
            let mut invoices = self.invoices.lock().unwrap();
            for id in ids {
                invoices
                    .remove(id)
                    .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))?;
            }
            Ok(())
        }

        fn find_invoice(&self, id: InvoiceId) -> Option<Invoice> {
            self.invoices.lock().unwrap().get(&id).cloned()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product(name: &str, value_type: ValueType) -> ProductRef {
        ProductRef {
            id: ProductId::generate(),
            name: name.to_string(),
            value_type: Some(value_type),
        }
    }

    fn march_rent_line() -> RecurringLine {
        RecurringLine::new(product("1A-001", ValueType::Rent), 3_000_00)
            .between(Some(date(2024, 3, 1)), Some(date(2024, 3, 31)))
    }

    fn contract_with(lines: Vec<RecurringLine>) -> Contract {
        Contract::new("CT-0001", date(2024, 3, 15), RecurrenceRule::monthly())
            .with_lines(lines)
            .unwrap()
    }

    #[test]
    fn ineligible_line_prepares_nothing() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let line = RecurringLine::new(product("1A-001", ValueType::Rent), 100)
            .between(Some(date(2024, 1, 1)), Some(date(2024, 2, 28)));
        let contract = contract_with(vec![line.clone()]);

        let values = invoicer
            .prepare_invoice_line(&contract, &line, InvoiceId::generate())
            .unwrap();
        assert!(values.is_none());
    }

    #[test]
    fn eligible_line_gets_income_type_overrides() {
        let host = TestHost::new();
        let account = AccountId::generate();
        let tax = TaxId::generate();
        let line = march_rent_line();
        let contract = contract_with(vec![line.clone()]).with_income_type(
            IncomeType::new("Rent", ValueType::Rent, InvoiceType::Rent)
                .with_account(account)
                .with_taxes(vec![tax]),
        );
        let invoicer = RecurringInvoicer::new(host);

        let values = invoicer
            .prepare_invoice_line(&contract, &line, InvoiceId::generate())
            .unwrap()
            .unwrap();
        assert_eq!(values.account_id, Some(account));
        assert_eq!(values.tax_ids, vec![tax]);
        assert_eq!(values.price_unit, 3_000_00);
    }

    #[test]
    fn eligible_line_without_income_type_keeps_host_defaults() {
        let host = TestHost::new();
        let default_account = host.default_account;
        let line = march_rent_line();
        let contract = contract_with(vec![line.clone()]);
        let invoicer = RecurringInvoicer::new(host);

        let values = invoicer
            .prepare_invoice_line(&contract, &line, InvoiceId::generate())
            .unwrap()
            .unwrap();
        assert_eq!(values.account_id, Some(default_account));
    }

    #[test]
    fn inactive_contract_cannot_be_invoiced() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let mut contract = contract_with(vec![march_rent_line()]);
        contract.set_active(false);

        let err = invoicer.create_invoice(&contract).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Can not create invoice of CT-0001 with inactive contract.")
        );
        assert_eq!(invoicer.host().count(), 0);
    }

    #[test]
    fn terminated_agreement_blocks_invoicing() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let contract = contract_with(vec![march_rent_line()])
            .with_agreement(Agreement::new("AG").terminating_on(date(2024, 3, 14)));

        let err = invoicer.create_invoice(&contract).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("after termination date")));
        assert_eq!(invoicer.host().count(), 0);
    }

    #[test]
    fn invoicing_on_termination_day_is_allowed() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let contract = contract_with(vec![march_rent_line()])
            .with_agreement(Agreement::new("AG").terminating_on(date(2024, 3, 15)));
        assert!(invoicer.create_invoice(&contract).is_ok());
    }

    #[test]
    fn created_invoice_is_stamped_from_rent_product() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let contract = contract_with(vec![march_rent_line()]);

        let invoice = invoicer.create_invoice(&contract).unwrap();
        assert_eq!(invoice.invoice_type(), InvoiceType::Rent);
        assert_eq!(invoice.name(), Some("1A-001"));
        assert_eq!(invoice.lines().len(), 1);
        assert_eq!(invoicer.host().find_invoice(invoice.id()), Some(invoice));
    }

    #[test]
    fn matching_income_type_sets_invoice_type() {
        let contract = contract_with(vec![march_rent_line()]).with_income_type(IncomeType::new(
            "Lump sum",
            ValueType::Rent,
            InvoiceType::LumpSumRent,
        ));
        assert_eq!(invoice_stamp(&contract).invoice_type, InvoiceType::LumpSumRent);

        let other = contract_with(vec![march_rent_line()]).with_income_type(IncomeType::new(
            "Deposit",
            ValueType::SecurityDeposit,
            InvoiceType::SecurityDeposit,
        ));
        assert_eq!(invoice_stamp(&other).invoice_type, InvoiceType::Rent);
    }

    #[test]
    fn contract_without_rent_product_stamps_no_name() {
        let deposit = RecurringLine::new(product("Deposit", ValueType::SecurityDeposit), 100)
            .between(Some(date(2024, 1, 1)), None);
        let stamp = invoice_stamp(&contract_with(vec![deposit]));
        assert_eq!(stamp.invoice_type, InvoiceType::Rent);
        assert_eq!(stamp.name, None);
    }

    #[test]
    fn batch_discards_invoices_without_lines() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let expired = RecurringLine::new(product("1A-002", ValueType::Rent), 100)
            .between(Some(date(2024, 1, 1)), Some(date(2024, 2, 28)));
        let mut contracts = vec![
            contract_with(vec![march_rent_line()]),
            Contract::new("CT-0002", date(2024, 3, 15), RecurrenceRule::monthly())
                .with_lines(vec![expired])
                .unwrap(),
        ];

        let invoices = invoicer.recurring_create_invoices(&mut contracts).unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].origin(), "CT-0001");
        assert_eq!(invoicer.host().count(), 1);

        // Both contracts moved to the next cycle.
        assert!(contracts.iter().all(|c| c.recurring_next_date() == date(2024, 4, 15)));
    }

    #[test]
    fn batch_guard_failure_creates_nothing() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let mut inactive = contract_with(vec![march_rent_line()]);
        inactive.set_active(false);
        let mut contracts = vec![contract_with(vec![march_rent_line()]), inactive];

        assert!(invoicer.recurring_create_invoices(&mut contracts).is_err());
        assert_eq!(invoicer.host().count(), 0);
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 3, 15));
    }

    #[test]
    fn batch_aligns_next_date_to_agreement_day() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let mut contracts = vec![
            contract_with(vec![march_rent_line()])
                .with_agreement(Agreement::new("AG").invoicing_on_day(1)),
        ];

        invoicer.recurring_create_invoices(&mut contracts).unwrap();
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 4, 1));
    }

    #[test]
    fn batch_with_overflowing_recurrence_creates_nothing() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let overflowing = RecurrenceRule::new(u32::MAX, RecurrenceUnit::Yearly).unwrap();
        let mut contracts = vec![
            contract_with(vec![march_rent_line()]),
            Contract::new("CT-0002", date(2024, 3, 15), overflowing),
        ];

        let err = invoicer.recurring_create_invoices(&mut contracts).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(invoicer.host().count(), 0);
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 3, 15));

        // A retry of the healthy contract bills it exactly once.
        let mut retry = vec![contracts[0].clone()];
        invoicer.recurring_create_invoices(&mut retry).unwrap();
        assert_eq!(invoicer.host().count(), 1);
        assert_eq!(retry[0].recurring_next_date(), date(2024, 4, 15));
    }

    #[test]
    fn host_failure_mid_batch_unlinks_created_invoices() {
        let mut host = TestHost::new();
        host.fail_create = Some("CT-0003");
        let invoicer = RecurringInvoicer::new(host);
        let mut contracts = vec![
            contract_with(vec![march_rent_line()]),
            Contract::new("CT-0002", date(2024, 3, 15), RecurrenceRule::monthly()),
            Contract::new("CT-0003", date(2024, 3, 15), RecurrenceRule::monthly()),
        ];

        let err = invoicer.recurring_create_invoices(&mut contracts).unwrap_err();
        assert_eq!(err, DomainError::conflict("journal locked"));
        assert_eq!(invoicer.host().count(), 0);
        assert!(contracts.iter().all(|c| c.recurring_next_date() == date(2024, 3, 15)));
    }

    #[test]
    fn failed_write_unlinks_the_new_invoice() {
        let mut host = TestHost::new();
        host.fail_write = Some("CT-0001");
        let invoicer = RecurringInvoicer::new(host);

        let err = invoicer
            .create_invoice(&contract_with(vec![march_rent_line()]))
            .unwrap_err();
        assert_eq!(err, DomainError::conflict("invoice is being edited"));
        assert_eq!(invoicer.host().count(), 0);
    }

    #[test]
    fn discarded_invoice_contract_is_still_aligned() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let expired = RecurringLine::new(product("1A-002", ValueType::Rent), 100)
            .between(Some(date(2024, 1, 1)), Some(date(2024, 2, 28)));
        let mut contracts = vec![
            Contract::new("CT-0002", date(2024, 3, 15), RecurrenceRule::monthly())
                .with_lines(vec![expired])
                .unwrap()
                .with_agreement(Agreement::new("AG").invoicing_on_day(5)),
        ];

        let invoices = invoicer.recurring_create_invoices(&mut contracts).unwrap();
        assert!(invoices.is_empty());
        assert_eq!(invoicer.host().count(), 0);
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 4, 5));
    }

    #[test]
    fn batch_clamps_invoice_day_to_month_end() {
        let invoicer = RecurringInvoicer::new(TestHost::new());
        let mut contracts = vec![
            Contract::new("CT-0004", date(2024, 1, 10), RecurrenceRule::monthly())
                .with_agreement(Agreement::new("AG").invoicing_on_day(31)),
        ];

        invoicer.recurring_create_invoices(&mut contracts).unwrap();
        assert_eq!(contracts[0].recurring_next_date(), date(2024, 2, 29));
    }
}
