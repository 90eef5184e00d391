use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use acm_core::define_id;
use acm_invoicing::{AccountId, InvoiceType, TaxId};
use acm_products::ValueType;

define_id!(
    /// Agreement identifier.
    AgreementId
);

define_id!(
    /// Income type identifier.
    IncomeTypeId
);

/// The business arrangement a contract belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub name: String,
    /// No invoice may be generated for a cycle date after this day.
    pub termination_date: Option<NaiveDate>,
    /// Invoice each line on a fixed day of the month.
    pub invoice_per_line: bool,
    /// Target day of month for the next invoice when `invoice_per_line` is set.
    pub invoice_date_days: Option<u32>,
}

impl Agreement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AgreementId::generate(),
            name: name.into(),
            termination_date: None,
            invoice_per_line: false,
            invoice_date_days: None,
        }
    }

    pub fn terminating_on(mut self, date: NaiveDate) -> Self {
        self.termination_date = Some(date);
        self
    }

    /// Invoice per line on the given day of month.
    pub fn invoicing_on_day(mut self, day: u32) -> Self {
        self.invoice_per_line = true;
        self.invoice_date_days = Some(day);
        self
    }

    /// Whether `date` lies after the termination date.
    pub fn is_terminated_at(&self, date: NaiveDate) -> bool {
        self.termination_date.is_some_and(|t| date > t)
    }

    /// Day the next cycle date should be moved to, if any.
    pub fn target_invoice_day(&self) -> Option<u32> {
        if !self.invoice_per_line {
            return None;
        }
        self.invoice_date_days.filter(|d| *d > 0)
    }
}

/// Classification of a contract's income, driving account and tax overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeType {
    pub id: IncomeTypeId,
    pub name: String,
    /// Lines whose product has this value type get the overrides.
    pub value_type: ValueType,
    pub account_id: Option<AccountId>,
    /// Replaces the line taxes when non-empty.
    pub tax_ids: Vec<TaxId>,
    pub invoice_type: InvoiceType,
}

impl IncomeType {
    pub fn new(name: impl Into<String>, value_type: ValueType, invoice_type: InvoiceType) -> Self {
        Self {
            id: IncomeTypeId::generate(),
            name: name.into(),
            value_type,
            account_id: None,
            tax_ids: Vec::new(),
            invoice_type,
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_taxes(mut self, tax_ids: Vec<TaxId>) -> Self {
        self.tax_ids = tax_ids;
        self
    }

    pub fn matches(&self, value_type: Option<ValueType>) -> bool {
        value_type == Some(self.value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn termination_is_exclusive_of_the_termination_day() {
        let agreement = Agreement::new("AG-001").terminating_on(date(2024, 6, 30));
        assert!(!agreement.is_terminated_at(date(2024, 6, 30)));
        assert!(agreement.is_terminated_at(date(2024, 7, 1)));
        assert!(!Agreement::new("AG-002").is_terminated_at(date(2099, 1, 1)));
    }

    #[test]
    fn target_day_requires_per_line_invoicing() {
        let mut agreement = Agreement::new("AG-001");
        agreement.invoice_date_days = Some(5);
        assert_eq!(agreement.target_invoice_day(), None);

        let agreement = Agreement::new("AG-001").invoicing_on_day(5);
        assert_eq!(agreement.target_invoice_day(), Some(5));

        let agreement = Agreement::new("AG-001").invoicing_on_day(0);
        assert_eq!(agreement.target_invoice_day(), None);
    }

    #[test]
    fn income_type_matches_only_its_value_type() {
        let income = IncomeType::new("Deposit", ValueType::SecurityDeposit, InvoiceType::SecurityDeposit);
        assert!(income.matches(Some(ValueType::SecurityDeposit)));
        assert!(!income.matches(Some(ValueType::Rent)));
        assert!(!income.matches(None));
    }
}
