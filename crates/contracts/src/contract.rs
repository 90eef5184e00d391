use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use acm_core::{DomainError, DomainResult, Entity, define_id};
use acm_products::{ProductRef, ValueType};

use crate::agreement::{Agreement, IncomeType};
use crate::recurrence::{RecurrenceRule, with_day_clamped};

define_id!(
    /// Recurring contract identifier.
    ContractId
);

define_id!(
    /// Recurring line identifier.
    LineId
);

/// One billable component of a contract's recurring schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringLine {
    pub id: LineId,
    pub product: ProductRef,
    pub name: String,
    pub quantity: i64,
    /// Price in smallest currency unit.
    pub price_unit: u64,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Billed by hand; never picked up by recurring invoicing.
    pub manual: bool,
}

impl RecurringLine {
    pub fn new(product: ProductRef, price_unit: u64) -> Self {
        Self {
            id: LineId::generate(),
            name: product.name.clone(),
            product,
            quantity: 1,
            price_unit,
            date_start: None,
            date_end: None,
            manual: false,
        }
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }

    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    pub fn is_rent(&self) -> bool {
        self.product.value_type == Some(ValueType::Rent)
    }
}

/// A recurring billing arrangement tied to an agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContractData")]
pub struct Contract {
    id: ContractId,
    name: String,
    active: bool,
    recurring_next_date: NaiveDate,
    recurrence: RecurrenceRule,
    agreement: Option<Agreement>,
    income_type: Option<IncomeType>,
    lines: Vec<RecurringLine>,
}

impl Contract {
    pub fn new(name: impl Into<String>, recurring_next_date: NaiveDate, recurrence: RecurrenceRule) -> Self {
        Self {
            id: ContractId::generate(),
            name: name.into(),
            active: true,
            recurring_next_date,
            recurrence,
            agreement: None,
            income_type: None,
            lines: Vec::new(),
        }
    }

    pub fn with_agreement(mut self, agreement: Agreement) -> Self {
        self.agreement = Some(agreement);
        self
    }

    pub fn with_income_type(mut self, income_type: IncomeType) -> Self {
        self.income_type = Some(income_type);
        self
    }

    pub fn with_lines(mut self, lines: Vec<RecurringLine>) -> DomainResult<Self> {
        self.replace_lines(lines)?;
        Ok(self)
    }

    pub fn id_typed(&self) -> ContractId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn recurring_next_date(&self) -> NaiveDate {
        self.recurring_next_date
    }

    pub fn set_recurring_next_date(&mut self, date: NaiveDate) {
        self.recurring_next_date = date;
    }

    pub fn recurrence(&self) -> RecurrenceRule {
        self.recurrence
    }

    pub fn agreement(&self) -> Option<&Agreement> {
        self.agreement.as_ref()
    }

    pub fn income_type(&self) -> Option<&IncomeType> {
        self.income_type.as_ref()
    }

    pub fn lines(&self) -> &[RecurringLine] {
        &self.lines
    }

    /// Product of the first rent line.
    pub fn rent_product(&self) -> Option<&ProductRef> {
        self.lines.iter().find(|l| l.is_rent()).map(|l| &l.product)
    }

    /// Replace all recurring lines. On failure the current lines are kept.
    pub fn replace_lines(&mut self, lines: Vec<RecurringLine>) -> DomainResult<()> {
        check_single_rent_line(&lines)?;
        self.lines = lines;
        Ok(())
    }

    pub fn add_line(&mut self, line: RecurringLine) -> DomainResult<()> {
        if line.is_rent() && self.rent_product().is_some() {
            return Err(rent_line_error());
        }
        self.lines.push(line);
        Ok(())
    }

    /// Cycle date one recurrence step after the current one.
    pub fn following_recurring_date(&self) -> DomainResult<NaiveDate> {
        self.recurrence.next_after(self.recurring_next_date)
    }

    /// Align the cycle date with the agreement's invoice day.
    ///
    /// Returns the new date when it changed. Nothing happens without a
    /// per-line agreement or when the day already matches.
    pub fn align_to_invoice_day(&mut self) -> Option<NaiveDate> {
        let day = self.agreement.as_ref()?.target_invoice_day()?;
        if self.recurring_next_date.day() == day {
            return None;
        }
        let aligned = with_day_clamped(self.recurring_next_date, day);
        if aligned == self.recurring_next_date {
            return None;
        }
        self.recurring_next_date = aligned;
        Some(aligned)
    }
}

/// Wire shape of [`Contract`]; decoding goes through the line constraint.
#[derive(Deserialize)]
struct ContractData {
    id: ContractId,
    name: String,
    active: bool,
    recurring_next_date: NaiveDate,
    recurrence: RecurrenceRule,
    agreement: Option<Agreement>,
    income_type: Option<IncomeType>,
    lines: Vec<RecurringLine>,
}

impl TryFrom<ContractData> for Contract {
    type Error = DomainError;

    fn try_from(data: ContractData) -> DomainResult<Self> {
        let mut contract = Self {
            id: data.id,
            name: data.name,
            active: data.active,
            recurring_next_date: data.recurring_next_date,
            recurrence: data.recurrence,
            agreement: data.agreement,
            income_type: data.income_type,
            lines: Vec::new(),
        };
        contract.replace_lines(data.lines)?;
        Ok(contract)
    }
}

impl Entity for Contract {
    type Id = ContractId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn rent_line_error() -> DomainError {
    DomainError::validation("Only one rental product is allowed.")
}

fn check_single_rent_line(lines: &[RecurringLine]) -> DomainResult<()> {
    if lines.iter().filter(|l| l.is_rent()).count() > 1 {
        return Err(rent_line_error());
    }
    Ok(())
}
