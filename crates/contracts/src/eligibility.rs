//! Which recurring lines are billed on a cycle, and with which accounts.

use chrono::NaiveDate;

use acm_invoicing::InvoiceLine;
use acm_products::ValueType;

use crate::agreement::IncomeType;
use crate::contract::RecurringLine;

/// Whether `line` is billed on the cycle dated `next_date`.
///
/// A line needs at least one bound; open bounds are unbounded on that side
/// and both bounds are inclusive. Manual lines are never billed here.
pub fn is_line_eligible(line: &RecurringLine, next_date: NaiveDate) -> bool {
    let in_window = match (line.date_start, line.date_end) {
        (None, None) => false,
        (Some(start), None) => start <= next_date,
        (None, Some(end)) => next_date <= end,
        (Some(start), Some(end)) => start <= next_date && next_date <= end,
    };
    in_window && !line.manual
}

/// Replace the account and taxes of a prepared line with the income type's
/// when the line's product has the income type's value type.
///
/// Taxes are replaced wholesale, never merged.
pub fn apply_income_type_overrides(
    values: &mut InvoiceLine,
    product_value_type: Option<ValueType>,
    income_type: &IncomeType,
) {
    if !income_type.matches(product_value_type) {
        return;
    }
    if let Some(account_id) = income_type.account_id {
        values.account_id = Some(account_id);
    }
    if !income_type.tax_ids.is_empty() {
        values.tax_ids = income_type.tax_ids.clone();
    }
}
