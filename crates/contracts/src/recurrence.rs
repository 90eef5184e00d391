//! Recurrence of contract invoicing cycles.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use acm_core::{DomainError, DomainResult, ValueObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Daily,
    Monthly,
    Yearly,
}

/// "Every `interval` days/months/years".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceData")]
pub struct RecurrenceRule {
    interval: u32,
    unit: RecurrenceUnit,
}

#[derive(Deserialize)]
struct RecurrenceData {
    interval: u32,
    unit: RecurrenceUnit,
}

impl TryFrom<RecurrenceData> for RecurrenceRule {
    type Error = DomainError;

    fn try_from(data: RecurrenceData) -> DomainResult<Self> {
        Self::new(data.interval, data.unit)
    }
}

impl ValueObject for RecurrenceRule {}

impl RecurrenceRule {
    pub fn new(interval: u32, unit: RecurrenceUnit) -> DomainResult<Self> {
        if interval == 0 {
            return Err(DomainError::validation("recurrence interval must be positive"));
        }
        Ok(Self { interval, unit })
    }

    pub fn monthly() -> Self {
        Self {
            interval: 1,
            unit: RecurrenceUnit::Monthly,
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn unit(&self) -> RecurrenceUnit {
        self.unit
    }

    /// Cycle date following `date`. Month arithmetic clamps to the month's
    /// last day (Jan 31 + 1 month = Feb 28/29).
    pub fn next_after(&self, date: NaiveDate) -> DomainResult<NaiveDate> {
        let next = match self.unit {
            RecurrenceUnit::Daily => date.checked_add_days(Days::new(u64::from(self.interval))),
            RecurrenceUnit::Monthly => date.checked_add_months(Months::new(self.interval)),
            RecurrenceUnit::Yearly => self
                .interval
                .checked_mul(12)
                .and_then(|months| date.checked_add_months(Months::new(months))),
        };
        next.ok_or_else(|| DomainError::invariant(format!("recurrence overflows after {date}")))
    }
}

/// Same year and month as `date`, on `day` (clamped to the month's last day).
pub fn with_day_clamped(date: NaiveDate, day: u32) -> NaiveDate {
    let last = last_day_of_month(date);
    date.with_day(day.clamp(1, last)).unwrap_or(date)
}

fn last_day_of_month(date: NaiveDate) -> u32 {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
