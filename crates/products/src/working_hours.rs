use serde::{Deserialize, Serialize};

use acm_core::define_id;

define_id!(
    /// Working hours schedule identifier.
    WorkingHoursId
);

/// Whether a schedule describes opening hours or closed hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingHoursKind {
    InTime,
    OutTime,
}

/// A named working hours schedule (e.g. "06:00-18:00").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkingHours {
    pub id: WorkingHoursId,
    pub name: String,
    pub kind: WorkingHoursKind,
}

impl WorkingHours {
    pub fn new(name: impl Into<String>, kind: WorkingHoursKind) -> Self {
        Self {
            id: WorkingHoursId::generate(),
            name: name.into(),
            kind,
        }
    }
}
