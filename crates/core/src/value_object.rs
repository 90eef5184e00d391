//! Value object trait: equality by value, not identity.
//!
//! Product dimensions and recurrence rules are value objects: two instances
//! with the same attributes are interchangeable, and "changing" one means
//! building a new one.

/// Marker trait for immutable values compared by their attributes.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
