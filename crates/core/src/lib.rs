//! `acm-core`: shared building blocks for the agreement contract domain.
//!
//! Pure domain primitives only: identifiers, the error model and the traits
//! that entities, aggregates and value objects implement.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::AggregateId;
pub use value_object::ValueObject;
