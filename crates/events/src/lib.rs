//! Domain events emitted by event-sourced aggregates.

pub mod event;

pub use event::Event;
