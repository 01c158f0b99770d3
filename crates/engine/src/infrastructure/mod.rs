//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod codec;
pub mod event_bus;
pub mod membership;
pub mod ports;
pub mod store;
pub mod template;
