//! Skyhold Engine library.
//!
//! Server-side runtime for Skyhold's per-group island worlds: lazy
//! materialization, shared live instances, vacancy eviction and persistence.
//!
//! ## Structure
//!
//! - `entities/` - Island state machine, runtime instances and the registry
//! - `use_cases/` - Teleport, interaction gating and the vacancy sweeper
//! - `sessions` - Connected player sessions and the readiness gate
//! - `infrastructure/` - Port traits and their SQLite/CBOR/file adapters
//! - `app` - Application composition

pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod sessions;
pub mod use_cases;

/// Shared fixtures for the inline test modules.
#[cfg(test)]
pub mod test_fixtures;

pub use app::{App, AppConfig};
