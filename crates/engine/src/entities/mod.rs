//! Stateful runtime entities: islands, their live instances, and the
//! registry that owns them.

pub mod instance;
pub mod island;
pub mod registry;

pub use instance::IslandInstance;
pub use island::{Island, LoadError, PersistError, VacancyOutcome};
pub use registry::{IslandConfig, IslandContext, IslandRegistry, SaveAllReport};
