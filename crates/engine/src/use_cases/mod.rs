//! Application use cases over the island entities.

pub mod interaction;
pub mod teleport;
pub mod vacancy;

pub use interaction::{Interactable, InteractionOutcome, InteractionRouter};
pub use teleport::{TeleportOutcome, TeleportToIsland};
pub use vacancy::{VacancySweeper, DEFAULT_SWEEP_INTERVAL};
