//! Island lifecycle events.
//!
//! Coarse-grained notifications published when an island crosses a
//! persistence boundary. Consumers (economy hooks, analytics, logging)
//! subscribe through the engine's event bus; publishing is fire-and-forget.

use serde::{Deserialize, Serialize};

use crate::ids::{IslandId, ProfileId};

/// Notification of a significant island persistence transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IslandEvent {
    /// An island was materialized for the first time, from the template.
    FirstCreated {
        island_id: IslandId,
        coop: bool,
        members: Vec<ProfileId>,
    },
    /// An island's stored record was loaded into a runtime instance.
    FetchedFromDatabase {
        island_id: IslandId,
        coop: bool,
        online: Vec<ProfileId>,
        members: Vec<ProfileId>,
    },
    /// An island's runtime state was written back to the store.
    SavedIntoDatabase {
        island_id: IslandId,
        coop: bool,
        members: Vec<ProfileId>,
    },
}

impl IslandEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FirstCreated { .. } => "island_first_created",
            Self::FetchedFromDatabase { .. } => "island_fetched_from_database",
            Self::SavedIntoDatabase { .. } => "island_saved_into_database",
        }
    }

    pub fn island_id(&self) -> IslandId {
        match self {
            Self::FirstCreated { island_id, .. }
            | Self::FetchedFromDatabase { island_id, .. }
            | Self::SavedIntoDatabase { island_id, .. } => *island_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names_are_stable() {
        let island_id = IslandId::new();
        let event = IslandEvent::FirstCreated {
            island_id,
            coop: false,
            members: vec![island_id.owner_profile()],
        };
        assert_eq!(event.event_type(), "island_first_created");
        assert_eq!(event.island_id(), island_id);
    }

    #[test]
    fn events_serialize_with_camel_case_fields() {
        let event = IslandEvent::SavedIntoDatabase {
            island_id: IslandId::new(),
            coop: true,
            members: vec![],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("savedIntoDatabase"));
        assert!(json.contains("islandId"));
    }
}
