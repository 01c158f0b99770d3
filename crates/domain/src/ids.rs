use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// A player's profile identity. Stable across sessions.
define_id!(ProfileId);

// Island identity. For a solo island this is the owning profile's UUID.
define_id!(IslandId);

// Coop group identity.
define_id!(CoopId);

impl IslandId {
    /// Identity of a solo island: equal to the owning member's profile identity.
    pub fn from_profile(profile: ProfileId) -> Self {
        Self(profile.to_uuid())
    }

    /// The owning profile identity implied by a solo island's id.
    pub fn owner_profile(&self) -> ProfileId {
        ProfileId::from_uuid(self.0)
    }
}
