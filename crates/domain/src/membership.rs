//! Island ownership model.
//!
//! An island is owned either by a single profile or by a coop group. The
//! variant is resolved once, when the island aggregate is constructed, so the
//! load path never branches on a nullable group reference.

use serde::{Deserialize, Serialize};

use crate::ids::{CoopId, IslandId, ProfileId};

/// Who owns an island, resolved at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Membership {
    /// A single owner; the island id equals the owner's profile id.
    SingleOwner { owner: ProfileId },
    /// A coop group; the island id equals the coop's group id.
    Coop {
        coop: CoopId,
        members: Vec<ProfileId>,
    },
}

impl Membership {
    pub fn single_owner(owner: ProfileId) -> Self {
        Self::SingleOwner { owner }
    }

    pub fn coop(coop: CoopId, members: Vec<ProfileId>) -> Self {
        Self::Coop { coop, members }
    }

    /// The island identity implied by this ownership.
    pub fn island_id(&self) -> IslandId {
        match self {
            Self::SingleOwner { owner } => IslandId::from_profile(*owner),
            Self::Coop { coop, .. } => IslandId::from_uuid(coop.to_uuid()),
        }
    }

    pub fn is_coop(&self) -> bool {
        matches!(self, Self::Coop { .. })
    }

    /// All member profile identities. A single owner is a one-member group.
    pub fn member_profiles(&self) -> &[ProfileId] {
        match self {
            Self::SingleOwner { owner } => std::slice::from_ref(owner),
            Self::Coop { members, .. } => members,
        }
    }

    pub fn contains(&self, profile: ProfileId) -> bool {
        self.member_profiles().contains(&profile)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SingleOwner { .. } => "single_owner",
            Self::Coop { .. } => "coop",
        }
    }
}
