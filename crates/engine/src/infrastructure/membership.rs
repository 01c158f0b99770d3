//! SQLite-backed membership resolution.
//!
//! Coop groups live in a `coops` table keyed by island identity, with the
//! member list stored as a JSON array of profile UUIDs. An island without a
//! coop row is a single-owner island, whose owner is implied by the island id
//! itself. Resolution never errors: lookup failures degrade to single-owner
//! and are logged.

use std::sync::Arc;

use async_trait::async_trait;
use skyhold_domain::{CoopId, IslandId, Membership, ProfileId};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::infrastructure::ports::{MembershipResolver, StoreError};
use crate::sessions::{PlayerSession, SessionDirectory};

pub struct SqliteMembershipResolver {
    pool: SqlitePool,
    sessions: Arc<SessionDirectory>,
}

impl SqliteMembershipResolver {
    pub async fn new(
        db_path: &str,
        sessions: Arc<SessionDirectory>,
    ) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| StoreError::database("coops", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coops (
                island_id TEXT PRIMARY KEY,
                coop_id TEXT NOT NULL,
                members_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::database("coops", e))?;

        Ok(Self { pool, sessions })
    }

    /// Register or replace a coop group for an island.
    pub async fn put_coop(
        &self,
        island: IslandId,
        coop: CoopId,
        members: &[ProfileId],
    ) -> Result<(), StoreError> {
        let members_json =
            serde_json::to_string(members).map_err(|e| StoreError::serialization(e))?;

        sqlx::query(
            r#"
            INSERT INTO coops (island_id, coop_id, members_json) VALUES (?, ?, ?)
            ON CONFLICT(island_id) DO UPDATE SET
                coop_id = excluded.coop_id,
                members_json = excluded.members_json
            "#,
        )
        .bind(island.to_string())
        .bind(coop.to_string())
        .bind(members_json)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("coops", e))?;

        Ok(())
    }

    async fn lookup_coop(&self, island: IslandId) -> Result<Option<Membership>, StoreError> {
        let row = sqlx::query("SELECT coop_id, members_json FROM coops WHERE island_id = ?")
            .bind(island.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::database("coops", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let coop_id: String = row.get("coop_id");
        let members_json: String = row.get("members_json");

        let coop = Uuid::parse_str(&coop_id)
            .map(CoopId::from_uuid)
            .map_err(|e| StoreError::serialization(e))?;
        let members: Vec<ProfileId> =
            serde_json::from_str(&members_json).map_err(|e| StoreError::serialization(e))?;

        Ok(Some(Membership::coop(coop, members)))
    }
}

#[async_trait]
impl MembershipResolver for SqliteMembershipResolver {
    async fn resolve(&self, island: IslandId) -> Membership {
        match self.lookup_coop(island).await {
            Ok(Some(membership)) => membership,
            Ok(None) => Membership::single_owner(island.owner_profile()),
            Err(e) => {
                tracing::warn!(
                    island_id = %island,
                    error = %e,
                    "Coop lookup failed, treating island as single-owner"
                );
                Membership::single_owner(island.owner_profile())
            }
        }
    }

    fn online_members(&self, membership: &Membership) -> Vec<Arc<PlayerSession>> {
        membership
            .member_profiles()
            .iter()
            .filter_map(|profile| self.sessions.get(*profile))
            .collect()
    }
}
