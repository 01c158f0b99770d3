//! SQLite-backed island record storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyhold_domain::IslandId;
use sqlx::{Row, SqlitePool};

use crate::infrastructure::ports::{IslandRecord, IslandStore, StoreError};

/// SQLite implementation of the island document store.
///
/// Each record field lives in its own column and is upserted independently,
/// so a crash between writes leaves a partial but readable record.
pub struct SqliteIslandStore {
    pool: SqlitePool,
}

impl SqliteIslandStore {
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| StoreError::database("islands", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS islands (
                island_id TEXT PRIMARY KEY,
                data BLOB,
                last_saved TEXT,
                version INTEGER
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::database("islands", e))?;

        Ok(Self { pool })
    }

    async fn upsert_field(
        &self,
        island: IslandId,
        query: &str,
        bind: FieldValue<'_>,
    ) -> Result<(), StoreError> {
        let q = sqlx::query(query).bind(island.to_string());
        let q = match bind {
            FieldValue::Blob(data) => q.bind(data),
            FieldValue::Text(text) => q.bind(text),
            FieldValue::Int(value) => q.bind(value),
        };
        q.execute(&self.pool)
            .await
            .map_err(|e| StoreError::database("islands", e))?;
        Ok(())
    }
}

enum FieldValue<'a> {
    Blob(&'a [u8]),
    Text(String),
    Int(i32),
}

#[async_trait]
impl IslandStore for SqliteIslandStore {
    async fn fetch(&self, island: IslandId) -> Result<Option<IslandRecord>, StoreError> {
        let row = sqlx::query("SELECT data, last_saved, version FROM islands WHERE island_id = ?")
            .bind(island.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::database("islands", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: Option<Vec<u8>> = row.get("data");
        let last_saved: Option<String> = row.get("last_saved");
        let version: Option<i32> = row.get("version");

        let last_saved = match last_saved {
            Some(text) => Some(
                DateTime::parse_from_rfc3339(&text)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StoreError::serialization(e))?,
            ),
            None => None,
        };

        Ok(Some(IslandRecord {
            data,
            last_saved,
            version,
        }))
    }

    async fn put_snapshot(&self, island: IslandId, data: &[u8]) -> Result<(), StoreError> {
        self.upsert_field(
            island,
            r#"
            INSERT INTO islands (island_id, data) VALUES (?, ?)
            ON CONFLICT(island_id) DO UPDATE SET data = excluded.data
            "#,
            FieldValue::Blob(data),
        )
        .await
    }

    async fn put_last_saved(
        &self,
        island: IslandId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.upsert_field(
            island,
            r#"
            INSERT INTO islands (island_id, last_saved) VALUES (?, ?)
            ON CONFLICT(island_id) DO UPDATE SET last_saved = excluded.last_saved
            "#,
            FieldValue::Text(at.to_rfc3339()),
        )
        .await
    }

    async fn put_version(&self, island: IslandId, version: i32) -> Result<(), StoreError> {
        self.upsert_field(
            island,
            r#"
            INSERT INTO islands (island_id, version) VALUES (?, ?)
            ON CONFLICT(island_id) DO UPDATE SET version = excluded.version
            "#,
            FieldValue::Int(version),
        )
        .await
    }
}

/// In-memory store for state machine tests.
#[cfg(test)]
pub struct InMemoryIslandStore {
    records: dashmap::DashMap<IslandId, IslandRecord>,
}

#[cfg(test)]
impl InMemoryIslandStore {
    pub fn new() -> Self {
        Self {
            records: dashmap::DashMap::new(),
        }
    }

    /// Seed a record directly, bypassing the trait.
    pub fn insert(&self, island: IslandId, record: IslandRecord) {
        self.records.insert(island, record);
    }

    pub fn record(&self, island: IslandId) -> Option<IslandRecord> {
        self.records.get(&island).map(|r| r.clone())
    }
}

#[cfg(test)]
impl Default for InMemoryIslandStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[async_trait]
impl IslandStore for InMemoryIslandStore {
    async fn fetch(&self, island: IslandId) -> Result<Option<IslandRecord>, StoreError> {
        Ok(self.records.get(&island).map(|r| r.clone()))
    }

    async fn put_snapshot(&self, island: IslandId, data: &[u8]) -> Result<(), StoreError> {
        self.records.entry(island).or_default().data = Some(data.to_vec());
        Ok(())
    }

    async fn put_last_saved(
        &self,
        island: IslandId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.records.entry(island).or_default().last_saved = Some(at);
        Ok(())
    }

    async fn put_version(&self, island: IslandId, version: i32) -> Result<(), StoreError> {
        self.records.entry(island).or_default().version = Some(version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn temp_store() -> (tempfile::TempDir, SqliteIslandStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("islands.db");
        let store = SqliteIslandStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn fetch_returns_none_for_unknown_island() {
        let (_dir, store) = temp_store().await;
        let record = store.fetch(IslandId::new()).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn all_fields_round_trip() {
        let (_dir, store) = temp_store().await;
        let island = IslandId::new();
        let saved_at = Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap();

        store.put_snapshot(island, &[1, 2, 3]).await.unwrap();
        store.put_last_saved(island, saved_at).await.unwrap();
        store.put_version(island, 2).await.unwrap();

        let record = store.fetch(island).await.unwrap().unwrap();
        assert_eq!(record.data.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(record.last_saved, Some(saved_at));
        assert_eq!(record.version, Some(2));
    }

    #[tokio::test]
    async fn field_upserts_are_independent() {
        let (_dir, store) = temp_store().await;
        let island = IslandId::new();

        // Only a version write: the record exists but carries no blob.
        store.put_version(island, 1).await.unwrap();
        let record = store.fetch(island).await.unwrap().unwrap();
        assert!(record.data.is_none());
        assert!(record.last_saved.is_none());
        assert_eq!(record.version, Some(1));

        // A later blob write must not clobber the version.
        store.put_snapshot(island, &[9]).await.unwrap();
        let record = store.fetch(island).await.unwrap().unwrap();
        assert_eq!(record.data.as_deref(), Some(&[9u8][..]));
        assert_eq!(record.version, Some(1));
    }

    #[tokio::test]
    async fn snapshot_updates_overwrite_previous_blob() {
        let (_dir, store) = temp_store().await;
        let island = IslandId::new();

        store.put_snapshot(island, &[1]).await.unwrap();
        store.put_snapshot(island, &[2, 2]).await.unwrap();

        let record = store.fetch(island).await.unwrap().unwrap();
        assert_eq!(record.data.as_deref(), Some(&[2u8, 2][..]));
    }
}
