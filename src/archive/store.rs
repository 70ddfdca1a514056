//! SQLite-backed snapshot store
//!
//! Each bucket is a table of `(date, payload)` rows with the date as primary
//! key. The store keeps an in-memory copy of the sorted key list (the date
//! index) that is rebuilt after every write.

use std::path::Path;

use log::{debug, info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::RwLock;

use super::{ArchiveError, DateKey};

/// Bucket used when none is configured
pub const DEFAULT_BUCKET: &str = "snapshots";

/// Durable, date-keyed snapshot storage
#[derive(Debug)]
pub struct SnapshotStore {
    pool: SqlitePool,
    bucket: String,
    index: RwLock<Vec<DateKey>>,
}

impl SnapshotStore {
    /// Opens (or creates) the database at `path` and ensures `bucket` exists
    ///
    /// # Arguments
    /// * `path` - SQLite database file; created if missing
    /// * `bucket` - Table holding the snapshots
    ///
    /// # Returns
    /// * `Ok(SnapshotStore)` with the date index already loaded
    /// * `Err(ArchiveError)` if the bucket name is invalid or the database fails
    pub async fn open(path: impl AsRef<Path>, bucket: &str) -> Result<Self, ArchiveError> {
        validate_bucket(bucket)?;

        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            bucket: bucket.to_string(),
            index: RwLock::new(Vec::new()),
        };
        store.init().await?;
        store.refresh_index().await?;

        info!(
            "Opened snapshot store {} (bucket '{}', {} snapshots)",
            path.display(),
            store.bucket,
            store.index.read().await.len()
        );
        Ok(store)
    }

    async fn init(&self) -> Result<(), ArchiveError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                date TEXT PRIMARY KEY NOT NULL,
                payload BLOB NOT NULL
            )",
            self.bucket
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Name of the bucket this store reads and writes
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Writes the payload for `key`, replacing any earlier one
    pub async fn put(&self, key: &DateKey, payload: &[u8]) -> Result<(), ArchiveError> {
        let sql = format!(
            "INSERT OR REPLACE INTO \"{}\" (date, payload) VALUES (?, ?)",
            self.bucket
        );
        sqlx::query(&sql)
            .bind(key.to_string())
            .bind(payload)
            .execute(&self.pool)
            .await?;
        debug!("Stored {} bytes under {}", payload.len(), key);

        self.refresh_index().await
    }

    /// Reads the payload stored for `key`
    ///
    /// # Returns
    /// * `Ok(bytes)` if a snapshot exists
    /// * `Err(ArchiveError::NotFound)` if there is none for that date
    /// * `Err(ArchiveError::Storage)` if the database fails
    pub async fn get(&self, key: &DateKey) -> Result<Vec<u8>, ArchiveError> {
        let sql = format!("SELECT payload FROM \"{}\" WHERE date = ?", self.bucket);
        sqlx::query_scalar::<_, Vec<u8>>(&sql)
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ArchiveError::NotFound(*key))
    }

    /// Scans the bucket for every stored date, oldest first
    pub async fn list_keys(&self) -> Result<Vec<DateKey>, ArchiveError> {
        let sql = format!("SELECT date FROM \"{}\" ORDER BY date", self.bucket);
        let rows = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let keys = rows
            .iter()
            .filter_map(|raw| match raw.parse::<DateKey>() {
                Ok(key) => Some(key),
                Err(_) => {
                    warn!("Skipping snapshot row with invalid date '{}'", raw);
                    None
                }
            })
            .collect();
        Ok(keys)
    }

    /// Rebuilds the in-memory date index from storage
    pub async fn refresh_index(&self) -> Result<(), ArchiveError> {
        let keys = self.list_keys().await?;
        *self.index.write().await = keys;
        Ok(())
    }

    /// Copy of the cached date index, oldest first
    pub async fn dates(&self) -> Vec<DateKey> {
        self.index.read().await.clone()
    }
}

/// Bucket names are quoted into SQL, so only identifier characters pass.
/// The `sqlite_` prefix is reserved for SQLite's own tables.
pub fn validate_bucket(bucket: &str) -> Result<(), ArchiveError> {
    let mut chars = bucket.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    } && !bucket.to_ascii_lowercase().starts_with("sqlite_");

    if valid {
        Ok(())
    } else {
        Err(ArchiveError::InvalidBucket(bucket.to_string()))
    }
}
