// SQLite store for app-local preferences. A single row holds the versioned blob;
// fleet data is never written here.

mod blob;

use crate::models::Preferences;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{instrument, warn};

pub struct PreferencesRepo {
    pool: SqlitePool,
}

impl PreferencesRepo {
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS preferences (id INTEGER PRIMARY KEY CHECK (id = 1), data BLOB NOT NULL, updated_at INTEGER NOT NULL)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stored preferences, or `None` if nothing usable was saved yet.
    ///
    /// A blob written by another format version is ignored with a warning.
    #[instrument(skip(self), fields(repo = "preferences", operation = "load"))]
    pub async fn load(&self) -> anyhow::Result<Option<Preferences>> {
        let row = sqlx::query("SELECT data FROM preferences WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let data: Vec<u8> = row.try_get("data")?;
        let Some(payload) = blob::blob_payload(&data, blob::BLOB_VERSION_PREFERENCES) else {
            warn!(
                version = blob::blob_version(&data),
                "Ignoring preferences stored with unsupported version"
            );
            return Ok(None);
        };
        let preferences = wincode::deserialize(payload)
            .map_err(|e| anyhow::anyhow!("wincode deserialize preferences: {}", e))?;
        Ok(Some(preferences))
    }

    /// Stored preferences, falling back to defaults.
    pub async fn load_or_default(&self) -> anyhow::Result<Preferences> {
        Ok(self.load().await?.unwrap_or_default())
    }

    #[instrument(skip(self, preferences), fields(repo = "preferences", operation = "save"))]
    pub async fn save(&self, preferences: &Preferences) -> anyhow::Result<()> {
        let data = blob::with_version_prefix(
            blob::BLOB_VERSION_PREFERENCES,
            wincode::serialize(preferences).map_err(|e| anyhow::anyhow!("wincode: {}", e))?,
        );
        let updated_at = chrono::Utc::now().timestamp_millis();
        sqlx::query("INSERT OR REPLACE INTO preferences (id, data, updated_at) VALUES (1, $1, $2)")
            .bind(&data)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM preferences WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
