//! Metadata store trait and the SQLite implementation.

use crate::error::MetadataResult;
use crate::repos::{QuestRepo, ScoreRepo, UploadRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: QuestRepo + ScoreRepo + UploadRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
///
/// Recommended for tests and single-node deployments; multi-replica
/// deployments should use PostgreSQL so the uniqueness constraint arbitrates
/// concurrent submissions across processes.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Repository implementations for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::error::MetadataError;
    use crate::models::{QuestRow, ScoreRecordRow, UploadRecordRow};
    use uuid::Uuid;
    use wayquest_core::{QuestType, Region};

    #[async_trait]
    impl QuestRepo for SqliteStore {
        async fn create_quest(&self, quest: &QuestRow) -> MetadataResult<()> {
            // Exactly one of two shapes is valid: all four option slots hold
            // the photo sentinel, or the options are meaningfully distinct.
            QuestType::classify([
                quest.option_a.as_str(),
                quest.option_b.as_str(),
                quest.option_c.as_str(),
                quest.option_d.as_str(),
            ])
            .map_err(|e| MetadataError::InvalidQuest(e.to_string()))?;

            if self.get_quest(quest.quest_id).await?.is_some() {
                return Err(MetadataError::AlreadyExists(format!(
                    "quest_id {} already exists",
                    quest.quest_id
                )));
            }

            sqlx::query(
                "INSERT INTO quests (quest_id, city, town, village, question, \
                 option_a, option_b, option_c, option_d, correct_answer, score, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(quest.quest_id)
            .bind(&quest.city)
            .bind(&quest.town)
            .bind(&quest.village)
            .bind(&quest.question)
            .bind(&quest.option_a)
            .bind(&quest.option_b)
            .bind(&quest.option_c)
            .bind(&quest.option_d)
            .bind(&quest.correct_answer)
            .bind(quest.score)
            .bind(quest.created_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_quest(&self, quest_id: Uuid) -> MetadataResult<Option<QuestRow>> {
            let row = sqlx::query_as::<_, QuestRow>("SELECT * FROM quests WHERE quest_id = ?")
                .bind(quest_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_quests_in_region(&self, region: &Region) -> MetadataResult<Vec<QuestRow>> {
            // Exact string equality at every supplied level; omitted levels
            // are unconstrained. A quest keyed at a coarser level (NULL town
            // or village) applies to every finer sub-region beneath it.
            let mut sql = String::from("SELECT * FROM quests WHERE city = ?");
            if region.town.is_some() {
                sql.push_str(" AND (town IS NULL OR town = ?)");
            }
            if region.village.is_some() {
                sql.push_str(" AND (village IS NULL OR village = ?)");
            }
            sql.push_str(" ORDER BY created_at");

            let mut query = sqlx::query_as::<_, QuestRow>(&sql).bind(&region.city);
            if let Some(town) = &region.town {
                query = query.bind(town);
            }
            if let Some(village) = &region.village {
                query = query.bind(village);
            }

            let rows = query.fetch_all(&self.pool).await?;
            Ok(rows)
        }

        async fn list_regions_with_quests(&self) -> MetadataResult<Vec<Region>> {
            let rows: Vec<(String, Option<String>, Option<String>)> = sqlx::query_as(
                "SELECT DISTINCT city, town, village FROM quests ORDER BY city, town, village",
            )
            .fetch_all(&self.pool)
            .await?;

            Ok(rows
                .into_iter()
                .map(|(city, town, village)| Region::new(city, town, village))
                .collect())
        }
    }

    #[async_trait]
    impl ScoreRepo for SqliteStore {
        async fn insert_score_if_absent(&self, record: &ScoreRecordRow) -> MetadataResult<bool> {
            let result = sqlx::query(
                "INSERT INTO score_records (record_id, user_id, quest_id, city, town, village, \
                 question, user_answer, correct_answer, awarded_score, answered_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (user_id, quest_id) DO NOTHING",
            )
            .bind(record.record_id)
            .bind(&record.user_id)
            .bind(record.quest_id)
            .bind(&record.city)
            .bind(&record.town)
            .bind(&record.village)
            .bind(&record.question)
            .bind(&record.user_answer)
            .bind(&record.correct_answer)
            .bind(record.awarded_score)
            .bind(record.answered_at)
            .execute(&self.pool)
            .await?;

            // Zero rows affected means a prior record won; that is success.
            Ok(result.rows_affected() == 1)
        }

        async fn get_score(
            &self,
            user_id: &str,
            quest_id: Uuid,
        ) -> MetadataResult<Option<ScoreRecordRow>> {
            let row = sqlx::query_as::<_, ScoreRecordRow>(
                "SELECT * FROM score_records WHERE user_id = ? AND quest_id = ?",
            )
            .bind(user_id)
            .bind(quest_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn list_scores_for_user(
            &self,
            user_id: &str,
        ) -> MetadataResult<Vec<ScoreRecordRow>> {
            let rows = sqlx::query_as::<_, ScoreRecordRow>(
                "SELECT * FROM score_records WHERE user_id = ? ORDER BY answered_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl UploadRepo for SqliteStore {
        async fn create_upload(&self, upload: &UploadRecordRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO upload_records (upload_id, user_id, quest_id, object_key, \
                 byte_size, content_type, uploaded_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(upload.upload_id)
            .bind(&upload.user_id)
            .bind(upload.quest_id)
            .bind(&upload.object_key)
            .bind(upload.byte_size)
            .bind(&upload.content_type)
            .bind(upload.uploaded_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn latest_upload_for_quest(
            &self,
            user_id: &str,
            quest_id: Uuid,
        ) -> MetadataResult<Option<UploadRecordRow>> {
            let row = sqlx::query_as::<_, UploadRecordRow>(
                "SELECT * FROM upload_records WHERE user_id = ? AND quest_id = ? \
                 ORDER BY uploaded_at DESC, upload_id DESC LIMIT 1",
            )
            .bind(user_id)
            .bind(quest_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn list_uploads_with_quest(&self) -> MetadataResult<Vec<UploadRecordRow>> {
            let rows = sqlx::query_as::<_, UploadRecordRow>(
                "SELECT * FROM upload_records WHERE quest_id IS NOT NULL ORDER BY uploaded_at",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}

/// SQLite schema (embedded).
const SCHEMA_SQL: &str = r#"
-- Quest catalog
CREATE TABLE IF NOT EXISTS quests (
    quest_id BLOB PRIMARY KEY,
    city TEXT NOT NULL,
    town TEXT,
    village TEXT,
    question TEXT NOT NULL,
    option_a TEXT NOT NULL,
    option_b TEXT NOT NULL,
    option_c TEXT NOT NULL,
    option_d TEXT NOT NULL,
    correct_answer TEXT NOT NULL,
    score INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_quests_region ON quests(city, town, village);

-- Write-once score ledger: at most one record per (user_id, quest_id).
CREATE TABLE IF NOT EXISTS score_records (
    record_id BLOB PRIMARY KEY,
    user_id TEXT NOT NULL,
    quest_id BLOB NOT NULL REFERENCES quests(quest_id) ON DELETE CASCADE,
    city TEXT NOT NULL,
    town TEXT,
    village TEXT,
    question TEXT NOT NULL,
    user_answer TEXT NOT NULL,
    correct_answer TEXT NOT NULL,
    awarded_score INTEGER NOT NULL,
    answered_at TEXT NOT NULL,
    UNIQUE (user_id, quest_id)
);
CREATE INDEX IF NOT EXISTS idx_score_records_user ON score_records(user_id, answered_at);

-- Uploaded media records
CREATE TABLE IF NOT EXISTS upload_records (
    upload_id BLOB PRIMARY KEY,
    user_id TEXT NOT NULL,
    quest_id BLOB REFERENCES quests(quest_id) ON DELETE CASCADE,
    object_key TEXT NOT NULL,
    byte_size INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_upload_records_user_quest ON upload_records(user_id, quest_id, uploaded_at);
"#;
