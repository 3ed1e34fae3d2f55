//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{QuestRow, ScoreRecordRow, UploadRecordRow};
use crate::repos::{QuestRepo, ScoreRepo, UploadRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use uuid::Uuid;
use wayquest_core::{QuestType, Region};

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(url: &str, max_connections: u32) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared
        // statement, so the schema is split and executed statement by statement.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl QuestRepo for PostgresStore {
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

        sqlx::query(
            "INSERT INTO quests (quest_id, city, town, village, question, \
             option_a, option_b, option_c, option_d, correct_answer, score, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
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
        let row = sqlx::query_as::<_, QuestRow>("SELECT * FROM quests WHERE quest_id = $1")
            .bind(quest_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_quests_in_region(&self, region: &Region) -> MetadataResult<Vec<QuestRow>> {
        // Exact string equality at every supplied level; omitted levels are
        // unconstrained. A quest keyed at a coarser level (NULL town or
        // village) applies to every finer sub-region beneath it.
        let mut sql = String::from("SELECT * FROM quests WHERE city = $1");
        let mut next_param = 2;
        if region.town.is_some() {
            sql.push_str(&format!(" AND (town IS NULL OR town = ${next_param})"));
            next_param += 1;
        }
        if region.village.is_some() {
            sql.push_str(&format!(" AND (village IS NULL OR village = ${next_param})"));
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
impl ScoreRepo for PostgresStore {
    async fn insert_score_if_absent(&self, record: &ScoreRecordRow) -> MetadataResult<bool> {
        let result = sqlx::query(
            "INSERT INTO score_records (record_id, user_id, quest_id, city, town, village, \
             question, user_answer, correct_answer, awarded_score, answered_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
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
            "SELECT * FROM score_records WHERE user_id = $1 AND quest_id = $2",
        )
        .bind(user_id)
        .bind(quest_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_scores_for_user(&self, user_id: &str) -> MetadataResult<Vec<ScoreRecordRow>> {
        let rows = sqlx::query_as::<_, ScoreRecordRow>(
            "SELECT * FROM score_records WHERE user_id = $1 ORDER BY answered_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl UploadRepo for PostgresStore {
    async fn create_upload(&self, upload: &UploadRecordRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO upload_records (upload_id, user_id, quest_id, object_key, \
             byte_size, content_type, uploaded_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
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
            "SELECT * FROM upload_records WHERE user_id = $1 AND quest_id = $2 \
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_statements() {
        let statements = postgres_schema_statements(POSTGRES_SCHEMA);
        assert!(statements.len() >= 3);
        assert!(statements.iter().any(|s| s.contains("CREATE TABLE IF NOT EXISTS quests")));
        assert!(statements.iter().any(|s| s.contains("score_records")));
    }

    #[test]
    fn comment_only_fragments_are_dropped() {
        let statements = postgres_schema_statements("-- comment only\n;\nSELECT 1;");
        assert_eq!(statements, vec!["SELECT 1"]);
    }
}
