use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::model::{NewSummary, SummaryRecord};

/// Durable store for summary records.
///
/// Insertion is append-only and atomic: after a successful call the full
/// record is visible to readers, after a failed call none of it is.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn insert_summary(&self, new: NewSummary) -> Result<SummaryRecord>;

    /// All summaries for one user, newest first.
    async fn list_summaries(&self, user_id: &str) -> Result<Vec<SummaryRecord>>;

    async fn get_summary(&self, id: Uuid) -> Result<Option<SummaryRecord>>;
}

fn check_record_shape(new: &NewSummary) -> Result<()> {
    if new.title.trim().is_empty() || new.body.trim().is_empty() {
        return Err(PipelineError::Persistence(
            "summary records require a non-empty title and body".to_string(),
        ));
    }
    Ok(())
}

/// In-memory implementation of [`SummaryStore`].
pub struct InMemorySummaryStore {
    records: DashMap<Uuid, (u64, SummaryRecord)>,
    // Insertion sequence; orders records inserted within the same timestamp.
    seq: AtomicU64,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }
}

impl Default for InMemorySummaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn insert_summary(&self, new: NewSummary) -> Result<SummaryRecord> {
        check_record_shape(&new)?;
        let record = SummaryRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            body: new.body,
            source_file_url: new.source_file_url,
            source_file_name: new.source_file_name,
            created_at: Utc::now(),
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.records.insert(record.id, (seq, record.clone()));
        Ok(record)
    }

    async fn list_summaries(&self, user_id: &str) -> Result<Vec<SummaryRecord>> {
        let mut entries: Vec<(u64, SummaryRecord)> = self
            .records
            .iter()
            .filter(|entry| entry.value().1.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, record)| record).collect())
    }

    async fn get_summary(&self, id: Uuid) -> Result<Option<SummaryRecord>> {
        Ok(self.records.get(&id).map(|entry| entry.value().1.clone()))
    }
}

/// PostgreSQL implementation of [`SummaryStore`] backed by a `sqlx` pool.
pub struct PostgresSummaryStore {
    pool: PgPool,
}

impl PostgresSummaryStore {
    /// Connect and make sure the `pdf_summaries` table exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| PipelineError::Persistence(format!("failed to connect: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pdf_summaries (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                source_file_url TEXT NOT NULL,
                source_file_name TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| PipelineError::Persistence(format!("failed to ensure schema: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SummaryStore for PostgresSummaryStore {
    async fn insert_summary(&self, new: NewSummary) -> Result<SummaryRecord> {
        check_record_shape(&new)?;
        // Single statement, so the write is atomic.
        let record = sqlx::query_as::<_, SummaryRecord>(
            r#"
            INSERT INTO pdf_summaries (user_id, title, body, source_file_url, source_file_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, body, source_file_url, source_file_name, created_at
            "#,
        )
        .bind(&new.user_id)
        .bind(&new.title)
        .bind(&new.body)
        .bind(&new.source_file_url)
        .bind(&new.source_file_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        Ok(record)
    }

    async fn list_summaries(&self, user_id: &str) -> Result<Vec<SummaryRecord>> {
        let records = sqlx::query_as::<_, SummaryRecord>(
            r#"
            SELECT id, user_id, title, body, source_file_url, source_file_name, created_at
            FROM pdf_summaries
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        Ok(records)
    }

    async fn get_summary(&self, id: Uuid) -> Result<Option<SummaryRecord>> {
        let record = sqlx::query_as::<_, SummaryRecord>(
            r#"
            SELECT id, user_id, title, body, source_file_url, source_file_name, created_at
            FROM pdf_summaries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_summary(user_id: &str, title: &str) -> NewSummary {
        NewSummary {
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: "## Key points\n- something".to_string(),
            source_file_url: "https://files.example/abc.pdf".to_string(),
            source_file_name: "abc.pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemorySummaryStore::new();
        let record = store
            .insert_summary(new_summary("user_1", "First"))
            .await
            .unwrap();

        let fetched = store.get_summary(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "First");
        assert_eq!(fetched.user_id, "user_1");
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_user() {
        let store = InMemorySummaryStore::new();
        store
            .insert_summary(new_summary("user_1", "Older"))
            .await
            .unwrap();
        store
            .insert_summary(new_summary("user_1", "Newer"))
            .await
            .unwrap();
        store
            .insert_summary(new_summary("user_2", "Other"))
            .await
            .unwrap();

        let summaries = store.list_summaries("user_1").await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].title, "Newer");
        assert_eq!(summaries[1].title, "Older");
    }

    #[tokio::test]
    async fn rejects_empty_title_or_body() {
        let store = InMemorySummaryStore::new();

        let mut no_title = new_summary("user_1", "");
        no_title.title = "  ".to_string();
        assert!(matches!(
            store.insert_summary(no_title).await,
            Err(PipelineError::Persistence(_))
        ));

        let mut no_body = new_summary("user_1", "Title");
        no_body.body = String::new();
        assert!(matches!(
            store.insert_summary(no_body).await,
            Err(PipelineError::Persistence(_))
        ));
    }
}
