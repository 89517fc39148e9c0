use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::{SessionStore, EXCLUDED_TITLE_MARKERS};
use crate::{Comment, RankedSession, SessionRecord, WriteResult};

// ---

const INSERT_SESSION: &str = r#"
    INSERT INTO sessions_schedule_history (
        pool_id, updated_at, session_date, session_time, session_datetime,
        session_title, session_side, available_spots, area
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

/// Collapse history to the latest snapshot per session, rank each pool's
/// sessions by open spots and keep the top `$4`.
///
/// `$1` day list (`text[]`), `$2` pool id, `$3` excluded title patterns,
/// `$4` rank cutoff.
const SEO_HIGHLIGHTS: &str = r#"
    WITH latest_session_updates AS (
        SELECT
            pool_id,
            session_datetime,
            session_title,
            session_side,
            MAX(updated_at) AS latest_updated_at
        FROM sessions_schedule_history
        WHERE session_date = ANY($1)
          AND pool_id = $2
          AND session_title NOT ILIKE ALL($3)
        GROUP BY pool_id, session_datetime, session_title, session_side
    ),
    filtered_latest_records AS (
        SELECT h.*
        FROM sessions_schedule_history h
        JOIN latest_session_updates l
          ON h.pool_id = l.pool_id
         AND h.session_datetime = l.session_datetime
         AND h.session_title = l.session_title
         AND h.session_side = l.session_side
         AND h.updated_at = l.latest_updated_at
    ),
    ranked_records AS (
        SELECT
            *,
            ROW_NUMBER() OVER (
                PARTITION BY pool_id
                ORDER BY available_spots DESC, updated_at DESC
            ) AS rn
        FROM filtered_latest_records
    )
    SELECT *
    FROM ranked_records
    WHERE rn <= $4
    ORDER BY pool_id, session_datetime DESC, available_spots DESC
"#;

/// [`SessionStore`] backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_session<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    record: &'q SessionRecord,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    // ---
    query
        .bind(&record.pool_id)
        .bind(record.updated_at)
        .bind(&record.session_date)
        .bind(&record.session_time)
        .bind(&record.session_datetime)
        .bind(&record.session_title)
        .bind(record.session_side.as_str())
        .bind(record.available_spots)
        .bind(&record.area)
}

fn excluded_title_patterns() -> Vec<String> {
    EXCLUDED_TITLE_MARKERS
        .iter()
        .map(|marker| format!("%{marker}%"))
        .collect()
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert_session(&self, record: &SessionRecord) -> Result<WriteResult> {
        // ---
        let done = bind_session(sqlx::query(INSERT_SESSION), record)
            .execute(&self.pool)
            .await
            .context("Failed to insert session")?;

        Ok(WriteResult {
            rows_affected: done.rows_affected(),
        })
    }

    async fn insert_sessions(&self, records: &[SessionRecord]) -> Result<Vec<WriteResult>> {
        // ---
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            let done = bind_session(sqlx::query(INSERT_SESSION), record)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert session at index {i}"))?;
            results.push(WriteResult {
                rows_affected: done.rows_affected(),
            });
        }

        tx.commit().await.context("Failed to commit session batch")?;
        Ok(results)
    }

    async fn list_sessions(&self, limit: i64) -> Result<Vec<SessionRecord>> {
        // ---
        let rows = sqlx::query_as::<_, SessionRecord>(
            "SELECT * FROM sessions_schedule_history LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn seo_highlights(
        &self,
        dates: &[String],
        pool_id: &str,
        top_x: i64,
    ) -> Result<Vec<RankedSession>> {
        // ---
        let rows = sqlx::query_as::<_, RankedSession>(SEO_HIGHLIGHTS)
            .bind(dates)
            .bind(pool_id)
            .bind(excluded_title_patterns())
            .bind(top_x)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn sample_comments(&self, limit: i64) -> Result<Vec<Comment>> {
        // ---
        let rows = sqlx::query_as::<_, Comment>(
            "SELECT id, author, content FROM comments ORDER BY id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
