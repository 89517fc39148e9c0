//! Database schema management for `swimsched-api`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the append-only `sessions_schedule_history` table and the
/// `comments` table read by the diagnostic fallback page. Safe to call on
/// every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // History log; every ingest appends, nothing updates or deletes
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions_schedule_history (
            pool_id           TEXT,
            updated_at        TIMESTAMPTZ,
            session_date      TEXT    NOT NULL,
            session_time      TEXT    NOT NULL,
            session_datetime  TEXT    NOT NULL,
            session_title     TEXT    NOT NULL,
            session_side      TEXT    NOT NULL CHECK (session_side IN ('LEFT', 'RIGHT')),
            available_spots   INTEGER NOT NULL,
            area              TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id      SERIAL PRIMARY KEY,
            author  TEXT NOT NULL,
            content TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // SEO highlight filter: pool + day list
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sessions_history_pool_date
            ON sessions_schedule_history (pool_id, session_date);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Latest-snapshot join
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sessions_history_identity
            ON sessions_schedule_history
               (pool_id, session_datetime, session_title, session_side, updated_at);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
