//! Database gateway used by every handler.
//!
//! Handlers only see [`SessionStore`]; the concrete backend is chosen in
//! `main.rs` and handed to the router as state.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::{Comment, RankedSession, SessionRecord, WriteResult};

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgSessionStore;

/// Shared handle passed through router state.
pub type Store = Arc<dyn SessionStore>;

/// Title substrings that disqualify a session from SEO highlights.
/// Matched case-insensitively.
pub const EXCLUDED_TITLE_MARKERS: [&str; 3] = ["Beginner", "מתחיל", "Coach"];

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append one snapshot.
    async fn insert_session(&self, record: &SessionRecord) -> Result<WriteResult>;

    /// Append many snapshots as one unit; either all rows land or none do.
    async fn insert_sessions(&self, records: &[SessionRecord]) -> Result<Vec<WriteResult>>;

    /// Up to `limit` stored rows in storage order.
    async fn list_sessions(&self, limit: i64) -> Result<Vec<SessionRecord>>;

    /// Latest snapshot per session for `pool_id` on any of `dates`
    /// (`dd-mm-yyyy`), ranked by availability, at most `top_x` per pool.
    async fn seo_highlights(
        &self,
        dates: &[String],
        pool_id: &str,
        top_x: i64,
    ) -> Result<Vec<RankedSession>>;

    /// First `limit` rows of the diagnostic comments table.
    async fn sample_comments(&self, limit: i64) -> Result<Vec<Comment>>;

    /// Round-trip to the backend.
    async fn ping(&self) -> Result<()>;
}
