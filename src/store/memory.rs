//! In-process [`SessionStore`] for handler tests.
//!
//! Mirrors the PostgreSQL queries row for row, including the latest-snapshot
//! join and `ROW_NUMBER()` ranking, so handler tests exercise the same
//! semantics without a database.

use std::{cmp::Ordering, collections::HashMap, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{SessionStore, EXCLUDED_TITLE_MARKERS};
use crate::models::SessionSide;
use crate::{Comment, RankedSession, SessionRecord, WriteResult};

type Identity = (Option<String>, String, String, SessionSide);

fn identity(record: &SessionRecord) -> Identity {
    (
        record.pool_id.clone(),
        record.session_datetime.clone(),
        record.session_title.clone(),
        record.session_side,
    )
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<SessionRecord>>,
    comments: Vec<Comment>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<SessionRecord>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn with_comments(comments: Vec<Comment>) -> Self {
        Self {
            comments,
            ..Self::default()
        }
    }

    /// Store whose every operation errors, as an unreachable database would.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<SessionRecord> {
        self.rows.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            Err(anyhow!("database unavailable"))
        } else {
            Ok(())
        }
    }
}

fn title_excluded(title: &str) -> bool {
    let title = title.to_lowercase();
    EXCLUDED_TITLE_MARKERS
        .iter()
        .any(|marker| title.contains(&marker.to_lowercase()))
}

/// `ORDER BY available_spots DESC, updated_at DESC` (NULLs first, as
/// PostgreSQL sorts them for DESC).
fn rank_order(a: &SessionRecord, b: &SessionRecord) -> Ordering {
    b.available_spots
        .cmp(&a.available_spots)
        .then_with(|| desc_nulls_first(a.updated_at, b.updated_at))
}

fn desc_nulls_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b.cmp(&a),
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, record: &SessionRecord) -> Result<WriteResult> {
        self.check()?;
        self.rows.lock().unwrap().push(record.clone());
        Ok(WriteResult { rows_affected: 1 })
    }

    async fn insert_sessions(&self, records: &[SessionRecord]) -> Result<Vec<WriteResult>> {
        self.check()?;
        self.rows.lock().unwrap().extend_from_slice(records);
        Ok(vec![WriteResult { rows_affected: 1 }; records.len()])
    }

    async fn list_sessions(&self, limit: i64) -> Result<Vec<SessionRecord>> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().take(usize::try_from(limit).unwrap_or(0)).cloned().collect())
    }

    async fn seo_highlights(
        &self,
        dates: &[String],
        pool_id: &str,
        top_x: i64,
    ) -> Result<Vec<RankedSession>> {
        self.check()?;
        let rows = self.rows.lock().unwrap();

        // latest_session_updates; MAX ignores NULL timestamps
        let mut latest: HashMap<Identity, Option<DateTime<Utc>>> = HashMap::new();
        for row in rows.iter().filter(|r| {
            dates.contains(&r.session_date)
                && r.pool_id.as_deref() == Some(pool_id)
                && !title_excluded(&r.session_title)
        }) {
            let slot = latest.entry(identity(row)).or_insert(None);
            *slot = (*slot).max(row.updated_at);
        }

        // filtered_latest_records joins back against the whole history
        let filtered: Vec<SessionRecord> = rows
            .iter()
            .filter(|r| match (latest.get(&identity(r)), r.updated_at) {
                (Some(Some(max)), Some(at)) => *max == at,
                _ => false,
            })
            .cloned()
            .collect();

        // ranked_records
        let mut by_pool: HashMap<Option<String>, Vec<SessionRecord>> = HashMap::new();
        for row in filtered {
            by_pool.entry(row.pool_id.clone()).or_default().push(row);
        }

        let mut ranked: Vec<RankedSession> = Vec::new();
        for (_, mut group) in by_pool {
            group.sort_by(rank_order);
            ranked.extend(
                group
                    .into_iter()
                    .zip(1..)
                    .filter(|(_, rn)| *rn <= top_x)
                    .map(|(session, rn)| RankedSession { session, rn }),
            );
        }

        ranked.sort_by(|a, b| {
            a.session
                .pool_id
                .cmp(&b.session.pool_id)
                .then_with(|| b.session.session_datetime.cmp(&a.session.session_datetime))
                .then_with(|| b.session.available_spots.cmp(&a.session.available_spots))
        });

        Ok(ranked)
    }

    async fn sample_comments(&self, limit: i64) -> Result<Vec<Comment>> {
        self.check()?;
        Ok(self.comments.iter().take(usize::try_from(limit).unwrap_or(0)).cloned().collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}
