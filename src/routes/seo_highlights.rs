//! SEO highlight endpoint feeding post generation.
//!
//! `GET /seo-highlights?fromdate=yyyy-mm-dd&untildate=yyyy-mm-dd&poolid=..[&topxrecords=n]`
//!
//! Returns, per pool, the `topxrecords` upcoming sessions with the most open
//! spots, using only the latest known snapshot of each session and skipping
//! beginner and coached sessions.

use std::num::IntErrorKind;

use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{error::ApiError, store::Store, Config, RankedSession};

/// `topxrecords` when the parameter is absent or empty.
const DEFAULT_TOP_X: &str = "3";

/// `topxrecords` when the supplied value has no usable integer.
const FALLBACK_TOP_X: i64 = 10;

// ---

pub fn router() -> Router<(Store, Config)> {
    // ---
    Router::new().route("/seo-highlights", get(handler))
}

/// Raw query parameters; validation happens in [`HighlightParams::parse`].
#[derive(Debug, Default)]
struct HighlightQuery {
    fromdate: Option<String>,
    untildate: Option<String>,
    poolid: Option<String>,
    topxrecords: Option<String>,
}

impl HighlightQuery {
    /// Pick the known keys out of the decoded pairs. A repeated key keeps
    /// its first value; unknown keys are ignored.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        // ---
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "fromdate" => &mut query.fromdate,
                "untildate" => &mut query.untildate,
                "poolid" => &mut query.poolid,
                "topxrecords" => &mut query.topxrecords,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// Validated request.
#[derive(Debug, PartialEq)]
struct HighlightParams {
    from: NaiveDate,
    until: NaiveDate,
    pool_id: String,
    top_x: i64,
}

impl HighlightParams {
    fn parse(query: HighlightQuery, max_range_days: u32) -> Result<Self, ApiError> {
        // ---
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        let (Some(from), Some(until), Some(pool_id)) = (
            non_empty(query.fromdate),
            non_empty(query.untildate),
            non_empty(query.poolid),
        ) else {
            return Err(ApiError::bad_request("Missing required parameters."));
        };

        let (Some(from), Some(until)) = (parse_date(&from), parse_date(&until)) else {
            return Err(ApiError::bad_request("Invalid date format. Use yyyy-mm-dd"));
        };

        if from > until {
            return Err(ApiError::bad_request(
                "fromdate must be before or equal to untildate",
            ));
        }

        let span_days = (until - from).num_days() + 1;
        if span_days > i64::from(max_range_days) {
            return Err(ApiError::bad_request(format!(
                "Date range must not exceed {max_range_days} days"
            )));
        }

        let top_x = parse_top_x(non_empty(query.topxrecords).as_deref().unwrap_or(DEFAULT_TOP_X));

        Ok(Self {
            from,
            until,
            pool_id,
            top_x,
        })
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parse the leading integer of `value`; no digits or zero falls back to
/// [`FALLBACK_TOP_X`], too many digits saturates. The result is never below 1.
fn parse_top_x(value: &str) -> i64 {
    // ---
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let parsed = match digits[..end].parse::<i64>() {
        Ok(0) => FALLBACK_TOP_X,
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow && !negative => i64::MAX,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => 1,
        Err(_) => FALLBACK_TOP_X,
    };
    parsed.max(1)
}

/// Every day in `from..=until`, formatted `dd-mm-yyyy`.
fn enumerate_days(from: NaiveDate, until: NaiveDate) -> Vec<String> {
    from.iter_days()
        .take_while(|day| *day <= until)
        .map(|day| day.format("%d-%m-%Y").to_string())
        .collect()
}

async fn handler(
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
    State((store, config)): State<(Store, Config)>,
) -> Result<Json<Vec<RankedSession>>, ApiError> {
    // ---
    let Query(pairs) = pairs.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let query = HighlightQuery::from_pairs(pairs);
    info!("GET /seo-highlights - {:?}", query);

    let params = HighlightParams::parse(query, config.seo_max_range_days)?;
    let dates = enumerate_days(params.from, params.until);

    debug!(
        "Querying pool {} over {} days, top {}",
        params.pool_id,
        dates.len(),
        params.top_x
    );

    let rows = store
        .seo_highlights(&dates, &params.pool_id, params.top_x)
        .await
        .context("SEO highlight query failed")
        .map_err(ApiError::Query)?;

    info!("GET /seo-highlights - returning {} sessions", rows.len());
    Ok(Json(rows))
}
