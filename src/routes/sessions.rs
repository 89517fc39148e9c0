//! Ingest and listing endpoints for the session schedule history.
//!
//! - `POST /api/sessions` accepts one session object, or an array which is
//!   handled exactly like `POST /api/sessions/batch`.
//! - `POST /api/sessions/batch` accepts an array of 1..=1000 sessions written
//!   in one transaction.
//! - `GET /api/sessions` returns up to 100 stored rows.

use anyhow::Context;
use axum::{
    body::Bytes, extract::State, http::StatusCode, response::IntoResponse, routing::post, Json,
    Router,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{error::ApiError, store::Store, Config, SessionRecord};

/// Largest array accepted by a single batch request.
pub const MAX_BATCH_ITEMS: usize = 1000;

/// Row cap for `GET /api/sessions`.
const LIST_LIMIT: i64 = 100;

// ---

pub fn router() -> Router<(Store, Config)> {
    // ---
    Router::new()
        .route("/api/sessions", post(create).get(list))
        .route("/api/sessions/batch", post(create_batch))
}

async fn create(
    State((store, _)): State<(Store, Config)>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    let payload: Value = serde_json::from_slice(&body)
        .context("Invalid JSON body")
        .map_err(ApiError::Ingest)?;

    if payload.is_array() {
        return insert_batch(&store, payload).await;
    }

    let record = serde_json::from_value::<SessionRecord>(payload)
        .context("Invalid session record")
        .map_err(ApiError::Ingest)?
        .normalized();

    info!(
        "POST /api/sessions - pool {:?}, {} {}",
        record.pool_id, record.session_datetime, record.session_side.as_str()
    );

    let result = store
        .insert_session(&record)
        .await
        .map_err(ApiError::Ingest)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "result": result })),
    ))
}

async fn create_batch(
    State((store, _)): State<(Store, Config)>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    let payload: Value = serde_json::from_slice(&body)
        .context("Invalid JSON body")
        .map_err(ApiError::Ingest)?;

    insert_batch(&store, payload).await
}

/// Validate an array payload and write it as one batch.
async fn insert_batch(
    store: &Store,
    payload: Value,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // ---
    let Value::Array(items) = payload else {
        return Err(ApiError::bad_request("Request body must be an array"));
    };
    if items.is_empty() {
        return Err(ApiError::bad_request("Array cannot be empty"));
    }
    if items.len() > MAX_BATCH_ITEMS {
        return Err(ApiError::bad_request(format!(
            "Maximum {MAX_BATCH_ITEMS} items allowed per request"
        )));
    }

    let records = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<SessionRecord>(item)
                .map(SessionRecord::normalized)
                .with_context(|| format!("Invalid session record at index {i}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(ApiError::Ingest)?;

    info!("POST /api/sessions/batch - inserting {} sessions", records.len());

    let results = store
        .insert_sessions(&records)
        .await
        .map_err(ApiError::Ingest)?;

    debug!("Batch committed, {} statements", results.len());

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "inserted": records.len(),
            "results": results,
        })),
    ))
}

async fn list(
    State((store, _)): State<(Store, Config)>,
) -> Result<Json<Vec<SessionRecord>>, ApiError> {
    // ---
    info!("GET /api/sessions");

    let rows = store
        .list_sessions(LIST_LIMIT)
        .await
        .map_err(ApiError::Query)?;

    debug!("GET /api/sessions - returning {} rows", rows.len());
    Ok(Json(rows))
}
