//! Diagnostic page served for every unmatched route.
//!
//! Shows the first few rows of the `comments` table so a browser hit on the
//! service root confirms the database is wired up.

use axum::{extract::State, response::Html};

use crate::{error::ApiError, store::Store, Config};

const SAMPLE_ROWS: i64 = 3;

pub async fn handler(State((store, _)): State<(Store, Config)>) -> Result<Html<String>, ApiError> {
    // ---
    tracing::debug!("Fallback route hit, rendering diagnostic page");

    let comments = store
        .sample_comments(SAMPLE_ROWS)
        .await
        .map_err(ApiError::Query)?;

    let json = serde_json::to_string_pretty(&comments)
        .map_err(|e| ApiError::Query(e.into()))?;

    Ok(Html(render_page(&json)))
}

fn render_page(json: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Swim schedule API</title>
  </head>
  <body>
    <h1>Swim schedule API</h1>
    <p>Sample rows from the <code>comments</code> table:</p>
    <pre>{}</pre>
  </body>
</html>
"#,
        escape_html(json)
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
