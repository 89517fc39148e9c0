//! Data models for the session schedule history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---

/// Which half of the pool a session runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionSide {
    Left,
    Right,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown session side '{0}', expected LEFT or RIGHT")]
pub struct UnknownSide(String);

impl SessionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionSide::Left => "LEFT",
            SessionSide::Right => "RIGHT",
        }
    }
}

impl TryFrom<String> for SessionSide {
    type Error = UnknownSide;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "LEFT" => Ok(SessionSide::Left),
            "RIGHT" => Ok(SessionSide::Right),
            _ => Err(UnknownSide(value)),
        }
    }
}

/// One observed snapshot of a pool session's scheduling state.
///
/// Rows are append-only: the current state of a session is the snapshot with
/// the latest `updated_at` for its `(pool_id, session_datetime, session_title,
/// session_side)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SessionRecord {
    // ---
    #[serde(default)]
    pub pool_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// `dd-mm-yyyy`, stored as supplied.
    pub session_date: String,
    pub session_time: String,
    pub session_datetime: String,
    pub session_title: String,
    #[sqlx(try_from = "String")]
    pub session_side: SessionSide,
    pub available_spots: i32,
    #[serde(default)]
    pub area: Option<String>,
}

impl SessionRecord {
    /// Treat empty optional text fields as absent.
    pub fn normalized(mut self) -> Self {
        // ---
        self.pool_id = self.pool_id.filter(|s| !s.is_empty());
        self.area = self.area.filter(|s| !s.is_empty());
        self
    }
}

/// RFC 3339 timestamp where `null` and `""` both mean absent.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.is_empty() => raw
            .parse::<DateTime<Utc>>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// A deduplicated session with its availability rank inside its pool.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RankedSession {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub session: SessionRecord,
    pub rn: i64,
}

/// Outcome of one executed write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub rows_affected: u64,
}

/// Row of the diagnostic `comments` table shown on the fallback page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i32,
    pub author: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn sample_payload() -> serde_json::Value {
        json!({
            "POOL_ID": "",
            "UPDATED_AT": "2024-01-01T08:30:00Z",
            "SESSION_DATE": "01-01-2024",
            "SESSION_TIME": "07:00",
            "SESSION_DATETIME": "2024-01-01T07:00",
            "SESSION_TITLE": "Lap swim",
            "SESSION_SIDE": "LEFT",
            "AVAILABLE_SPOTS": 4,
            "AREA": ""
        })
    }

    #[test]
    fn test_deserialize_wire_names() {
        // ---
        let record: SessionRecord = serde_json::from_value(sample_payload()).unwrap();

        assert_eq!(record.session_date, "01-01-2024");
        assert_eq!(record.session_side, SessionSide::Left);
        assert_eq!(record.available_spots, 4);
        assert_eq!(
            record.updated_at.unwrap().to_rfc3339(),
            "2024-01-01T08:30:00+00:00"
        );
    }

    #[test]
    fn test_empty_optionals_become_none() {
        // ---
        let record: SessionRecord = serde_json::from_value(sample_payload()).unwrap();
        let record = record.normalized();

        assert_eq!(record.pool_id, None);
        assert_eq!(record.area, None);
    }

    #[test]
    fn test_missing_optionals_are_accepted() {
        // ---
        let mut payload = sample_payload();
        let obj = payload.as_object_mut().unwrap();
        obj.remove("POOL_ID");
        obj.remove("UPDATED_AT");
        obj.remove("AREA");

        let record: SessionRecord = serde_json::from_value(payload).unwrap();
        assert!(record.pool_id.is_none());
        assert!(record.updated_at.is_none());
        assert!(record.area.is_none());
    }

    #[test]
    fn test_empty_or_null_timestamp_is_absent() {
        // ---
        let mut payload = sample_payload();
        payload["UPDATED_AT"] = json!("");
        let record: SessionRecord = serde_json::from_value(payload.clone()).unwrap();
        assert!(record.updated_at.is_none());

        payload["UPDATED_AT"] = json!(null);
        let record: SessionRecord = serde_json::from_value(payload.clone()).unwrap();
        assert!(record.updated_at.is_none());

        payload["UPDATED_AT"] = json!("yesterday");
        assert!(serde_json::from_value::<SessionRecord>(payload).is_err());
    }

    #[test]
    fn test_invalid_side_is_rejected() {
        // ---
        let mut payload = sample_payload();
        payload["SESSION_SIDE"] = json!("MIDDLE");
        assert!(serde_json::from_value::<SessionRecord>(payload).is_err());

        assert!(SessionSide::try_from("left".to_string()).is_err());
        assert_eq!(
            SessionSide::try_from("RIGHT".to_string()).unwrap(),
            SessionSide::Right
        );
    }

    #[test]
    fn test_ranked_session_serializes_flat() {
        // ---
        let session: SessionRecord = serde_json::from_value(sample_payload()).unwrap();
        let ranked = RankedSession { session, rn: 2 };
        let value = serde_json::to_value(&ranked).unwrap();

        assert_eq!(value["rn"], 2);
        assert_eq!(value["SESSION_TITLE"], "Lap swim");
        assert_eq!(value["SESSION_SIDE"], "LEFT");
    }
}
