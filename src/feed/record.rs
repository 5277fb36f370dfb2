//! Raw feed rows and their normalization
//!
//! Rows arrive either camelCase (`reflectionCount`, `createdAt`) or straight
//! from the Postgres REST layer in snake_case; both are accepted.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// `createdAt` as delivered: RFC 3339 text or epoch millis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Epoch millis, or an error if the text is not RFC 3339
    pub fn to_millis(&self) -> Result<i64, ValidationError> {
        match self {
            RawTimestamp::Millis(ms) => Ok(*ms),
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| dt.timestamp_millis())
                .map_err(|_| ValidationError::InvalidTimestamp(text.clone())),
        }
    }
}

/// A bubble row exactly as the feed delivered it; every field may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBubbleRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, alias = "reflection_count")]
    pub reflection_count: Option<i64>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<RawTimestamp>,
}

impl RawBubbleRecord {
    /// Well-formed row with a millisecond timestamp
    pub fn new(id: impl Into<String>, label: impl Into<String>, reflection_count: i64, created_at_ms: i64) -> Self {
        Self {
            id: Some(id.into()),
            label: Some(label.into()),
            reflection_count: Some(reflection_count),
            created_at: Some(RawTimestamp::Millis(created_at_ms)),
        }
    }

    /// Validate and convert into a `BubbleRecord`
    ///
    /// `id` and `createdAt` are required. A missing label becomes empty and a
    /// missing count becomes zero; a negative count is rejected.
    pub fn normalize(&self) -> Result<BubbleRecord, ValidationError> {
        let id = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingField("id"))?;
        let created_at_ms = self
            .created_at
            .as_ref()
            .ok_or(ValidationError::MissingField("createdAt"))?
            .to_millis()?;
        let reflection_count = match self.reflection_count {
            Some(n) if n < 0 => return Err(ValidationError::NegativeCount(n)),
            Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
            None => 0,
        };

        Ok(BubbleRecord {
            id: id.to_string(),
            label: self.label.clone().unwrap_or_default(),
            reflection_count,
            created_at_ms,
        })
    }
}

/// A validated feed row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleRecord {
    pub id: String,
    pub label: String,
    pub reflection_count: u32,
    pub created_at_ms: i64,
}

impl BubbleRecord {
    /// Live iff `now - created_at <= ttl`
    pub fn is_live(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) <= ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_row() {
        let raw: RawBubbleRecord = serde_json::from_str(
            r#"{"id":"b1","label":"Filosofia","reflectionCount":3,"createdAt":"2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();
        let record = raw.normalize().unwrap();
        assert_eq!(record.id, "b1");
        assert_eq!(record.reflection_count, 3);
        assert_eq!(record.created_at_ms, 1_714_564_800_000);
    }

    #[test]
    fn test_parse_snake_case_row_with_offset() {
        let raw: RawBubbleRecord = serde_json::from_str(
            r#"{"id":"b2","label":"Arte","reflection_count":0,"created_at":"2024-05-01T14:00:00+02:00"}"#,
        )
        .unwrap();
        assert_eq!(raw.normalize().unwrap().created_at_ms, 1_714_564_800_000);
    }

    #[test]
    fn test_millis_timestamp() {
        let raw: RawBubbleRecord =
            serde_json::from_str(r#"{"id":"b3","label":"x","createdAt":1700000000000}"#).unwrap();
        let record = raw.normalize().unwrap();
        assert_eq!(record.created_at_ms, 1_700_000_000_000);
        assert_eq!(record.reflection_count, 0);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let no_id = RawBubbleRecord {
            id: Some("  ".into()),
            ..RawBubbleRecord::new("x", "x", 0, 0)
        };
        assert_eq!(no_id.normalize(), Err(ValidationError::MissingField("id")));

        let no_time = RawBubbleRecord {
            created_at: None,
            ..RawBubbleRecord::new("x", "x", 0, 0)
        };
        assert_eq!(no_time.normalize(), Err(ValidationError::MissingField("createdAt")));
    }

    #[test]
    fn test_bad_timestamp_and_negative_count() {
        let bad_time = RawBubbleRecord {
            created_at: Some(RawTimestamp::Text("yesterday".into())),
            ..RawBubbleRecord::new("x", "x", 0, 0)
        };
        assert!(matches!(bad_time.normalize(), Err(ValidationError::InvalidTimestamp(_))));

        let negative = RawBubbleRecord::new("x", "x", -2, 0);
        assert_eq!(negative.normalize(), Err(ValidationError::NegativeCount(-2)));
    }

    #[test]
    fn test_liveness_extreme_timestamps() {
        let ancient = RawBubbleRecord::new("a", "A", 0, i64::MIN).normalize().unwrap();
        assert!(!ancient.is_live(1_700_000_000_000, 24 * 60 * 60 * 1000));
        assert!(!ancient.is_live(i64::MAX, 24 * 60 * 60 * 1000));
    }

    #[test]
    fn test_liveness_boundary() {
        let record = RawBubbleRecord::new("x", "x", 0, 0).normalize().unwrap();
        assert!(record.is_live(100, 100));
        assert!(!record.is_live(101, 100));
    }
}
