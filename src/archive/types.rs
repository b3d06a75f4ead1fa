use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable summary of one concluded, saved call.
///
/// `is_scam` is the single source for both `isScam` and `hasScamKeywords`
/// in the stored JSON; it is frozen at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredCallRecord", into = "StoredCallRecord")]
pub struct CallRecord {
    pub id: String,
    pub phone_number: String,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: u64,
    pub is_scam: bool,
    pub transcript: Vec<String>,
}

impl CallRecord {
    /// Builds a record with a fresh id, stamped `at`.
    pub fn new(
        phone_number: impl Into<String>,
        at: DateTime<Utc>,
        duration_seconds: u64,
        is_scam: bool,
        transcript: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phone_number: phone_number.into(),
            timestamp: at,
            duration_seconds,
            is_scam,
            transcript,
        }
    }

    pub fn has_scam_keywords(&self) -> bool {
        self.is_scam
    }
}

/// On-disk shape of one saved-calls entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCallRecord {
    id: String,
    phone_number: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    duration: u64,
    #[serde(default)]
    is_scam: bool,
    #[serde(default)]
    transcript: Vec<String>,
    #[serde(default)]
    has_scam_keywords: bool,
}

impl From<StoredCallRecord> for CallRecord {
    fn from(s: StoredCallRecord) -> Self {
        Self {
            id: s.id,
            phone_number: s.phone_number,
            timestamp: s.timestamp,
            duration_seconds: s.duration,
            is_scam: s.is_scam || s.has_scam_keywords,
            transcript: s.transcript,
        }
    }
}

impl From<CallRecord> for StoredCallRecord {
    fn from(r: CallRecord) -> Self {
        Self {
            id: r.id,
            phone_number: r.phone_number,
            timestamp: r.timestamp,
            duration: r.duration_seconds,
            is_scam: r.is_scam,
            transcript: r.transcript,
            has_scam_keywords: r.is_scam,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_both_scam_keys() {
        let record = CallRecord::new("+84 987 654 321", Utc::now(), 12, true, vec!["a".into()]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["isScam"], true);
        assert_eq!(json["hasScamKeywords"], true);
        assert_eq!(json["duration"], 12);
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn either_scam_key_flags_the_record() {
        let raw = r#"{"id":"1","phoneNumber":"x","timestamp":1700000000000,"duration":3,"isScam":false,"transcript":[],"hasScamKeywords":true}"#;
        let record: CallRecord = serde_json::from_str(raw).unwrap();
        assert!(record.is_scam);
        assert_eq!(record.duration_seconds, 3);
    }
}
