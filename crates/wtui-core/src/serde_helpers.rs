//! Lenient timestamp deserialization for externally written JSON files.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Accept either epoch milliseconds or an RFC 3339 string.
pub fn flexible_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {s:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "flexible_timestamp")]
        ts: DateTime<Utc>,
    }

    #[test]
    fn millis_and_rfc3339_agree() {
        let a: Wrapper = serde_json::from_str(r#"{"ts": 1768471200000}"#).expect("millis");
        let b: Wrapper =
            serde_json::from_str(r#"{"ts": "2026-01-15T10:00:00Z"}"#).expect("rfc3339");
        assert_eq!(a.ts, b.ts);
    }

    #[test]
    fn garbage_is_rejected() {
        let r: Result<Wrapper, _> = serde_json::from_str(r#"{"ts": "yesterday"}"#);
        assert!(r.is_err());
    }
}
