//! Timestamp value object for immutable points in time.
//!
//! On the wire every timestamp is epoch milliseconds.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Immutable point in time, always UTC, millisecond precision on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a timestamp from epoch milliseconds.
    ///
    /// Returns `None` when the value is outside chrono's representable range.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Parses an ISO-8601 instant as produced by the REST API.
    ///
    /// Accepts RFC 3339 with an offset, or a bare local date-time which is
    /// taken to be UTC.
    pub fn parse_iso(text: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }

    /// Returns the timestamp as epoch milliseconds.
    pub fn as_epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_epoch_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Self::from_epoch_millis(millis)
            .ok_or_else(|| de::Error::custom(format!("timestamp {millis} out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn timestamp_from_epoch_millis_works() {
        // 2024-01-15T00:00:00Z
        let ts = Timestamp::from_epoch_millis(1_705_276_800_000).unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().month(), 1);
        assert_eq!(ts.as_datetime().day(), 15);
    }

    #[test]
    fn timestamp_serializes_as_epoch_millis() {
        let ts = Timestamp::from_epoch_millis(1_705_276_800_123).unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1705276800123");
    }

    #[test]
    fn timestamp_deserializes_from_epoch_millis() {
        let ts: Timestamp = serde_json::from_str("1705276800123").unwrap();
        assert_eq!(ts.as_epoch_millis(), 1_705_276_800_123);
    }

    #[test]
    fn timestamp_rejects_string_input() {
        let result: Result<Timestamp, _> = serde_json::from_str("\"2024-01-15T10:30:00Z\"");
        assert!(result.is_err());
    }

    #[test]
    fn parse_iso_handles_offset_and_naive_forms() {
        let with_offset = Timestamp::parse_iso("2024-01-15T00:00:00+00:00").unwrap();
        let naive = Timestamp::parse_iso("2024-01-15T00:00:00.000").unwrap();
        assert_eq!(with_offset.as_epoch_millis(), 1_705_276_800_000);
        assert_eq!(naive, with_offset);
        assert!(Timestamp::parse_iso("tomorrow").is_none());
    }

    #[test]
    fn timestamp_plus_secs_adds_correctly() {
        let ts1 = Timestamp::from_epoch_millis(1_000_000).unwrap();
        let ts2 = ts1.plus_secs(60);
        assert_eq!(ts2.as_epoch_millis(), 1_060_000);
        assert_eq!(ts2.duration_since(&ts1).num_seconds(), 60);
    }
}
