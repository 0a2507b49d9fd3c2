use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A UTC instant rendered as RFC 3339 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn unix_timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Milliseconds since the Unix epoch, used for upload file names.
    pub fn unix_millis(&self) -> i128 {
        self.0.unix_timestamp_nanos() / 1_000_000
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.0.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for Timestamp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let datetime = OffsetDateTime::parse(s, &Rfc3339).map_err(|e| {
            CoreError::invalid_date_time(format!("Failed to parse timestamp '{s}': {e}"))
        })?;
        Ok(Timestamp(datetime))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub fn now_utc() -> Timestamp {
    Timestamp(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_display_is_rfc3339() {
        let ts = Timestamp::new(datetime!(2023-05-15 14:30:00 UTC));
        assert_eq!(ts.to_string(), "2023-05-15T14:30:00Z");
    }

    #[test]
    fn test_parse_round_trip_with_offset() {
        let ts: Timestamp = "2023-05-15T16:30:00+02:00".parse().unwrap();
        assert_eq!(ts.unix_timestamp(), datetime!(2023-05-15 14:30:00 UTC).unix_timestamp());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "yesterday".parse::<Timestamp>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidDateTime(_)));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let ts = Timestamp::new(datetime!(2024-01-02 03:04:05 UTC));
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-02T03:04:05Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_unix_millis() {
        let ts = Timestamp::new(datetime!(1970-01-01 00:00:01.5 UTC));
        assert_eq!(ts.unix_millis(), 1500);
    }

    #[test]
    fn test_ordering_follows_instant() {
        let earlier = Timestamp::new(datetime!(2024-01-01 00:00:00 UTC));
        let later = now_utc();
        assert!(earlier < later);
    }
}
