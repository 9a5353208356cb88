//! Lenient timestamp (de)serialization.
//!
//! The marketplace API emits `createdAt` either as RFC 3339 or as a local
//! date-time without an offset (`2025-03-14T09:26:53.589`). Both are read as
//! UTC; timestamps are always written back as RFC 3339.
//!
//! Use with `#[serde(default, with = "easytrade_core::types::timestamp")]` on
//! an `Option<DateTime<Utc>>` field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a timestamp in either accepted shape.
#[must_use]
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, LOCAL_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Serialize an optional timestamp as RFC 3339.
///
/// # Errors
///
/// Propagates serializer errors.
#[allow(clippy::ref_option)]
pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

/// Deserialize an optional timestamp, treating unparseable values as absent.
///
/// # Errors
///
/// Returns an error only if the value is neither null nor a string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse("2025-03-14T09:26:53Z").unwrap();
        assert_eq!(dt.year(), 2025);
    }

    #[test]
    fn test_parse_local_date_time() {
        let dt = parse("2025-03-14T09:26:53.589").unwrap();
        assert_eq!(dt.month(), 3);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse("yesterday").is_none());
    }
}
