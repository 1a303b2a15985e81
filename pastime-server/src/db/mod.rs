pub mod schema;
pub mod connection;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection::{Database, DbConnection, DbPool};

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp in the fixed-width form stored in every `*_at` column
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp inside a rusqlite row mapper
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a stored UUID inside a rusqlite row mapper
pub(crate) fn parse_uuid(idx: usize, raw: &str) -> rusqlite::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_chronologically_as_text() {
        let earlier = "2024-02-01T09:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let later = "2024-02-01T09:00:00.5Z".parse::<DateTime<Utc>>().unwrap();

        let a = format_timestamp(&earlier);
        let b = format_timestamp(&later);
        assert_eq!(a, "2024-02-01T09:00:00.000000Z");
        assert!(a < b);
        assert_eq!(parse_timestamp(0, &b).unwrap(), later);
    }

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        assert!(parse_uuid(0, "not-a-uuid").is_err());
    }
}
