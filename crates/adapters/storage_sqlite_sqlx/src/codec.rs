//! Column encodings shared by the repositories.

use chrono::SecondsFormat;

use mistguard_domain::time::Timestamp;

/// Fixed-width RFC 3339 so that text comparison orders chronologically.
pub(crate) fn encode_time(at: Timestamp) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_time(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|at| at.to_utc())
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub(crate) fn decode_err(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> sqlx::Error {
    sqlx::Error::Decode(err.into())
}

/// `SQLite` integers are signed.
pub(crate) fn encode_u64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn decode_u64(value: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(decode_err)
}

pub(crate) fn encode_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
