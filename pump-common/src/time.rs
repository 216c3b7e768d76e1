//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unix epoch (1970-01-01 00:00:00 UTC)
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Convert Unix epoch seconds to a UTC timestamp
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn from_unix_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
}

/// Parse a base-10 Unix epoch seconds string (e.g. Last.fm `uts`)
pub fn parse_unix_seconds(text: &str) -> Option<DateTime<Utc>> {
    text.trim().parse::<i64>().ok().and_then(from_unix_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_epoch_is_zero() {
        assert_eq!(epoch().timestamp(), 0);
    }

    #[test]
    fn test_from_unix_seconds() {
        let ts = from_unix_seconds(1_700_000_000).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_from_unix_seconds_out_of_range() {
        assert!(from_unix_seconds(i64::MAX).is_none());
    }

    #[test]
    fn test_parse_unix_seconds_valid() {
        assert_eq!(parse_unix_seconds("300").unwrap().timestamp(), 300);
        assert_eq!(parse_unix_seconds(" 1700000000 ").unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_unix_seconds_rejects_garbage() {
        assert!(parse_unix_seconds("").is_none());
        assert!(parse_unix_seconds("12abc").is_none());
        assert!(parse_unix_seconds("0x10").is_none());
        assert!(parse_unix_seconds("1.5").is_none());
    }
}
