use chrono::{Local, NaiveDateTime, Timelike};

/// Timestamp format used by heading metadata blocks.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time, truncated to whole seconds (metadata resolution).
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a metadata timestamp. Returns None for anything malformed; the
/// codec treats that as an absent field.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        let ts = parse_timestamp("2018-02-04 09:47:13").unwrap();
        assert_eq!(format_timestamp(&ts), "2018-02-04 09:47:13");
    }

    #[test]
    fn test_malformed_timestamp() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2018-02-04").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_now_has_second_resolution() {
        assert_eq!(now().nanosecond(), 0);
    }
}
