use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a system time as ISO-8601 UTC with millisecond precision
/// (`2024-05-01T12:00:00.000Z`).
#[must_use]
pub fn to_iso8601(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time, formatted like [`to_iso8601`].
#[must_use]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn formats_epoch_with_millis_and_z() {
        assert_eq!(to_iso8601(UNIX_EPOCH), "1970-01-01T00:00:00.000Z");
        let t = UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(to_iso8601(t), "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn now_ends_with_z() {
        assert!(now_iso8601().ends_with('Z'));
    }
}
