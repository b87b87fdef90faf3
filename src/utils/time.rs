use chrono::NaiveDateTime;
use chrono_tz::Tz;
use log::{debug, warn};

/// Wire format of the timestamp path segment, e.g. "2025-01-15:14-30".
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d:%H-%M";

/// Converts a UTC timestamp to the given IANA zone, re-rendered in the same
/// format. The client sends UTC from EPG data while XC providers expect
/// local time. Conversion failures are non-fatal, the input is returned
/// unchanged.
pub fn convert_timestamp_to_zone(timestamp: &str, zone: &str) -> String {
    match try_convert(timestamp, zone) {
        Some(converted) => {
            debug!("Timestamp: {timestamp} (UTC) -> {converted} ({zone})");
            converted
        }
        None => {
            warn!("Timestamp conversion failed for '{timestamp}' to zone '{zone}'");
            timestamp.to_string()
        }
    }
}

fn try_convert(timestamp: &str, zone: &str) -> Option<String> {
    let tz: Tz = zone.parse().ok()?;
    let utc_time = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    let local_time = utc_time.and_utc().with_timezone(&tz);
    Some(local_time.format(TIMESTAMP_FORMAT).to_string())
}
