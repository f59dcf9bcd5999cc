use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Layout used for rendered dates, e.g. `Thu Jan  1 00:00:00 UTC 1970`.
pub const DATE_LAYOUT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_DIFF: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;

/// What the stored integer counts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Epoch {
    /// Seconds since 1970-01-01 UTC.
    Unix,
    /// 100ns ticks since 1601-01-01 UTC.
    WindowsFileTime,
}

/// Time zone dates are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Utc,
    Local,
}

/// Format a raw stored timestamp; `None` when it is outside chrono's range.
pub fn format_timestamp(raw: u64, epoch: Epoch, zone: Zone) -> Option<String> {
    let seconds = match epoch {
        Epoch::Unix => i64::try_from(raw).ok()?,
        Epoch::WindowsFileTime => {
            i64::try_from(raw / FILETIME_TICKS_PER_SECOND).ok()? - FILETIME_UNIX_DIFF
        }
    };
    let utc: DateTime<Utc> = DateTime::from_timestamp(seconds, 0)?;
    let text = match zone {
        Zone::Utc => utc.format(DATE_LAYOUT).to_string(),
        Zone::Local => utc.with_timezone(&Local).format(DATE_LAYOUT).to_string(),
    };
    Some(text)
}
