//! Time helpers — business time zone conversion
//!
//! All date→timestamp conversion happens here; the repository layer only
//! receives `i64` Unix millis. Daily usage caps are bounded by the calendar
//! day `[00:00:00, next day 00:00:00)` in the configured business time zone.

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Current Unix millis
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Calendar date of a timestamp in the business time zone
pub fn business_date(ts_millis: i64, tz: Tz) -> NaiveDate {
    match Utc.timestamp_millis_opt(ts_millis).single() {
        Some(dt) => dt.with_timezone(&tz).date_naive(),
        // Out-of-range timestamp; fall back to the epoch date
        None => NaiveDate::default(),
    }
}

/// Date + hour/min/sec → Unix millis (business time zone)
///
/// DST gap fallback: if the local time does not exist (spring-forward jump),
/// fall back to interpreting the naive time as UTC.
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let naive = date.and_hms_opt(hour, min, sec).unwrap_or_default();
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Start of day (00:00:00) → Unix millis (business time zone)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// End of day → next day 00:00:00 Unix millis (business time zone)
///
/// Callers use `< end` (exclusive) semantics.
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next_day, 0, 0, 0, tz)
}

/// `[start, end)` millis of the calendar day containing `ts_millis`
pub fn day_bounds_millis(ts_millis: i64, tz: Tz) -> (i64, i64) {
    let date = business_date(ts_millis, tz);
    (day_start_millis(date, tz), day_end_millis(date, tz))
}
