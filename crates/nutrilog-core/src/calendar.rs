//! Calendar-day helpers.
//!
//! Entries carry UTC instants; days are local calendar days. A day is the
//! half-open interval `[start_of_day(d), start_of_day(d + 1))`, which is not
//! always 24 hours long when the zone observes DST.
//!
//! Every helper comes in a `_in` form taking an explicit zone, and a
//! shorthand that uses [`chrono::Local`].

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc};

/// First instant of `date` in `tz`.
///
/// If local midnight falls inside a DST gap the first existing instant
/// after it is used instead.
pub fn start_of_day_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..4)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Half-open UTC range covering `date` in `tz`.
pub fn day_bounds_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day_in(date, tz);
    let end = match date.succ_opt() {
        Some(next) => start_of_day_in(next, tz),
        None => start
            .checked_add_signed(Duration::days(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    };
    (start, end)
}

pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    day_bounds_in(date, &Local)
}

/// Calendar day `ts` falls on, as seen from `tz`.
pub fn day_of_in<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

pub fn day_of(ts: &DateTime<Utc>) -> NaiveDate {
    day_of_in(ts, &Local)
}

/// Today's date in the local zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Drop sub-millisecond precision so values survive an epoch-millis round trip.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

pub fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
