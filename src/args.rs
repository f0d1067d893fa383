//! Parsers for CLI date and time arguments.
//!
//! Timestamps accept RFC 3339 (`2024-06-01T08:30:00Z`) or a local wall-clock
//! time (`2024-06-01 08:30` / `2024-06-01T08:30`). Dates are `YYYY-MM-DD`.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use nutrilog_core::calendar;

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    parse_timestamp_in(s, &Local)
}

pub fn parse_timestamp_in<Tz: TimeZone>(s: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|ts| ts.with_timezone(&Utc))
                .ok_or_else(|| anyhow!("{} does not exist in the local time zone", s));
        }
    }
    bail!(
        "Invalid timestamp '{}'. Use RFC 3339 or YYYY-MM-DD HH:MM.",
        s
    )
}

/// Parse `YYYY-MM-DD` with a year in `1..=9999`; `None` means today.
pub fn parse_date(s: Option<&str>) -> Result<NaiveDate> {
    let Some(s) = s else {
        return Ok(calendar::today());
    };
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD.", s))?;
    if !(1..=9999).contains(&date.year()) {
        bail!("Date '{}' is out of range. Years 1 to 9999 are supported.", s);
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_rfc3339() {
        let ts = parse_timestamp("2024-06-01T08:30:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_local_wall_clock() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let ts = parse_timestamp_in("2024-06-01 08:30", &tz).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap());
        let ts = parse_timestamp_in("2024-06-01T08:30", &tz).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_bad_timestamp() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date(Some("2023-02-29")).is_err());
        assert!(parse_date(Some("+262143-12-31")).is_err());
        assert!(parse_date(Some("-0005-01-01")).is_err());
        assert_eq!(parse_date(None).unwrap(), calendar::today());
    }
}
