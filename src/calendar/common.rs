// Date-time resolution shared by the iCalendar and remote-record normalizers.

use crate::calendar::reader::Property;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use std::str::FromStr;

/// A resolved instant plus whether the source gave only a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTime {
    pub instant: DateTime<FixedOffset>,
    pub date_only: bool,
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn midnight(date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| utc_offset().from_utc_datetime(&naive))
}

/// Resolves a `DTSTART`/`DTEND` style property.
///
/// Date-only values become midnight at offset zero. `Z` values are UTC.
/// A recognised `TZID` is converted to that zone's offset at that instant;
/// unrecognised zones and floating times are read as UTC.
pub fn parse_ical_datetime(prop: &Property) -> Option<ResolvedTime> {
    let raw = prop.value.trim();
    let is_date = prop
        .param("VALUE")
        .map(|v| v.eq_ignore_ascii_case("DATE"))
        .unwrap_or(false)
        || (raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()));

    if is_date {
        let date = NaiveDate::parse_from_str(raw, "%Y%m%d").ok()?;
        return Some(ResolvedTime {
            instant: midnight(date)?,
            date_only: true,
        });
    }

    let (body, is_utc) = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(body) => (body, true),
        None => (raw, false),
    };
    let naive = parse_naive_datetime(body)?;

    let instant = if is_utc {
        utc_offset().from_utc_datetime(&naive)
    } else if let Some(tzid) = prop.param("TZID") {
        resolve_with_tzid(&naive, tzid)
    } else {
        // Floating time
        utc_offset().from_utc_datetime(&naive)
    };

    Some(ResolvedTime {
        instant,
        date_only: false,
    })
}

fn parse_naive_datetime(body: &str) -> Option<NaiveDateTime> {
    ["%Y%m%dT%H%M%S", "%Y%m%dT%H%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
}

fn resolve_with_tzid(naive: &NaiveDateTime, tzid: &str) -> DateTime<FixedOffset> {
    // Some producers prefix the TZID with a slash ("/Europe/Berlin").
    let name = tzid.trim().trim_start_matches('/');
    match chrono_tz::Tz::from_str(name) {
        Ok(tz) => match tz.from_local_datetime(naive).earliest() {
            Some(zoned) => zoned.fixed_offset(),
            None => {
                // Inside a DST gap: shift past it.
                log::warn!("Local time {} does not exist in '{}', shifting by one hour", naive, name);
                tz.from_local_datetime(&(*naive + Duration::hours(1)))
                    .earliest()
                    .map(|zoned| zoned.fixed_offset())
                    .unwrap_or_else(|| utc_offset().from_utc_datetime(naive))
            }
        },
        Err(_) => {
            log::warn!("Unrecognized timezone '{}', treating as UTC", tzid);
            utc_offset().from_utc_datetime(naive)
        }
    }
}

/// Resolves a remote record's `dateTime`/`date` pair.
pub fn parse_remote_datetime(date_time: Option<&str>, date: Option<&str>) -> Option<ResolvedTime> {
    if let Some(value) = date_time.map(str::trim).filter(|v| !v.is_empty()) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(ResolvedTime {
                instant: dt,
                date_only: false,
            });
        }
        if let Some(naive) = parse_naive_datetime(value) {
            return Some(ResolvedTime {
                instant: utc_offset().from_utc_datetime(&naive),
                date_only: false,
            });
        }
        log::debug!("Unparseable remote dateTime {:?}", value);
    }

    let value = date.map(str::trim).filter(|v| !v.is_empty())?;
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    Some(ResolvedTime {
        instant: midnight(date)?,
        date_only: true,
    })
}

const MAX_DURATION_COMPONENT: i64 = 1_000_000;

/// RFC 5545 `DURATION` (`P1D`, `PT1H30M`, `P2W`, `-PT15M`).
pub fn parse_ical_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (negative, rest) = match value.as_bytes().first()? {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };
    let rest = rest.strip_prefix('P').or_else(|| rest.strip_prefix('p'))?;

    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for c in rest.chars() {
        match c.to_ascii_uppercase() {
            'T' => in_time = true,
            d if d.is_ascii_digit() => number.push(d),
            unit => {
                let n: i64 = number.parse().ok().filter(|n| *n <= MAX_DURATION_COMPONENT)?;
                number.clear();
                let component = match (unit, in_time) {
                    ('W', false) => Duration::weeks(n),
                    ('D', false) => Duration::days(n),
                    ('H', true) => Duration::hours(n),
                    ('M', true) => Duration::minutes(n),
                    ('S', true) => Duration::seconds(n),
                    _ => return None,
                };
                total = total.checked_add(&component)?;
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return None;
    }
    Some(if negative { -total } else { total })
}

/// Undoes iCalendar TEXT escaping.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(params: &[(&str, &str)], value: &str) -> Property {
        Property {
            name: "DTSTART".to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
                .collect(),
            value: value.to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_parse_ical_datetime_utc() {
        let resolved = parse_ical_datetime(&prop(&[], "20230101T120000Z")).unwrap();
        assert!(!resolved.date_only);
        assert_eq!(resolved.instant.to_rfc3339(), "2023-01-01T12:00:00+00:00");
    }

    #[test]
    fn test_parse_ical_datetime_floating_is_utc() {
        let resolved = parse_ical_datetime(&prop(&[], "20230101T120000")).unwrap();
        assert_eq!(resolved.instant.to_rfc3339(), "2023-01-01T12:00:00+00:00");
    }

    #[test]
    fn test_parse_ical_datetime_with_timezone() {
        let resolved =
            parse_ical_datetime(&prop(&[("TZID", "America/New_York")], "20230101T120000"))
                .unwrap();
        // 12:00 NY is 17:00 UTC, offset kept
        assert_eq!(resolved.instant.to_rfc3339(), "2023-01-01T12:00:00-05:00");
        assert_eq!(
            resolved.instant.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2023, 1, 1, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_ical_datetime_unknown_timezone_falls_back() {
        let resolved =
            parse_ical_datetime(&prop(&[("TZID", "Mars/Olympus")], "20230101T120000")).unwrap();
        assert_eq!(resolved.instant.to_rfc3339(), "2023-01-01T12:00:00+00:00");
    }

    #[test]
    fn test_parse_ical_datetime_date_only() {
        let explicit = parse_ical_datetime(&prop(&[("VALUE", "DATE")], "20231225")).unwrap();
        let implicit = parse_ical_datetime(&prop(&[], "20231225")).unwrap();
        assert!(explicit.date_only && implicit.date_only);
        assert_eq!(explicit.instant.to_rfc3339(), "2023-12-25T00:00:00+00:00");
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_parse_ical_datetime_garbage() {
        assert!(parse_ical_datetime(&prop(&[], "tomorrow")).is_none());
        assert!(parse_ical_datetime(&prop(&[("VALUE", "DATE")], "2023-13-45")).is_none());
        assert!(parse_ical_datetime(&prop(&[], "")).is_none());
    }

    #[test]
    fn test_parse_remote_datetime() {
        let timed = parse_remote_datetime(Some("2024-05-02T09:30:00+02:00"), None).unwrap();
        assert_eq!(timed.instant.to_rfc3339(), "2024-05-02T09:30:00+02:00");

        let all_day = parse_remote_datetime(None, Some("2024-12-25")).unwrap();
        assert!(all_day.date_only);
        assert_eq!(all_day.instant.to_rfc3339(), "2024-12-25T00:00:00+00:00");

        // dateTime wins when both are present
        let both = parse_remote_datetime(Some("2024-01-01T08:00:00Z"), Some("2024-02-02")).unwrap();
        assert!(!both.date_only);

        assert!(parse_remote_datetime(None, None).is_none());
        assert!(parse_remote_datetime(Some("soon"), Some("")).is_none());
    }

    #[test]
    fn test_parse_ical_duration() {
        assert_eq!(parse_ical_duration("PT1H30M"), Some(Duration::minutes(90)));
        assert_eq!(parse_ical_duration("P1D"), Some(Duration::days(1)));
        assert_eq!(parse_ical_duration("P2W"), Some(Duration::weeks(2)));
        assert_eq!(parse_ical_duration("P1DT12H"), Some(Duration::hours(36)));
        assert_eq!(parse_ical_duration("-PT15M"), Some(Duration::minutes(-15)));
        assert_eq!(parse_ical_duration("PT"), None);
        assert_eq!(parse_ical_duration("1H"), None);
        assert_eq!(parse_ical_duration("P1H"), None);
    }

    #[test]
    fn test_repeated_duration_components_accumulate() {
        let repeated = format!("P{}", "1000000W".repeat(14));
        assert_eq!(parse_ical_duration(&repeated), Some(Duration::weeks(14_000_000)));
        assert_eq!(parse_ical_duration("P1000001W"), None);
    }

    #[test]
    fn test_unescape_text() {
        assert_eq!(unescape_text(r"Lunch\, then talk\; bring\\notes\nok"), "Lunch, then talk; bring\\notes\nok");
        assert_eq!(unescape_text("plain"), "plain");
        assert_eq!(unescape_text("trailing\\"), "trailing\\");
    }
}
