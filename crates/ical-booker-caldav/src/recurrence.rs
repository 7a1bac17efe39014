//! RRULE expansion for recurring events.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rrule::RRuleSet;
use tracing::{debug, warn};

use ical_booker_core::{TimeWindow, format_caldav_timestamp};

use crate::error::{CalDavError, CalDavResult};
use crate::ics::IcsTime;

/// Builds the two-line rule text the `rrule` parser expects.
fn build_rrule_string(start: &IcsTime, rrule: &str) -> String {
    let rule = rrule.trim();
    let rule = rule.strip_prefix("RRULE:").unwrap_or(rule);
    let rule = rule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                format!("UNTIL={}", until_as_utc(start, value))
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";");
    format!("{}\nRRULE:{}", start.to_dtstart_line(), rule)
}

/// Rewrites a DATE or local `UNTIL` as a UTC instant.
///
/// DTSTART is always handed to `rrule` as UTC or with a `TZID`, and both
/// require a UTC `UNTIL`. A local `UNTIL` is read in the zone of DTSTART.
fn until_as_utc(start: &IcsTime, value: &str) -> String {
    let value = value.trim();
    if value.ends_with(['Z', 'z']) {
        return value.to_string();
    }

    let local = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        });
    let Some(local) = local else {
        return value.to_string();
    };

    let until = match start {
        IcsTime::Zoned { tzid, .. } => IcsTime::Zoned {
            local,
            tzid: tzid.clone(),
        },
        _ => IcsTime::Floating(local),
    };
    format_caldav_timestamp(until.to_utc())
}

/// Returns the occurrence starts of `rrule` anchored at `start` that fall
/// inside `window`, bounds included, in ascending order.
///
/// # Errors
///
/// Returns a `Parse` error if the rule cannot be parsed.
pub fn expand_occurrences(
    start: &IcsTime,
    rrule: &str,
    window: &TimeWindow,
) -> CalDavResult<Vec<DateTime<Utc>>> {
    let rrule_str = build_rrule_string(start, rrule);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        CalDavError::parse(format!("failed to parse RRULE '{}': {}", rrule, e))
    })?;

    // after/before are exclusive; widen by a second and filter below.
    let tz: rrule::Tz = Utc.into();
    let after = (window.start - Duration::seconds(1)).with_timezone(&tz);
    let before = (window.end + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(u16::MAX);
    if result.limited {
        warn!(
            rrule,
            count = result.dates.len(),
            "Recurrence expansion hit the occurrence limit"
        );
    }

    let occurrences: Vec<DateTime<Utc>> = result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| window.contains_instant(*dt))
        .collect();

    debug!(rrule, count = occurrences.len(), "Expanded recurrence");

    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn weekly_in_window() {
        let start = IcsTime::Utc(utc(2025, 1, 6, 15, 0));
        let window = TimeWindow::new(utc(2025, 1, 1, 0, 0), utc(2025, 1, 31, 23, 59));

        let occ = expand_occurrences(&start, "FREQ=WEEKLY;BYDAY=MO", &window).unwrap();
        assert_eq!(
            occ,
            vec![
                utc(2025, 1, 6, 15, 0),
                utc(2025, 1, 13, 15, 0),
                utc(2025, 1, 20, 15, 0),
                utc(2025, 1, 27, 15, 0),
            ]
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = IcsTime::Utc(utc(2025, 1, 1, 9, 0));
        let window = TimeWindow::new(utc(2025, 1, 2, 9, 0), utc(2025, 1, 4, 9, 0));

        let occ = expand_occurrences(&start, "FREQ=DAILY", &window).unwrap();
        assert_eq!(
            occ,
            vec![utc(2025, 1, 2, 9, 0), utc(2025, 1, 3, 9, 0), utc(2025, 1, 4, 9, 0)]
        );
    }

    #[test]
    fn count_limited_rule() {
        let start = IcsTime::Utc(utc(2025, 1, 1, 9, 0));
        let window = TimeWindow::new(utc(2025, 1, 1, 0, 0), utc(2025, 12, 31, 0, 0));

        let occ = expand_occurrences(&start, "RRULE:FREQ=DAILY;COUNT=3", &window).unwrap();
        assert_eq!(occ.len(), 3);
        assert_eq!(occ[2], utc(2025, 1, 3, 9, 0));
    }

    #[test]
    fn rule_ending_before_window() {
        let start = IcsTime::Utc(utc(2024, 1, 1, 9, 0));
        let window = TimeWindow::new(utc(2025, 1, 1, 0, 0), utc(2025, 2, 1, 0, 0));

        let occ = expand_occurrences(&start, "FREQ=DAILY;UNTIL=20240110T090000Z", &window).unwrap();
        assert!(occ.is_empty());
    }

    #[test]
    fn zoned_rule_follows_dst() {
        // 09:00 Toronto is 14:00Z in winter and 13:00Z in summer.
        let start = IcsTime::Zoned {
            local: NaiveDate::from_ymd_opt(2025, 3, 3)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            tzid: "America/Toronto".to_string(),
        };
        let window = TimeWindow::new(utc(2025, 3, 3, 0, 0), utc(2025, 3, 17, 23, 0));

        let occ = expand_occurrences(&start, "FREQ=WEEKLY", &window).unwrap();
        assert_eq!(
            occ,
            vec![utc(2025, 3, 3, 14, 0), utc(2025, 3, 10, 13, 0), utc(2025, 3, 17, 13, 0)]
        );
    }

    #[test]
    fn all_day_rule_starts_at_midnight_utc() {
        let start = IcsTime::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let window = TimeWindow::new(utc(2025, 1, 1, 0, 0), utc(2025, 3, 15, 0, 0));

        let occ = expand_occurrences(&start, "FREQ=MONTHLY", &window).unwrap();
        assert_eq!(
            occ,
            vec![utc(2025, 1, 1, 0, 0), utc(2025, 2, 1, 0, 0), utc(2025, 3, 1, 0, 0)]
        );
    }

    #[test]
    fn all_day_rule_with_date_until() {
        let start = IcsTime::Date(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        let window = TimeWindow::new(utc(2025, 1, 1, 0, 0), utc(2025, 6, 1, 0, 0));

        let occ = expand_occurrences(&start, "FREQ=WEEKLY;UNTIL=20250331", &window).unwrap();
        assert_eq!(occ.len(), 13);
        assert_eq!(occ[0], utc(2025, 1, 6, 0, 0));
        assert_eq!(occ[12], utc(2025, 3, 31, 0, 0));
    }

    #[test]
    fn floating_rule_with_local_until() {
        let start = IcsTime::Floating(
            NaiveDate::from_ymd_opt(2025, 3, 3)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        );
        let window = TimeWindow::new(utc(2025, 3, 1, 0, 0), utc(2025, 3, 31, 0, 0));

        let occ = expand_occurrences(&start, "FREQ=DAILY;UNTIL=20250305T090000", &window).unwrap();
        assert_eq!(
            occ,
            vec![utc(2025, 3, 3, 9, 0), utc(2025, 3, 4, 9, 0), utc(2025, 3, 5, 9, 0)]
        );
    }

    #[test]
    fn zoned_rule_with_local_until() {
        let start = IcsTime::Zoned {
            local: NaiveDate::from_ymd_opt(2025, 3, 3)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            tzid: "America/Toronto".to_string(),
        };
        let window = TimeWindow::new(utc(2025, 3, 1, 0, 0), utc(2025, 4, 30, 0, 0));

        let occ = expand_occurrences(&start, "FREQ=WEEKLY;UNTIL=20250317T090000", &window).unwrap();
        assert_eq!(
            occ,
            vec![utc(2025, 3, 3, 14, 0), utc(2025, 3, 10, 13, 0), utc(2025, 3, 17, 13, 0)]
        );
    }

    #[test]
    fn until_rewriting() {
        let date = IcsTime::Date(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(
            build_rrule_string(&date, "RRULE:FREQ=WEEKLY;UNTIL=20250331;BYDAY=MO"),
            "DTSTART:20250106T000000Z\nRRULE:FREQ=WEEKLY;UNTIL=20250331T000000Z;BYDAY=MO"
        );
        assert_eq!(
            build_rrule_string(&date, "FREQ=DAILY;UNTIL=20250110T120000Z"),
            "DTSTART:20250106T000000Z\nRRULE:FREQ=DAILY;UNTIL=20250110T120000Z"
        );
        assert_eq!(
            build_rrule_string(&date, "FREQ=DAILY;COUNT=2"),
            "DTSTART:20250106T000000Z\nRRULE:FREQ=DAILY;COUNT=2"
        );
    }

    #[test]
    fn malformed_rule() {
        let start = IcsTime::Utc(utc(2025, 1, 1, 9, 0));
        let window = TimeWindow::new(utc(2025, 1, 1, 0, 0), utc(2025, 2, 1, 0, 0));

        let err = expand_occurrences(&start, "FREQ=SOMETIMES", &window).unwrap_err();
        assert_eq!(err.code(), crate::error::CalDavErrorCode::Parse);
    }
}
