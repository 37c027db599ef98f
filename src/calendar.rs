use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Result};

/// a calendar week, monday 00:00:00 through sunday 23:59:59 (utc)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// the window immediately after this one, `None` past the last representable date
    pub fn next(&self) -> Option<WeekWindow> {
        Some(WeekWindow {
            start: self.start.checked_add_signed(Duration::days(7))?,
            end: self.end.checked_add_signed(Duration::days(7))?,
        })
    }
}

/// the week containing `instant`; sunday belongs to the week begun the monday before.
///
/// `None` only at the edges of the representable date range.
pub fn week_window(instant: DateTime<Utc>) -> Option<WeekWindow> {
    let date = instant.date_naive();
    let monday = date.checked_sub_signed(Duration::days(i64::from(
        date.weekday().num_days_from_monday(),
    )))?;
    let start = Utc.from_utc_datetime(&monday.and_time(NaiveTime::default()));
    let end = start
        .checked_add_signed(Duration::days(7))?
        .checked_sub_signed(Duration::seconds(1))?;

    Some(WeekWindow { start, end })
}

/// `count` consecutive weeks, the first being the week containing `start`
pub fn weekly_windows(start: DateTime<Utc>, count: u32) -> Result<Vec<WeekWindow>> {
    let out_of_calendar = || {
        BillingError::validation(
            "weeks",
            format!("a term of {} weeks from {} runs past the calendar", count, start),
        )
    };

    let mut current = week_window(start).ok_or_else(out_of_calendar)?;
    // the term ends one second before `count` whole weeks after the first monday
    current
        .start
        .checked_add_signed(Duration::weeks(i64::from(count)))
        .ok_or_else(out_of_calendar)?;

    let mut windows = Vec::with_capacity(count as usize);
    for index in 0..count {
        windows.push(current);
        if index + 1 < count {
            current = current.next().ok_or_else(out_of_calendar)?;
        }
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_window_midweek() {
        // thursday
        let today = Utc.with_ymd_and_hms(2025, 8, 7, 8, 30, 30).unwrap();
        let window = week_window(today).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 8, 4, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 8, 10, 23, 59, 59).unwrap());
        assert!(window.contains(today));
    }

    #[test]
    fn test_sunday_and_monday_edges() {
        let sunday = Utc.with_ymd_and_hms(2025, 8, 10, 23, 0, 0).unwrap();
        assert_eq!(
            week_window(sunday).unwrap().start,
            Utc.with_ymd_and_hms(2025, 8, 4, 0, 0, 0).unwrap()
        );

        let monday = Utc.with_ymd_and_hms(2025, 8, 11, 0, 0, 0).unwrap();
        let window = week_window(monday).unwrap();
        assert_eq!(window.start, monday);
        assert!(!window.contains(sunday));
    }

    #[test]
    fn test_weekly_windows() {
        let today = Utc.with_ymd_and_hms(2025, 8, 7, 8, 30, 30).unwrap();
        let windows = weekly_windows(today, 5).unwrap();

        assert_eq!(windows.len(), 5);
        assert_eq!(windows[1].start, Utc.with_ymd_and_hms(2025, 8, 11, 0, 0, 0).unwrap());
        assert_eq!(windows[1].end, Utc.with_ymd_and_hms(2025, 8, 17, 23, 59, 59).unwrap());
        assert_eq!(windows[4].start, Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
        assert_eq!(windows[4].end, Utc.with_ymd_and_hms(2025, 9, 7, 23, 59, 59).unwrap());

        assert!(weekly_windows(today, 0).unwrap().is_empty());
    }

    #[test]
    fn test_term_past_the_calendar_is_rejected() {
        let today = Utc.with_ymd_and_hms(2025, 8, 6, 0, 0, 0).unwrap();
        let err = weekly_windows(today, 14_000_000).unwrap_err();
        assert!(matches!(err, BillingError::Validation { field: "weeks", .. }));

        let last = WeekWindow {
            start: DateTime::<Utc>::MAX_UTC - Duration::days(3),
            end: DateTime::<Utc>::MAX_UTC,
        };
        assert_eq!(last.next(), None);
    }
}
