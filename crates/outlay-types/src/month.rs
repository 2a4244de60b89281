//! Calendar-month windows for filtered expense fetches.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::fault::Fault;

/// A half-open calendar-month window `[start, end)`.
///
/// The upper bound is computed by adding one calendar month to the start,
/// not a fixed day count, so the window is correct across months of varying
/// length (including February in leap years).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl MonthWindow {
    /// Window for the month containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        let first = date.with_day(1).expect("day 1 is valid for every month");
        let next = first
            .checked_add_months(Months::new(1))
            .expect("month rollover stays in range");
        Self {
            start: first
                .and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time")
                .and_utc(),
            end: next
                .and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time")
                .and_utc(),
        }
    }

    /// Parse a `YYYY-MM` string into the corresponding window.
    pub fn parse(s: &str) -> Result<Self, Fault> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| Fault::validation(format!("expected YYYY-MM, got {:?}", s)))?;
        let year: i32 = year
            .parse()
            .map_err(|_| Fault::validation(format!("bad year in {:?}", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| Fault::validation(format!("bad month in {:?}", s)))?;
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Fault::validation(format!("no such month: {:?}", s)))?;
        Ok(Self::containing(first))
    }

    /// Window for the current month.
    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether a timestamp falls inside the window (start inclusive, end
    /// exclusive).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// The window label, e.g. "2024-02".
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_february_window_in_leap_year() {
        let window = MonthWindow::parse("2024-02").unwrap();
        assert_eq!(window.start(), ts("2024-02-01T00:00:00Z"));
        assert_eq!(window.end(), ts("2024-03-01T00:00:00Z"));

        // Boundary start is included, boundary end is excluded.
        assert!(window.contains(ts("2024-02-01T00:00:00Z")));
        assert!(window.contains(ts("2024-02-29T23:59:59Z")));
        assert!(!window.contains(ts("2024-03-01T00:00:00Z")));
        assert!(!window.contains(ts("2024-01-31T23:59:59Z")));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let window = MonthWindow::parse("2023-12").unwrap();
        assert_eq!(window.end(), ts("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_containing_mid_month_date() {
        let window = MonthWindow::containing(NaiveDate::from_ymd_opt(2024, 7, 19).unwrap());
        assert_eq!(window.start(), ts("2024-07-01T00:00:00Z"));
        assert_eq!(window.label(), "2024-07");
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(MonthWindow::parse("2024").is_err());
        assert!(MonthWindow::parse("2024-13").is_err());
        assert!(MonthWindow::parse("02-2024x").is_err());
    }
}
