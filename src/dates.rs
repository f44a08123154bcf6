//! Date arithmetic replicating the legacy spreadsheet conventions
//!
//! Two age conventions coexist here on purpose. The exact month difference
//! uses a day-only borrow (it drives every mortality table index), while the
//! balance projection's current-age term rounds elapsed days over a 365.25-day
//! year. The source workbook used a different formula in each cell; both are
//! preserved as-is and must not be unified.

use chrono::{Datelike, NaiveDate};

/// Decomposed difference between two dates under the day-only borrow rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthDiff {
    /// Total elapsed months: `years_part * 12 + months_part`
    pub months: i32,
    pub years_part: i32,
    pub months_part: i32,
    /// Raw day-of-month difference. May be negative; the deficit has already
    /// been borrowed into `months_part`, the day field itself is never
    /// normalized into a full calendar subtraction.
    pub days_part: i32,
}

/// Exact month difference with the legacy day-only borrow.
///
/// A deficit in the day field borrows one month; a deficit in the month field
/// then borrows one year. Downstream table indices depend on this exact rule.
pub fn exact_month_diff(birth: NaiveDate, reference: NaiveDate) -> MonthDiff {
    let mut years = reference.year() - birth.year();
    let mut months = reference.month() as i32 - birth.month() as i32;
    let days = reference.day() as i32 - birth.day() as i32;

    if days < 0 {
        months -= 1;
    }
    if months < 0 {
        months += 12;
        years -= 1;
    }

    MonthDiff {
        months: years * 12 + months,
        years_part: years,
        months_part: months,
        days_part: days,
    }
}

/// Age in whole years over a 365.25-day year, rounded half away from zero
pub fn age_in_whole_years(birth: NaiveDate, reference: NaiveDate) -> i64 {
    let days = reference.signed_duration_since(birth).num_days();
    (days as f64 / 365.25).round() as i64
}

/// Calendar year addition. A Feb 29 anniversary landing on a non-leap year
/// normalizes forward to Mar 1, matching the legacy runtime.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(date)
}

/// Retirement is the later of the calculation date and the 65th birthday
pub fn retirement_date(primary_birth: NaiveDate, calculation_date: NaiveDate) -> NaiveDate {
    calculation_date.max(add_years(primary_birth, 65))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_diff_day_borrow() {
        let diff = exact_month_diff(d(1972, 4, 7), d(2031, 5, 19));
        assert_eq!(diff.months, 709);
        assert_eq!(diff.years_part, 59);
        assert_eq!(diff.months_part, 1);
        assert_eq!(diff.days_part, 12);
    }

    #[test]
    fn test_month_diff_negative_day_keeps_raw_days() {
        // Day 21 > day 10 borrows a month; months go negative and borrow a year
        let diff = exact_month_diff(d(1975, 8, 21), d(2035, 3, 10));
        assert_eq!(diff.months, 714);
        assert_eq!(diff.years_part, 59);
        assert_eq!(diff.months_part, 6);
        assert_eq!(diff.days_part, -11);
    }

    #[test]
    fn test_month_diff_exact_anniversary() {
        let diff = exact_month_diff(d(1966, 5, 19), d(2031, 5, 19));
        assert_eq!(diff.months, 780);
        assert_eq!(diff.days_part, 0);
    }

    #[test]
    fn test_age_in_whole_years_365_25() {
        assert_eq!(age_in_whole_years(d(1966, 5, 19), d(2024, 2, 22)), 58);
        // Just under half a year rounds down
        assert_eq!(age_in_whole_years(d(2000, 1, 1), d(2030, 6, 1)), 30);
    }

    #[test]
    fn test_add_years_leap_day() {
        assert_eq!(add_years(d(2000, 2, 29), 4), d(2004, 2, 29));
        assert_eq!(add_years(d(2000, 2, 29), 65), d(2065, 3, 1));
    }

    #[test]
    fn test_retirement_date_is_later_of_pair() {
        // 65th birthday after calculation date
        assert_eq!(retirement_date(d(1966, 5, 19), d(2024, 2, 22)), d(2031, 5, 19));
        // Already past 65: retirement collapses to the calculation date
        assert_eq!(retirement_date(d(1950, 1, 1), d(2024, 2, 22)), d(2024, 2, 22));
    }
}
