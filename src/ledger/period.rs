use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Highest day-of-month usable for billing due dates without running into
/// short months (February caps at 28 outside leap years).
pub const MAX_DUE_DAY: u32 = 28;

/// A competence period: the budget month a ledger movement is attributed to,
/// independent of its posting date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::Validation(format!(
                "month {} out of range 1..=12",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First calendar day of the period.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap_or_default())
    }

    pub fn next(&self) -> Self {
        self.add_months(1)
    }

    pub fn add_months(&self, months: i32) -> Self {
        let mut year = self.year;
        let mut month = self.month as i32 + months;
        while month > 12 {
            month -= 12;
            year += 1;
        }
        while month < 1 {
            month += 12;
            year -= 1;
        }
        Self {
            year,
            month: month as u32,
        }
    }

    /// Due date for an invoice closing in this period: the configured day in
    /// the following month, clamped to [`MAX_DUE_DAY`] so short months never
    /// shift the date.
    pub fn due_date(&self, due_day: u32) -> NaiveDate {
        let target = self.next();
        let day = due_day.clamp(1, MAX_DUE_DAY);
        NaiveDate::from_ymd_opt(target.year, target.month, day)
            .unwrap_or_else(|| target.first_day())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation(format!("invalid period `{}`, expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month)
    }
}

/// Shifts a date by whole months, clamping the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let period = Period::from_date(date).add_months(months);
    let day = date.day().min(days_in_month(period.year, period.month));
    NaiveDate::from_ymd_opt(period.year, period.month, day).unwrap_or_else(|| period.first_day())
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap_or_default());
    let last_current = first_next - Duration::days(1);
    last_current.day()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_and_formats_period() {
        let period: Period = "2026-01".parse().unwrap();
        assert_eq!(period, Period::new(2026, 1).unwrap());
        assert_eq!(period.to_string(), "2026-01");
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!("2026-13".parse::<Period>().is_err());
        assert!("garbage".parse::<Period>().is_err());
    }

    #[test]
    fn add_months_rolls_years_both_ways() {
        let period = Period::new(2026, 11).unwrap();
        assert_eq!(period.add_months(2), Period::new(2027, 1).unwrap());
        assert_eq!(period.add_months(-11), Period::new(2025, 12).unwrap());
    }

    #[test]
    fn due_date_clamps_short_months() {
        let period = Period::new(2026, 1).unwrap();
        assert_eq!(period.due_date(31), date(2026, 2, 28));
    }

    #[test]
    fn due_date_rolls_into_next_year() {
        let period = Period::new(2026, 12).unwrap();
        assert_eq!(period.due_date(5), date(2027, 1, 5));
    }

    #[test]
    fn shift_month_clamps_day() {
        assert_eq!(shift_month(date(2026, 1, 31), 1), date(2026, 2, 28));
        assert_eq!(shift_month(date(2026, 1, 31), 3), date(2026, 4, 30));
        assert_eq!(shift_month(date(2026, 3, 15), -1), date(2026, 2, 15));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2026, 12), 31);
    }
}
