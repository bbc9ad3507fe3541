use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{EntryKind, LedgerEntry};
use super::period::Period;

/// How often a recurring rule spawns a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Frequency {
    Minute,
    Day,
    Week,
    Month,
    Year,
}

/// A user-defined template that periodically spawns new ledger entries.
///
/// `last_run_at` is the only scheduling state and is mutated exclusively by
/// the scheduler, after the generated entry has been appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringRule {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub kind: EntryKind,
    pub active: bool,
    pub frequency: Frequency,
    /// Weekday anchor for weekly rules. Falls back to `start_at`'s weekday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
    /// Day-of-month anchor for monthly and yearly rules. Falls back to
    /// `start_at`'s day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Month anchor for yearly rules. Falls back to `start_at`'s month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    pub start_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<Uuid>,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

impl RecurringRule {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        kind: EntryKind,
        frequency: Frequency,
        start_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            kind,
            active: true,
            frequency,
            weekday: None,
            day_of_month: None,
            month: None,
            start_at,
            end_at: None,
            category_id: None,
            account_id: None,
            person_id: None,
            last_run_at: None,
        }
    }

    /// True when `now` falls within the rule's validity window.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        if now < self.start_at {
            return false;
        }
        match self.end_at {
            Some(end) => now < end,
            None => true,
        }
    }

    fn anchor_weekday(&self) -> Weekday {
        self.weekday.unwrap_or_else(|| self.start_at.weekday())
    }

    fn anchor_day(&self) -> u32 {
        self.day_of_month.unwrap_or_else(|| self.start_at.day())
    }

    fn anchor_month(&self) -> u32 {
        self.month.unwrap_or_else(|| self.start_at.month())
    }

    /// Decides whether the rule should spawn an entry at `now`, given when it
    /// last ran. A rule that never ran is always due inside its window.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let last = match self.last_run_at {
            None => return true,
            Some(last) => last,
        };
        let elapsed = now.signed_duration_since(last);
        match self.frequency {
            Frequency::Minute => elapsed >= Duration::minutes(1),
            Frequency::Day => now.date_naive() != last.date_naive(),
            Frequency::Week => {
                elapsed >= Duration::weeks(1) && now.weekday() == self.anchor_weekday()
            }
            Frequency::Month => {
                months_between(last.date_naive(), now.date_naive()) >= 1
                    && now.day() == self.anchor_day()
            }
            Frequency::Year => {
                now.year() > last.year()
                    && now.month() == self.anchor_month()
                    && now.day() == self.anchor_day()
            }
        }
    }

    /// Materializes one ledger entry from this rule, dated and attributed to `now`.
    pub fn to_entry(&self, now: DateTime<Utc>) -> LedgerEntry {
        let date = now.date_naive();
        let mut entry = LedgerEntry::new(self.description.clone(), self.amount, self.kind, date)
            .with_competence(Period::from_date(date));
        entry.category_id = self.category_id;
        entry.account_id = self.account_id;
        entry.person_id = self.person_id;
        entry.recurring_rule_id = Some(self.id);
        entry
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() * 12 + to.month() as i32) - (from.year() * 12 + from.month() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn rule(frequency: Frequency) -> RecurringRule {
        RecurringRule::new(
            "Gym",
            dec!(80),
            EntryKind::Expense,
            frequency,
            at(2026, 1, 1, 0, 0),
        )
    }

    #[test]
    fn never_ran_rule_is_due() {
        let rule = rule(Frequency::Month);
        assert!(rule.is_due(at(2026, 1, 1, 8, 0)));
    }

    #[test]
    fn minute_rule_waits_a_full_minute() {
        let mut rule = rule(Frequency::Minute);
        rule.last_run_at = Some(at(2026, 1, 1, 8, 0));
        assert!(!rule.is_due(at(2026, 1, 1, 8, 0) + Duration::seconds(30)));
        assert!(rule.is_due(at(2026, 1, 1, 8, 1)));
    }

    #[test]
    fn day_rule_is_due_only_when_calendar_day_changes() {
        let mut rule = rule(Frequency::Day);
        rule.last_run_at = Some(at(2026, 1, 5, 8, 0));
        assert!(!rule.is_due(at(2026, 1, 5, 23, 59)));
        assert!(rule.is_due(at(2026, 1, 6, 0, 1)));
    }

    #[test]
    fn week_rule_requires_elapsed_week_and_matching_weekday() {
        let mut rule = rule(Frequency::Week);
        rule.weekday = Some(Weekday::Mon);
        rule.last_run_at = Some(at(2026, 1, 5, 8, 0)); // a Monday
        assert!(!rule.is_due(at(2026, 1, 7, 8, 0))); // too soon
        assert!(!rule.is_due(at(2026, 1, 13, 8, 0))); // a Tuesday
        assert!(rule.is_due(at(2026, 1, 12, 8, 0))); // next Monday
    }

    #[test]
    fn month_rule_fires_on_configured_day() {
        let mut rule = rule(Frequency::Month);
        rule.day_of_month = Some(10);
        rule.last_run_at = Some(at(2026, 1, 10, 8, 0));
        assert!(!rule.is_due(at(2026, 1, 25, 8, 0)));
        assert!(!rule.is_due(at(2026, 2, 9, 8, 0)));
        assert!(rule.is_due(at(2026, 2, 10, 8, 0)));
    }

    #[test]
    fn year_rule_requires_strictly_later_year() {
        let mut rule = rule(Frequency::Year);
        rule.month = Some(3);
        rule.day_of_month = Some(15);
        rule.last_run_at = Some(at(2026, 3, 15, 8, 0));
        assert!(!rule.is_due(at(2026, 12, 15, 8, 0)));
        assert!(!rule.is_due(at(2027, 3, 14, 8, 0)));
        assert!(rule.is_due(at(2027, 3, 15, 8, 0)));
    }

    #[test]
    fn window_bounds_are_inclusive_start_exclusive_end() {
        let mut rule = rule(Frequency::Day);
        rule.end_at = Some(at(2026, 2, 1, 0, 0));
        assert!(!rule.in_window(at(2025, 12, 31, 23, 59)));
        assert!(rule.in_window(at(2026, 1, 1, 0, 0)));
        assert!(!rule.in_window(at(2026, 2, 1, 0, 0)));
    }

    #[test]
    fn to_entry_copies_template_and_backlinks_rule() {
        let mut rule = rule(Frequency::Month);
        rule.category_id = Some(Uuid::new_v4());
        let entry = rule.to_entry(at(2026, 4, 10, 9, 0));
        assert_eq!(entry.amount, dec!(80));
        assert_eq!(entry.recurring_rule_id, Some(rule.id));
        assert_eq!(entry.category_id, rule.category_id);
        assert_eq!(entry.competence, Period::new(2026, 4).unwrap());
    }
}
