use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{EngineError, Result};
use crate::ledger::{LedgerEntry, Workspace};

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Ids of the ledger entries created for due rules.
    pub created: Vec<Uuid>,
    /// Rules that were inactive, outside their window, or not yet due.
    pub skipped: usize,
    /// Rules whose generation failed. Failures are isolated per rule.
    pub failures: Vec<RuleFailure>,
}

#[derive(Debug, Clone)]
pub struct RuleFailure {
    pub rule_id: Uuid,
    pub reason: String,
}

/// Scans active recurring rules and materializes one ledger entry per due
/// rule. Driven by an external periodic caller, one tick at a time.
pub struct SchedulerService;

impl SchedulerService {
    /// Runs one tick at `now`. Each rule is evaluated independently: a
    /// failure is recorded and the tick continues with the remaining rules.
    /// `last_run_at` advances only after the entry has been appended, so a
    /// crash can at worst duplicate one entry per rule, never lose one.
    pub fn tick(workspace: &mut Workspace, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        let rule_ids: Vec<Uuid> = workspace
            .recurring_rules
            .iter()
            .map(|rule| rule.id)
            .collect();

        for rule_id in rule_ids {
            match Self::run_rule(workspace, rule_id, now) {
                Ok(Some(entry_id)) => report.created.push(entry_id),
                Ok(None) => report.skipped += 1,
                Err(err) => {
                    tracing::warn!(%rule_id, error = %err, "recurring rule generation failed");
                    report.failures.push(RuleFailure {
                        rule_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            created = report.created.len(),
            skipped = report.skipped,
            failures = report.failures.len(),
            "scheduler tick complete"
        );
        report
    }

    fn run_rule(
        workspace: &mut Workspace,
        rule_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>> {
        let rule = workspace
            .rule(rule_id)
            .ok_or_else(|| EngineError::Validation(format!("rule {} vanished mid-tick", rule_id)))?;
        if !rule.active || !rule.in_window(now) || !rule.is_due(now) {
            return Ok(None);
        }

        let entry = rule.to_entry(now);
        Self::validate_entry(workspace, &entry)?;

        // The entry must be durably appended before last_run_at advances.
        let entry_id = workspace.add_entry(entry);
        if let Some(rule) = workspace.rule_mut(rule_id) {
            rule.last_run_at = Some(now);
        }
        Ok(Some(entry_id))
    }

    fn validate_entry(workspace: &Workspace, entry: &LedgerEntry) -> Result<()> {
        if entry.amount.is_zero() {
            return Err(EngineError::Validation(
                "recurring rule has a zero amount".into(),
            ));
        }
        if let Some(category_id) = entry.category_id {
            if workspace.category(category_id).is_none() {
                return Err(EngineError::CategoryNotFound(category_id.to_string()));
            }
        }
        if let Some(account_id) = entry.account_id {
            if workspace.account(account_id).is_none() {
                return Err(EngineError::AccountNotFound(account_id.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{EntryKind, Frequency, RecurringRule};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn daily_rule(start: DateTime<Utc>) -> RecurringRule {
        RecurringRule::new("Coffee", dec!(5), EntryKind::Expense, Frequency::Day, start)
    }

    #[test]
    fn due_rule_creates_entry_and_advances_last_run() {
        let mut workspace = Workspace::new("home");
        let start = at(2026, 1, 1, 0, 0);
        let rule_id = workspace.add_rule(daily_rule(start));

        let now = at(2026, 1, 2, 9, 0);
        let report = SchedulerService::tick(&mut workspace, now);

        assert_eq!(report.created.len(), 1);
        assert!(report.failures.is_empty());
        let entry = workspace.entry(report.created[0]).unwrap();
        assert_eq!(entry.recurring_rule_id, Some(rule_id));
        assert_eq!(workspace.rule(rule_id).unwrap().last_run_at, Some(now));
    }

    #[test]
    fn second_tick_same_day_creates_nothing() {
        let mut workspace = Workspace::new("home");
        workspace.add_rule(daily_rule(at(2026, 1, 1, 0, 0)));

        let first = SchedulerService::tick(&mut workspace, at(2026, 1, 2, 9, 0));
        let second = SchedulerService::tick(&mut workspace, at(2026, 1, 2, 9, 5));

        assert_eq!(first.created.len(), 1);
        assert!(second.created.is_empty());
        assert_eq!(second.skipped, 1);
        assert_eq!(workspace.entries.len(), 1);
    }

    #[test]
    fn inactive_and_out_of_window_rules_are_skipped() {
        let mut workspace = Workspace::new("home");
        let mut inactive = daily_rule(at(2026, 1, 1, 0, 0));
        inactive.active = false;
        workspace.add_rule(inactive);
        let mut ended = daily_rule(at(2026, 1, 1, 0, 0));
        ended.end_at = Some(at(2026, 1, 2, 0, 0));
        workspace.add_rule(ended);

        let report = SchedulerService::tick(&mut workspace, at(2026, 1, 3, 9, 0));
        assert!(report.created.is_empty());
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn failing_rule_does_not_stop_the_tick() {
        let mut workspace = Workspace::new("home");
        let mut broken = daily_rule(at(2026, 1, 1, 0, 0));
        broken.category_id = Some(Uuid::new_v4()); // dangling reference
        let broken_id = workspace.add_rule(broken);
        let healthy_id = workspace.add_rule(daily_rule(at(2026, 1, 1, 0, 0)));

        let report = SchedulerService::tick(&mut workspace, at(2026, 1, 2, 9, 0));

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rule_id, broken_id);
        assert_eq!(report.created.len(), 1);
        let entry = workspace.entry(report.created[0]).unwrap();
        assert_eq!(entry.recurring_rule_id, Some(healthy_id));
        // The failed rule stays eligible for the next tick.
        assert_eq!(workspace.rule(broken_id).unwrap().last_run_at, None);
    }
}
