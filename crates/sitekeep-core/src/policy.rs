// ── Policy gate ──
//
// Maps subscription plan and billing state to the maintenance a site is
// entitled to. Pure and total; callers re-evaluate it on every pass
// because billing state changes between passes.

use crate::model::{BillingStatus, Plan, TaskKind, TaskSet};

/// Task kinds enabled for a site with the given plan and billing status.
///
/// | billing               | basic  | standard       | pro                 |
/// |-----------------------|--------|----------------|---------------------|
/// | `active`              | uptime | uptime, backup | uptime, backup, seo |
/// | `inactive`/`past_due` | uptime | uptime         | uptime              |
/// | `canceled`            | none   | none           | none                |
pub fn enabled_tasks(plan: Plan, billing: BillingStatus) -> TaskSet {
    match (billing, plan) {
        (BillingStatus::Canceled, _) => TaskSet::empty(),
        (BillingStatus::Inactive | BillingStatus::PastDue, _) | (BillingStatus::Active, Plan::Basic) => {
            TaskSet::from([TaskKind::Uptime])
        }
        (BillingStatus::Active, Plan::Standard) => {
            TaskSet::from([TaskKind::Uptime, TaskKind::Backup])
        }
        (BillingStatus::Active, Plan::Pro) => TaskSet::all(),
    }
}

/// Whether the weekly report is sent for this plan and billing status.
pub fn weekly_report_enabled(plan: Plan, billing: BillingStatus) -> bool {
    plan == Plan::Pro && billing == BillingStatus::Active
}
