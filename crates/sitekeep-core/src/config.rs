// ── Runtime maintenance configuration ──
//
// Cadence-independent knobs for the orchestrator. Built by the binary from
// the loaded config file and handed in; core never reads config files.

use std::time::Duration;

const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceConfig {
    /// Minimum age of the latest backup entry before another backup runs.
    pub backup_interval: Duration,
    /// Minimum age of the latest SEO entry before another audit runs.
    pub seo_interval: Duration,
    /// Trailing window summarized by the weekly report.
    pub report_window: Duration,
    /// Sites processed concurrently within one pass.
    pub max_concurrent_sites: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            backup_interval: WEEK,
            seo_interval: WEEK,
            report_window: WEEK,
            max_concurrent_sites: 4,
        }
    }
}

/// Convert a std duration for timestamp arithmetic, saturating on overflow.
pub(crate) fn to_delta(d: Duration) -> chrono::TimeDelta {
    chrono::TimeDelta::from_std(d).unwrap_or(chrono::TimeDelta::MAX)
}
