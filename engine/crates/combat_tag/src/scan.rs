use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use combat_model::Clock;

use crate::tracker::{CombatTagTracker, ExpiredTag};

/// Tag lifetime and how often expiry is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub combat_timeout_secs: u64,
    pub scan_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            combat_timeout_secs: 15,
            scan_interval_ms: 1_000,
        }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.combat_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms.max(1))
    }
}

/// Outcome of one expiry pass.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub expired: Vec<ExpiredTag>,
    pub remaining: usize,
    pub duration_us: u64,
}

/// One periodic expiry pass over the tracker, read against a clock.
#[derive(Clone)]
pub struct ExpiryScan {
    tracker: CombatTagTracker,
    clock: Arc<dyn Clock>,
}

impl ExpiryScan {
    pub fn new(tracker: CombatTagTracker, clock: Arc<dyn Clock>) -> Self {
        Self { tracker, clock }
    }

    pub fn run(&self) -> ScanReport {
        let started = Instant::now();
        let expired = self.tracker.expire(self.clock.now());
        let report = ScanReport {
            remaining: self.tracker.len(),
            duration_us: started.elapsed().as_micros() as u64,
            expired,
        };
        if !report.expired.is_empty() {
            tracing::debug!(
                expired = report.expired.len(),
                remaining = report.remaining,
                duration_us = report.duration_us,
                "combat tags expired"
            );
        }
        report
    }
}
