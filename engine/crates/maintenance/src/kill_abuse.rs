use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use combat_model::ActorId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillAbuseConfig {
    pub enabled: bool,
    /// Kills of the same victim before the killer is flagged.
    pub max_kills: u32,
    /// Counters are wiped every `time_secs`. Zero disables cleanup.
    pub time_secs: u64,
}

impl Default for KillAbuseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_kills: 5,
            time_secs: 60,
        }
    }
}

impl KillAbuseConfig {
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.enabled && self.time_secs > 0).then(|| Duration::from_secs(self.time_secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillVerdict {
    Ignored,
    Counted(u32),
    /// The killer reached the limit against this victim.
    Abusive(u32),
}

/// Repeat-kill counters per killer and victim.
#[derive(Debug, Default)]
pub struct KillAbuseTracker {
    config: KillAbuseConfig,
    counts: BTreeMap<ActorId, BTreeMap<ActorId, u32>>,
}

impl KillAbuseTracker {
    pub fn new(config: KillAbuseConfig) -> Self {
        Self {
            config,
            counts: BTreeMap::new(),
        }
    }

    pub fn set_config(&mut self, config: KillAbuseConfig) {
        self.config = config;
    }

    pub fn record_kill(&mut self, killer: ActorId, victim: ActorId) -> KillVerdict {
        if !self.config.enabled || killer == victim {
            return KillVerdict::Ignored;
        }
        let count = self.counts.entry(killer).or_default().entry(victim).or_insert(0);
        *count = count.saturating_add(1);
        if *count >= self.config.max_kills.max(1) {
            tracing::info!(killer = %killer, victim = %victim, kills = *count, "kill abuse detected");
            KillVerdict::Abusive(*count)
        } else {
            KillVerdict::Counted(*count)
        }
    }

    pub fn kills(&self, killer: ActorId, victim: ActorId) -> u32 {
        self.counts
            .get(&killer)
            .and_then(|v| v.get(&victim))
            .copied()
            .unwrap_or(0)
    }

    /// Wipe every counter. Returns how many killers were tracked.
    pub fn reset(&mut self) -> usize {
        let cleared = self.counts.len();
        self.counts.clear();
        cleared
    }

    /// Forget a single actor on both sides.
    pub fn forget(&mut self, actor: ActorId) {
        self.counts.remove(&actor);
        for victims in self.counts.values_mut() {
            victims.remove(&actor);
        }
    }
}
