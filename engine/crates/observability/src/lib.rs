use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Output goes to stderr so stdout stays free
/// for the host bridge.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub tick_number: u64,
    pub duration_us: u128,
    pub budget_us: u128,
    pub command_count: usize,
    pub event_count: usize,
    pub actor_count: usize,
    /// Actors in the tag tracker at the end of the tick.
    pub tagged_count: usize,
}

impl TickMetrics {
    pub fn over_budget(&self) -> bool {
        self.budget_us > 0 && self.duration_us > self.budget_us
    }

    pub fn log(&self) {
        if self.over_budget() {
            tracing::warn!(
                tick = self.tick_number,
                duration_us = self.duration_us,
                commands = self.command_count,
                events = self.event_count,
                actors = self.actor_count,
                tagged = self.tagged_count,
                "tick exceeded budget ({}us > {}us)",
                self.duration_us,
                self.budget_us
            );
        } else {
            tracing::debug!(
                tick = self.tick_number,
                duration_us = self.duration_us,
                commands = self.command_count,
                events = self.event_count,
                actors = self.actor_count,
                tagged = self.tagged_count,
                "tick completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_check() {
        let mut m = TickMetrics {
            duration_us: 60_000,
            budget_us: 50_000,
            ..TickMetrics::default()
        };
        assert!(m.over_budget());
        m.duration_us = 10;
        assert!(!m.over_budget());
        m.budget_us = 0;
        m.duration_us = u128::MAX;
        assert!(!m.over_budget());
    }
}
