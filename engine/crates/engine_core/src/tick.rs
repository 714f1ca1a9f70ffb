use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

use combat_model::CombatEvent;
use punishment::{ActorHost, CurrencyLedger};

use crate::command::{CommandStream, EngineCommand};
use crate::combat_core::{AttackDecision, CombatCore};

/// Tick loop configuration.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second.
    pub tps: u32,
    /// Maximum ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tps: 20,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tps.max(1) as f64)
    }
}

/// Everything a tick hands back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickOutput {
    Decision(AttackDecision),
    Event(CombatEvent),
}

/// The synchronous context: drains queued commands into the combat core once
/// per tick and collects what the host needs to hear about.
pub struct TickLoop<H, L> {
    pub core: CombatCore<H, L>,
    pub commands: CommandStream,
    pub config: TickConfig,
    pub current_tick: u64,
    inbox: Option<UnboundedReceiver<EngineCommand>>,
    outputs: Vec<TickOutput>,
}

impl<H: ActorHost, L: CurrencyLedger> TickLoop<H, L> {
    pub fn new(config: TickConfig, core: CombatCore<H, L>) -> Self {
        Self {
            core,
            commands: CommandStream::new(),
            config,
            current_tick: 0,
            inbox: None,
            outputs: Vec::new(),
        }
    }

    /// Attach the channel background tasks and the host bridge send on.
    pub fn with_inbox(mut self, inbox: UnboundedReceiver<EngineCommand>) -> Self {
        self.inbox = Some(inbox);
        self
    }

    /// Execute a single tick: inbox → apply commands → collect events → metrics.
    pub fn step(&mut self) -> observability::TickMetrics {
        let start = Instant::now();

        if let Some(inbox) = self.inbox.as_mut() {
            while let Ok(cmd) = inbox.try_recv() {
                self.commands.push(cmd);
            }
        }
        let command_count = self.commands.len();

        for cmd in self.commands.drain() {
            if let Some(decision) = self.core.apply(cmd) {
                self.outputs.push(TickOutput::Decision(decision));
            }
        }

        let events = self.core.drain_events();
        let event_count = events.len();
        self.outputs.extend(events.into_iter().map(TickOutput::Event));

        self.current_tick += 1;
        observability::TickMetrics {
            tick_number: self.current_tick,
            duration_us: start.elapsed().as_micros(),
            budget_us: self.config.tick_duration().as_micros(),
            command_count,
            event_count,
            actor_count: self.core.registry().len(),
            tagged_count: self.core.tracker().len(),
        }
    }

    pub fn take_outputs(&mut self) -> Vec<TickOutput> {
        std::mem::take(&mut self.outputs)
    }

    /// Run for the configured number of ticks (or forever when unlimited).
    pub fn run(&mut self) -> Vec<observability::TickMetrics> {
        let mut all_metrics = Vec::new();
        let tick_duration = self.config.tick_duration();

        loop {
            if self.config.max_ticks > 0 && self.current_tick >= self.config.max_ticks {
                break;
            }

            let tick_start = Instant::now();
            let metrics = self.step();
            metrics.log();
            all_metrics.push(metrics);

            let elapsed = tick_start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            }
        }

        all_metrics
    }

    /// Tick until `should_stop` says so, passing every output to `sink`.
    /// `prepare` runs before each step and may queue commands or touch the
    /// host. On stop, commands already queued are applied, then the core is
    /// drained and its final events are flushed.
    pub fn run_until<S, P, F>(&mut self, should_stop: S, mut prepare: P, mut sink: F)
    where
        S: Fn() -> bool,
        P: FnMut(&mut Self),
        F: FnMut(TickOutput),
    {
        let tick_duration = self.config.tick_duration();
        loop {
            if should_stop() {
                tracing::info!(tick = self.current_tick, "tick loop: shutdown signal received");
                prepare(&mut *self);
                self.step();
                self.core.shutdown();
                self.outputs
                    .extend(self.core.drain_events().into_iter().map(TickOutput::Event));
                self.take_outputs().into_iter().for_each(&mut sink);
                break;
            }

            let tick_start = Instant::now();
            prepare(&mut *self);
            let metrics = self.step();
            metrics.log();
            self.take_outputs().into_iter().for_each(&mut sink);

            let elapsed = tick_start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            }
        }
        tracing::info!("tick loop stopped");
    }
}
