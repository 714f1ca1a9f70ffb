use std::sync::Arc;

use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver, UnboundedSender};

use combat_model::{Clock, CombatEvent};
use engine_core::{CombatCore, EngineCommand, TickLoop, TickOutput};
use punishment::InMemoryLedger;

use crate::bridge::{HostOp, Routed};
use crate::config::ServerConfig;
use crate::host::SimulatedHost;
use crate::shutdown::ShutdownRx;

pub type PvpCore = CombatCore<SimulatedHost, InMemoryLedger>;
pub type PvpTickLoop = TickLoop<SimulatedHost, InMemoryLedger>;

/// Assemble the combat core with the simulated host and an empty ledger.
pub fn build_core(config: &ServerConfig, clock: Arc<dyn Clock>) -> PvpCore {
    let settings = Arc::new(config.to_combat_settings());
    let host = SimulatedHost::new(config.host.inventory_size, config.host.max_health);
    let mut core = CombatCore::new(settings, config.to_zone_table(), clock, host, InMemoryLedger::new());
    core.subscribe(Box::new(|event: &CombatEvent| match event {
        CombatEvent::CombatLog(log) => {
            tracing::info!(actor = %log.actor.id, name = %log.actor.name, "combat logout")
        }
        CombatEvent::KillAbuse { killer, victim, kills } => {
            tracing::info!(killer = %killer, victim = %victim, kills, "kill abuse")
        }
        _ => {}
    }));
    core
}

/// Apply one routed host event on the tick thread.
pub fn apply_routed(tick_loop: &mut PvpTickLoop, routed: Routed, starting_balance: u64) {
    match routed {
        Routed::Engine(cmd) => tick_loop.commands.push(cmd),
        Routed::Host(op) => apply_host_op(&mut tick_loop.core, op, starting_balance),
        Routed::Death { victim, killer } => match tick_loop.core.host_mut().death_of(victim, killer) {
            Some(death) => tick_loop.commands.push(EngineCommand::Death(death)),
            None => tracing::debug!(actor = %victim, "death for a body that is gone or already dead"),
        },
    }
}

fn apply_host_op(core: &mut PvpCore, op: HostOp, starting_balance: u64) {
    match op {
        HostOp::Join {
            actor,
            location,
            balance,
        } => {
            core.host_mut().join(actor, location);
            core.ledger_mut().open(actor, balance.unwrap_or(starting_balance));
        }
        HostOp::Move { actor, location } => core.host_mut().move_to(actor, location),
        HostOp::Give { actor, items } => {
            let overflow = core.host_mut().give(actor, items);
            if !overflow.is_empty() {
                tracing::debug!(actor = %actor, stacks = overflow.len(), "inventory full, items discarded");
            }
        }
        HostOp::Heal { actor } => core.host_mut().heal(actor),
    }
}

/// Body of the dedicated tick thread. Returns the loop so the caller can
/// inspect final state.
pub fn run_tick_thread(
    mut tick_loop: PvpTickLoop,
    mut routed_rx: UnboundedReceiver<Routed>,
    starting_balance: u64,
    shutdown: ShutdownRx,
    out_tx: UnboundedSender<TickOutput>,
) -> PvpTickLoop {
    tracing::info!(tps = tick_loop.config.tps, "tick thread started");
    tick_loop.run_until(
        || shutdown.is_shutdown(),
        |tl| loop {
            match routed_rx.try_recv() {
                Ok(routed) => apply_routed(tl, routed, starting_balance),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        },
        |output| {
            if out_tx.send(output).is_err() {
                tracing::debug!("output writer gone");
            }
        },
    );
    tick_loop
}
