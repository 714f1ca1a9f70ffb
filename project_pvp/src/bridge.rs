//! Line-delimited JSON bridge between the game server and the engine.
//!
//! The server writes one [`HostEvent`] per line on stdin; the engine answers
//! with one [`TickOutput`] per line on stdout.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use combat_model::{ActorId, ItemStack, Location, UntagReason, ZoneId};
use engine_core::{EngineCommand, Participant, TickOutput};

use crate::config::{zone_table, ZoneSection};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Connect {
        actor: ActorId,
        name: String,
        #[serde(default)]
        zone: Option<String>,
        #[serde(default)]
        first_join: bool,
        #[serde(default)]
        balance: Option<u64>,
    },
    Disconnect {
        actor: ActorId,
    },
    Attack {
        attacker: ActorId,
        defender: ActorId,
        #[serde(default)]
        attacker_npc: bool,
        #[serde(default)]
        defender_npc: bool,
    },
    Death {
        victim: ActorId,
        #[serde(default)]
        killer: Option<ActorId>,
    },
    Respawn {
        actor: ActorId,
    },
    ZoneChange {
        actor: ActorId,
        zone: String,
    },
    SetPvp {
        actor: ActorId,
        enabled: bool,
    },
    SetOverride {
        actor: ActorId,
        active: bool,
    },
    EndNewbie {
        actor: ActorId,
    },
    Untag {
        actor: ActorId,
    },
    Give {
        actor: ActorId,
        items: Vec<ItemStack>,
    },
    ReloadZones {
        zones: Vec<ZoneSection>,
    },
}

/// Host-side bookkeeping the engine does not own.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    Join {
        actor: ActorId,
        location: Location,
        balance: Option<u64>,
    },
    Move {
        actor: ActorId,
        location: Location,
    },
    Give {
        actor: ActorId,
        items: Vec<ItemStack>,
    },
    Heal {
        actor: ActorId,
    },
}

/// Where a host event goes once it reaches the tick thread.
#[derive(Debug, Clone)]
pub enum Routed {
    Engine(EngineCommand),
    Host(HostOp),
    /// Needs the host's view of the body before the engine sees it.
    Death {
        victim: ActorId,
        killer: Option<ActorId>,
    },
}

fn participant(id: ActorId, npc: bool) -> Participant {
    if npc {
        Participant::npc(id)
    } else {
        Participant::player(id)
    }
}

impl HostEvent {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Split into host and engine work, host first.
    pub fn route(self, default_zone: &ZoneId) -> Vec<Routed> {
        let locate = |zone: Option<String>| {
            Location::in_zone(zone.map(ZoneId::new).unwrap_or_else(|| default_zone.clone()))
        };
        match self {
            HostEvent::Connect {
                actor,
                name,
                zone,
                first_join,
                balance,
            } => {
                let location = locate(zone);
                vec![
                    Routed::Host(HostOp::Join {
                        actor,
                        location: location.clone(),
                        balance,
                    }),
                    Routed::Engine(EngineCommand::Connect {
                        actor,
                        name,
                        location,
                        first_join,
                    }),
                ]
            }
            HostEvent::Disconnect { actor } => {
                vec![Routed::Engine(EngineCommand::Disconnect { actor })]
            }
            HostEvent::Attack {
                attacker,
                defender,
                attacker_npc,
                defender_npc,
            } => vec![Routed::Engine(EngineCommand::Attack {
                attacker: participant(attacker, attacker_npc),
                defender: participant(defender, defender_npc),
            })],
            HostEvent::Death { victim, killer } => vec![Routed::Death { victim, killer }],
            HostEvent::Respawn { actor } => vec![
                Routed::Host(HostOp::Heal { actor }),
                Routed::Engine(EngineCommand::Respawn { actor }),
            ],
            HostEvent::ZoneChange { actor, zone } => {
                let zone = ZoneId::new(zone);
                vec![
                    Routed::Host(HostOp::Move {
                        actor,
                        location: Location::in_zone(zone.clone()),
                    }),
                    Routed::Engine(EngineCommand::ZoneChange { actor, zone }),
                ]
            }
            HostEvent::SetPvp { actor, enabled } => {
                vec![Routed::Engine(EngineCommand::SetPvp { actor, enabled })]
            }
            HostEvent::SetOverride { actor, active } => {
                vec![Routed::Engine(EngineCommand::SetOverride { actor, active })]
            }
            HostEvent::EndNewbie { actor } => {
                vec![Routed::Engine(EngineCommand::EndNewbie { actor })]
            }
            HostEvent::Untag { actor } => vec![Routed::Engine(EngineCommand::Untag {
                actor,
                reason: UntagReason::Manual,
            })],
            HostEvent::Give { actor, items } => vec![Routed::Host(HostOp::Give { actor, items })],
            HostEvent::ReloadZones { zones } => {
                vec![Routed::Engine(EngineCommand::ReloadZones(zone_table(&zones)))]
            }
        }
    }
}

/// Read host events until EOF. Malformed lines are logged and skipped.
/// Returns the number of events forwarded.
pub async fn read_host_events<R>(reader: R, default_zone: ZoneId, tx: UnboundedSender<Routed>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "host stream read failed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = match HostEvent::parse(line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, line, "unparseable host event");
                continue;
            }
        };
        for routed in event.route(&default_zone) {
            if tx.send(routed).is_err() {
                tracing::debug!("tick thread gone, host reader stopping");
                return forwarded;
            }
        }
        forwarded += 1;
    }
    tracing::info!(forwarded, "host stream closed");
    forwarded
}

/// Write tick outputs as JSON lines until every sender is dropped.
pub async fn write_outputs<W>(mut rx: UnboundedReceiver<TickOutput>, mut writer: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(output) = rx.recv().await {
        let mut line = match serde_json::to_vec(&output) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize output");
                continue;
            }
        };
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
