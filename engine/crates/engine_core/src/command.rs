use std::collections::VecDeque;
use std::sync::Arc;

use combat_model::{ActorId, ActorKind, Location, UntagReason, ZoneId, ZoneTable};
use combat_tag::ExpiredTag;
use maintenance::MaintenanceTask;
use punishment::DeathEvent;

use crate::settings::CombatSettings;

/// One side of an attack as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub id: ActorId,
    pub kind: ActorKind,
}

impl Participant {
    pub fn player(id: ActorId) -> Self {
        Self {
            id,
            kind: ActorKind::Player,
        }
    }

    pub fn npc(id: ActorId) -> Self {
        Self {
            id,
            kind: ActorKind::Npc,
        }
    }
}

/// Work for the tick thread. Host events and background job handoffs share
/// this one queue.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Connect {
        actor: ActorId,
        name: String,
        location: Location,
        first_join: bool,
    },
    Disconnect {
        actor: ActorId,
    },
    Attack {
        attacker: Participant,
        defender: Participant,
    },
    Death(DeathEvent),
    Respawn {
        actor: ActorId,
    },
    ZoneChange {
        actor: ActorId,
        zone: ZoneId,
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
        reason: UntagReason,
    },
    ReloadZones(ZoneTable),
    ReloadSettings(Arc<CombatSettings>),
    TagsExpired(Vec<ExpiredTag>),
    Maintenance(MaintenanceTask),
}

impl From<MaintenanceTask> for EngineCommand {
    fn from(task: MaintenanceTask) -> Self {
        Self::Maintenance(task)
    }
}

/// Commands collected for the current tick, applied in arrival order.
#[derive(Debug, Default)]
pub struct CommandStream {
    queue: VecDeque<EngineCommand>,
}

impl CommandStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: EngineCommand) {
        self.queue.push_back(cmd);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = EngineCommand> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut stream = CommandStream::new();
        stream.push(EngineCommand::Respawn { actor: ActorId(1) });
        stream.push(EngineCommand::Disconnect { actor: ActorId(2) });
        stream.push(MaintenanceTask::ChargeToggleFees.into());
        assert_eq!(stream.len(), 3);

        let drained: Vec<_> = stream.drain().collect();
        assert!(matches!(drained[0], EngineCommand::Respawn { actor: ActorId(1) }));
        assert!(matches!(drained[1], EngineCommand::Disconnect { actor: ActorId(2) }));
        assert!(matches!(
            drained[2],
            EngineCommand::Maintenance(MaintenanceTask::ChargeToggleFees)
        ));
        assert!(stream.is_empty());
    }
}
