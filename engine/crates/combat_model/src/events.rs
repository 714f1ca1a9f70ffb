use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::ids::ActorId;
use crate::state::{ActorState, CombatTag};

/// Why a tag ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntagReason {
    Expired,
    Death,
    Disconnect,
    Shutdown,
    Manual,
}

/// Emitted before any disconnect punishment is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCombatLogEvent {
    /// State as it was at the disconnect instant.
    pub actor: ActorState,
    pub tag: CombatTag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    Tagged {
        actor: ActorId,
        opponent: Option<ActorId>,
        since: Timestamp,
    },
    Untagged {
        actor: ActorId,
        reason: UntagReason,
    },
    CombatLog(PlayerCombatLogEvent),
    FineCharged {
        actor: ActorId,
        requested: u64,
        charged: u64,
    },
    ToggleFeeCharged {
        actor: ActorId,
        requested: u64,
        charged: u64,
    },
    KillAbuse {
        killer: ActorId,
        victim: ActorId,
        kills: u32,
    },
    ShutdownComplete {
        drained: usize,
    },
}

/// Synchronous consumer of combat events (presentation, logging plugins).
pub trait CombatListener: Send {
    fn on_event(&mut self, event: &CombatEvent);
}

impl<F> CombatListener for F
where
    F: FnMut(&CombatEvent) + Send,
{
    fn on_event(&mut self, event: &CombatEvent) {
        self(event)
    }
}

/// Delivers each event to every listener at emission time, then queues it
/// for whoever drains the bus at the end of the tick.
#[derive(Default)]
pub struct EventBus {
    queue: Vec<CombatEvent>,
    listeners: Vec<Box<dyn CombatListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn CombatListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: CombatEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
        self.queue.push(event);
    }

    /// Take all queued events in emission order.
    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.queue)
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

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queued", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
