use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::ids::{ActorId, ZoneId};

/// Whether an actor is a real connected player or a host-controlled stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    #[default]
    Player,
    /// NPCs are looked up transiently and never retained by the registry.
    Npc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    pub zone: ZoneId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(zone: impl Into<ZoneId>, x: f64, y: f64, z: f64) -> Self {
        Self {
            zone: zone.into(),
            x,
            y,
            z,
        }
    }

    /// Origin of a zone, for actors whose exact position is unknown.
    pub fn in_zone(zone: ZoneId) -> Self {
        Self {
            zone,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// A live combat tag. Present only while the actor is in the tracker's set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTag {
    pub since: Timestamp,
    pub last_activity: Timestamp,
    /// The actor on the other side of the most recent tagging exchange.
    pub opponent: Option<ActorId>,
}

impl CombatTag {
    pub fn new(now: Timestamp, opponent: Option<ActorId>) -> Self {
        Self {
            since: now,
            last_activity: now,
            opponent,
        }
    }

    /// Idle for strictly longer than `timeout`.
    pub fn is_expired(&self, now: Timestamp, timeout: Duration) -> bool {
        now.since(self.last_activity) > timeout
    }
}

/// Per-actor combat-relevant state.
///
/// Protection windows, the override flag and the logout flag are only changed
/// through the methods below. The combat tag itself is not stored here; the
/// tag tracker is the single owner of that record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub id: ActorId,
    pub name: String,
    pub kind: ActorKind,
    pub online: bool,
    pub location: Location,
    override_active: bool,
    pvp_enabled: bool,
    respawn_protection_until: Option<Timestamp>,
    newbie_protection_until: Option<Timestamp>,
    pvp_logged: bool,
}

impl ActorState {
    pub fn new(id: ActorId, name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ActorKind::Player,
            online: true,
            location,
            override_active: false,
            pvp_enabled: true,
            respawn_protection_until: None,
            newbie_protection_until: None,
            pvp_logged: false,
        }
    }

    pub fn npc(id: ActorId, location: Location) -> Self {
        Self {
            kind: ActorKind::Npc,
            ..Self::new(id, format!("npc-{}", id.0), location)
        }
    }

    pub fn zone(&self) -> &ZoneId {
        &self.location.zone
    }

    pub fn override_active(&self) -> bool {
        self.override_active
    }

    pub fn set_override(&mut self, active: bool) {
        self.override_active = active;
    }

    pub fn pvp_enabled(&self) -> bool {
        self.pvp_enabled
    }

    pub fn set_pvp_enabled(&mut self, enabled: bool) {
        self.pvp_enabled = enabled;
    }

    pub fn has_respawn_protection(&self, now: Timestamp) -> bool {
        self.respawn_protection_until.is_some_and(|until| now < until)
    }

    pub fn is_newbie(&self, now: Timestamp) -> bool {
        self.newbie_protection_until.is_some_and(|until| now < until)
    }

    pub fn respawn_protection_until(&self) -> Option<Timestamp> {
        self.respawn_protection_until
    }

    pub fn newbie_protection_until(&self) -> Option<Timestamp> {
        self.newbie_protection_until
    }

    /// Opens a fresh respawn window. Each call is a new grant; an expired
    /// window never comes back on its own.
    pub fn grant_respawn_protection(&mut self, now: Timestamp, duration: Duration) {
        self.respawn_protection_until = Some(now.saturating_add(duration));
    }

    pub fn grant_newbie_protection(&mut self, now: Timestamp, duration: Duration) {
        self.newbie_protection_until = Some(now.saturating_add(duration));
    }

    /// Player gave up newbie protection early.
    pub fn end_newbie_protection(&mut self) {
        self.newbie_protection_until = None;
    }

    pub fn pvp_logged(&self) -> bool {
        self.pvp_logged
    }

    pub fn set_pvp_logged(&mut self, logged: bool) {
        self.pvp_logged = logged;
    }
}

impl std::fmt::Display for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Actor[{}, {}]", self.name, self.id)
    }
}
