use std::collections::BTreeMap;

use crate::error::RegistryError;
use crate::ids::ActorId;
use crate::state::{ActorKind, ActorState, Location};

/// Owns every tracked actor's state, keyed by stable identity.
///
/// State is only dropped by [`Self::release`]; callers settle the actor's
/// combat tag before releasing it.
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: BTreeMap<ActorId, ActorState>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connecting actor. An offline entry with the same id, left
    /// by an earlier lookup, is rebound and keeps its state.
    pub fn connect(
        &mut self,
        id: ActorId,
        name: impl Into<String>,
        location: Location,
    ) -> Result<&mut ActorState, RegistryError> {
        if self.actors.get(&id).is_some_and(|a| a.online) {
            return Err(RegistryError::AlreadyOnline(id));
        }
        let name = name.into();
        let rebound = self.actors.contains_key(&id);
        let actor = self
            .actors
            .entry(id)
            .or_insert_with(|| ActorState::new(id, name.clone(), location.clone()));
        actor.online = true;
        actor.name = name;
        actor.location = location;
        tracing::debug!(actor = %id, rebound, "actor connected");
        Ok(actor)
    }

    /// Fetch an actor, creating its state on first sight. Only players are
    /// kept, and a player first seen here stays offline until it connects.
    /// An NPC gets a fresh transient state every time.
    pub fn lookup(&mut self, id: ActorId, kind: ActorKind, fallback: &Location) -> ActorState {
        if let Some(actor) = self.actors.get(&id) {
            return actor.clone();
        }
        match kind {
            ActorKind::Npc => ActorState::npc(id, fallback.clone()),
            ActorKind::Player => {
                let mut actor = ActorState::new(id, format!("actor-{}", id.0), fallback.clone());
                actor.online = false;
                tracing::debug!(actor = %id, "adding offline actor on first lookup");
                self.actors.insert(id, actor.clone());
                actor
            }
        }
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorState> {
        self.actors.get_mut(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn is_online(&self, id: ActorId) -> bool {
        self.actors.get(&id).is_some_and(|a| a.online)
    }

    /// Flip the online flag off. The state stays until [`Self::release`].
    pub fn set_offline(&mut self, id: ActorId) -> Result<&mut ActorState, RegistryError> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(RegistryError::UnknownActor(id))?;
        actor.online = false;
        Ok(actor)
    }

    /// Drop an actor's state.
    pub fn release(&mut self, id: ActorId) -> Option<ActorState> {
        let removed = self.actors.remove(&id);
        if removed.is_some() {
            tracing::debug!(actor = %id, "actor released");
        }
        removed
    }

    /// Online actors, sorted by id.
    pub fn online(&self) -> impl Iterator<Item = &ActorState> {
        self.actors.values().filter(|a| a.online)
    }

    /// Online actors that currently have pvp switched off.
    pub fn pvp_disabled_online(&self) -> Vec<ActorId> {
        self.online()
            .filter(|a| !a.pvp_enabled())
            .map(|a| a.id)
            .collect()
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    /// Remove everything (shutdown).
    pub fn drain_all(&mut self) -> Vec<ActorState> {
        std::mem::take(&mut self.actors).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn() -> Location {
        Location::new("world", 0.0, 64.0, 0.0)
    }

    #[test]
    fn connect_and_lookup() {
        let mut reg = ActorRegistry::new();
        reg.connect(ActorId(1), "Alex", spawn()).unwrap();
        let a = reg.lookup(ActorId(1), ActorKind::Player, &spawn());
        assert_eq!(a.name, "Alex");
        assert!(a.online);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn double_connect_is_rejected() {
        let mut reg = ActorRegistry::new();
        reg.connect(ActorId(1), "Alex", spawn()).unwrap();
        assert_eq!(
            reg.connect(ActorId(1), "Alex", spawn()).unwrap_err(),
            RegistryError::AlreadyOnline(ActorId(1))
        );
    }

    #[test]
    fn lookup_creates_players_but_not_npcs() {
        let mut reg = ActorRegistry::new();
        let npc = reg.lookup(ActorId(50), ActorKind::Npc, &spawn());
        assert_eq!(npc.kind, ActorKind::Npc);
        assert!(!reg.contains(ActorId(50)));

        reg.lookup(ActorId(7), ActorKind::Player, &spawn());
        assert!(reg.contains(ActorId(7)));
    }

    #[test]
    fn release_removes() {
        let mut reg = ActorRegistry::new();
        reg.connect(ActorId(1), "Alex", spawn()).unwrap();
        reg.set_offline(ActorId(1)).unwrap();
        let released = reg.release(ActorId(1));
        assert!(released.is_some_and(|a| !a.online));
        assert!(reg.is_empty());
        assert!(reg.release(ActorId(1)).is_none());
    }

    #[test]
    fn looked_up_player_is_offline_until_connect() {
        let mut reg = ActorRegistry::new();
        let seen = reg.lookup(ActorId(2), ActorKind::Player, &spawn());
        assert!(!seen.online);
        assert!(!reg.is_online(ActorId(2)));

        let actor = reg.connect(ActorId(2), "Sam", spawn()).unwrap();
        assert!(actor.online);
        assert_eq!(actor.name, "Sam");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn lookup_after_release_does_not_bring_actor_online() {
        let mut reg = ActorRegistry::new();
        reg.connect(ActorId(1), "Alex", spawn()).unwrap();
        reg.set_offline(ActorId(1)).unwrap();
        reg.release(ActorId(1));

        reg.lookup(ActorId(1), ActorKind::Player, &spawn());
        assert!(!reg.is_online(ActorId(1)));
        assert!(reg.connect(ActorId(1), "Alex", spawn()).is_ok());
    }

    #[test]
    fn reconnect_keeps_offline_state() {
        let mut reg = ActorRegistry::new();
        reg.connect(ActorId(1), "Alex", spawn()).unwrap().set_pvp_enabled(false);
        reg.set_offline(ActorId(1)).unwrap();

        let actor = reg.connect(ActorId(1), "Alex", spawn()).unwrap();
        assert!(actor.online);
        assert!(!actor.pvp_enabled());
    }

    #[test]
    fn pvp_disabled_online_filter() {
        let mut reg = ActorRegistry::new();
        reg.connect(ActorId(1), "A", spawn()).unwrap().set_pvp_enabled(false);
        reg.connect(ActorId(2), "B", spawn()).unwrap();
        reg.connect(ActorId(3), "C", spawn()).unwrap().set_pvp_enabled(false);
        reg.set_offline(ActorId(3)).unwrap();

        assert_eq!(reg.pvp_disabled_online(), vec![ActorId(1)]);
    }

    #[test]
    fn set_offline_unknown() {
        let mut reg = ActorRegistry::new();
        assert_eq!(
            reg.set_offline(ActorId(4)).unwrap_err(),
            RegistryError::UnknownActor(ActorId(4))
        );
    }
}
