use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use combat_model::{ActorId, CombatTag, Timestamp};

/// What a `tag` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTransition {
    /// The actor was not in combat before.
    Started,
    /// The actor was already tagged; only its activity time moved.
    Refreshed,
}

/// A tag removed by the expiry scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiredTag {
    pub actor: ActorId,
    pub tag: CombatTag,
}

#[derive(Debug)]
struct TagSet {
    tags: BTreeMap<ActorId, CombatTag>,
    timeout: Duration,
}

/// The set of actors currently in combat.
///
/// This is the only place a combat tag lives. Cloning the tracker shares the
/// set; every operation, including the expiry decision, runs under the same
/// lock, so transitions for one actor are totally ordered.
#[derive(Debug, Clone)]
pub struct CombatTagTracker {
    inner: Arc<Mutex<TagSet>>,
}

impl CombatTagTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TagSet {
                tags: BTreeMap::new(),
                timeout,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TagSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn timeout(&self) -> Duration {
        self.lock().timeout
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.lock().timeout = timeout;
    }

    /// Tag `actor`, or refresh its activity time if already tagged.
    pub fn tag(&self, actor: ActorId, opponent: Option<ActorId>, now: Timestamp) -> TagTransition {
        let mut set = self.lock();
        upsert(&mut set.tags, actor, opponent, now)
    }

    /// Tag both sides of an exchange under one lock.
    pub fn tag_pair(
        &self,
        attacker: ActorId,
        defender: ActorId,
        now: Timestamp,
    ) -> (TagTransition, TagTransition) {
        let mut set = self.lock();
        let a = upsert(&mut set.tags, attacker, Some(defender), now);
        let d = upsert(&mut set.tags, defender, Some(attacker), now);
        (a, d)
    }

    /// Remove the actor's tag, handing back what it was. No-op if absent.
    pub fn untag(&self, actor: ActorId) -> Option<CombatTag> {
        self.lock().tags.remove(&actor)
    }

    pub fn is_tagged(&self, actor: ActorId) -> bool {
        self.lock().tags.contains_key(&actor)
    }

    pub fn get(&self, actor: ActorId) -> Option<CombatTag> {
        self.lock().tags.get(&actor).copied()
    }

    /// Currently tagged actors.
    pub fn snapshot(&self) -> BTreeSet<ActorId> {
        self.lock().tags.keys().copied().collect()
    }

    /// Untag every actor idle for longer than the timeout.
    pub fn expire(&self, now: Timestamp) -> Vec<ExpiredTag> {
        let mut set = self.lock();
        let timeout = set.timeout;
        let mut expired = Vec::new();
        set.tags.retain(|&actor, tag| {
            if tag.is_expired(now, timeout) {
                expired.push(ExpiredTag { actor, tag: *tag });
                false
            } else {
                true
            }
        });
        expired
    }

    /// Remove every tag at once.
    pub fn drain(&self) -> Vec<(ActorId, CombatTag)> {
        std::mem::take(&mut self.lock().tags).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tags.is_empty()
    }
}

fn upsert(
    tags: &mut BTreeMap<ActorId, CombatTag>,
    actor: ActorId,
    opponent: Option<ActorId>,
    now: Timestamp,
) -> TagTransition {
    match tags.get_mut(&actor) {
        Some(tag) => {
            tag.last_activity = tag.last_activity.max(now);
            if opponent.is_some() {
                tag.opponent = opponent;
            }
            TagTransition::Refreshed
        }
        None => {
            tags.insert(actor, CombatTag::new(now, opponent));
            TagTransition::Started
        }
    }
}
