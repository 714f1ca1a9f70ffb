use std::sync::Arc;

use combat_model::ActorState;
use thiserror::Error;

use crate::result::ProtectionKind;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle {oracle} unavailable: {reason}")]
    Unavailable { oracle: String, reason: String },
}

/// A third-party "should this be blocked or allowed" collaborator, such as a
/// region-protection or AFK-detection plugin. Every question defaults to
/// "no" so an oracle only answers what it knows about.
pub trait ProtectionOracle: Send + Sync {
    fn name(&self) -> &str;

    /// May this pair interact here (used for border hopping)?
    fn can_attack(&self, _attacker: &ActorState, _defender: &ActorState) -> Result<bool, OracleError> {
        Ok(false)
    }

    /// Should the protection named by `reason` be lifted for this attack?
    fn should_disable_protection(
        &self,
        _attacker: &ActorState,
        _defender: &ActorState,
        _reason: ProtectionKind,
    ) -> Result<bool, OracleError> {
        Ok(false)
    }

    /// Is this actor AFK and therefore protected?
    fn is_afk(&self, _actor: &ActorState) -> Result<bool, OracleError> {
        Ok(false)
    }
}

struct RegisteredOracle {
    priority: u32,
    oracle: Arc<dyn ProtectionOracle>,
}

/// Registered oracles, consulted in priority order (lower = earlier).
///
/// Answers are OR-ed: the first oracle answering `true` settles the question
/// and later oracles are not asked. An oracle that fails counts as `false`.
#[derive(Default)]
pub struct OracleSet {
    oracles: Vec<RegisteredOracle>,
}

impl OracleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, oracle: Arc<dyn ProtectionOracle>, priority: u32) {
        tracing::info!(oracle = oracle.name(), priority, "protection oracle registered");
        let at = self.oracles.partition_point(|o| o.priority <= priority);
        self.oracles.insert(at, RegisteredOracle { priority, oracle });
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.oracles.iter().map(|o| o.oracle.name()).collect()
    }

    pub fn can_attack(&self, attacker: &ActorState, defender: &ActorState) -> bool {
        self.any("can_attack", |o| o.can_attack(attacker, defender))
    }

    pub fn should_disable_protection(
        &self,
        attacker: &ActorState,
        defender: &ActorState,
        reason: ProtectionKind,
    ) -> bool {
        self.any("should_disable_protection", |o| {
            o.should_disable_protection(attacker, defender, reason)
        })
    }

    pub fn is_afk(&self, actor: &ActorState) -> bool {
        self.any("is_afk", |o| o.is_afk(actor))
    }

    fn any<F>(&self, question: &str, mut ask: F) -> bool
    where
        F: FnMut(&dyn ProtectionOracle) -> Result<bool, OracleError>,
    {
        for entry in &self.oracles {
            match ask(entry.oracle.as_ref()) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        oracle = entry.oracle.name(),
                        question,
                        error = %e,
                        "oracle failed, treating answer as false"
                    );
                }
            }
        }
        false
    }
}

impl std::fmt::Debug for OracleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_model::{ActorId, Location};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        afk: Result<bool, ()>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, afk: Result<bool, ()>) -> Arc<Self> {
            Arc::new(Self {
                name,
                afk,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ProtectionOracle for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn is_afk(&self, _actor: &ActorState) -> Result<bool, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.afk.map_err(|()| OracleError::Unavailable {
                oracle: self.name.to_string(),
                reason: "timeout".into(),
            })
        }
    }

    fn actor() -> ActorState {
        ActorState::new(ActorId(1), "Alex", Location::in_zone("world".into()))
    }

    #[test]
    fn empty_set_answers_false() {
        let set = OracleSet::new();
        assert!(!set.is_afk(&actor()));
        assert!(!set.can_attack(&actor(), &actor()));
    }

    #[test]
    fn registration_sorted_by_priority() {
        let mut set = OracleSet::new();
        set.register(Fixed::new("late", Ok(false)), 10);
        set.register(Fixed::new("early", Ok(false)), 1);
        set.register(Fixed::new("middle", Ok(false)), 5);
        assert_eq!(set.names(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn any_true_wins_and_short_circuits() {
        let first = Fixed::new("first", Ok(true));
        let second = Fixed::new("second", Ok(false));
        let mut set = OracleSet::new();
        set.register(first.clone(), 1);
        set.register(second.clone(), 2);

        assert!(set.is_afk(&actor()));
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_oracle_counts_as_false() {
        let broken = Fixed::new("broken", Err(()));
        let mut set = OracleSet::new();
        set.register(broken.clone(), 1);
        assert!(!set.is_afk(&actor()));

        // A later healthy oracle still gets asked.
        set.register(Fixed::new("healthy", Ok(true)), 2);
        assert!(set.is_afk(&actor()));
        assert_eq!(broken.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn default_methods_answer_false() {
        let mut set = OracleSet::new();
        set.register(Fixed::new("afk-only", Ok(true)), 1);
        assert!(!set.should_disable_protection(&actor(), &actor(), ProtectionKind::Newbie));
        assert!(!set.can_attack(&actor(), &actor()));
    }
}
