use combat_model::{ActorState, CombatEvent, CombatTag, EventBus, PlayerCombatLogEvent};

use crate::config::PunishmentConfig;
use crate::death::{DeathEvent, DropDecision, DropMode};
use crate::host::ActorHost;
use crate::ledger::{charge_capped, Charge, CurrencyLedger};

/// What a disconnect punishment actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisconnectOutcome {
    pub killed: bool,
    pub fine: Option<Charge>,
}

/// Applies disconnect and death consequences for actors in combat.
#[derive(Debug, Clone, Default)]
pub struct PunishmentPolicy {
    config: PunishmentConfig,
}

impl PunishmentPolicy {
    pub fn new(config: PunishmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PunishmentConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PunishmentConfig) {
        self.config = config;
    }

    /// Punish an actor that left while tagged.
    ///
    /// Order is fixed: the combat-log event goes out first, then the forced
    /// death, then the fine. The `pvp_logged` flag is raised only for the
    /// duration of the forced death.
    pub fn apply_disconnect_punishment(
        &self,
        actor: &mut ActorState,
        tag: CombatTag,
        host: &mut dyn ActorHost,
        ledger: &mut dyn CurrencyLedger,
        events: &mut EventBus,
    ) -> DisconnectOutcome {
        tracing::info!(actor = %actor.id, opponent = ?tag.opponent, "combat logout");
        events.emit(CombatEvent::CombatLog(PlayerCombatLogEvent {
            actor: actor.clone(),
            tag,
        }));

        let mut outcome = DisconnectOutcome::default();
        if self.config.kill_on_logout {
            actor.set_pvp_logged(true);
            if let Some(mut death) = host.kill(actor, tag.opponent) {
                self.apply_death_drop_policy(&mut death, actor, Some(&tag), host);
                host.complete_death(death);
                outcome.killed = true;
            } else {
                tracing::warn!(actor = %actor.id, "host refused forced death");
            }
            actor.set_pvp_logged(false);
        }

        if self.config.fine_amount != 0 {
            let charge = charge_capped(ledger, actor.id, self.config.fine_amount);
            events.emit(CombatEvent::FineCharged {
                actor: actor.id,
                requested: charge.requested,
                charged: charge.charged,
            });
            outcome.fine = Some(charge);
        }
        outcome
    }

    /// Decide what the victim keeps. `tag` is the victim's tag at the moment
    /// of death, if it had one.
    pub fn apply_death_drop_policy(
        &self,
        death: &mut DeathEvent,
        victim: &ActorState,
        tag: Option<&CombatTag>,
        host: &mut dyn ActorHost,
    ) -> DropDecision {
        if victim.pvp_logged() {
            self.apply_drop_mode(death, host);
            return DropDecision::CombatLog(self.config.drop_mode);
        }
        let Some(tag) = tag else {
            return DropDecision::Untouched;
        };
        let pvp_kill = death.killer.is_some() && tag.opponent == death.killer;
        self.apply_switches(death, pvp_kill);
        DropDecision::Switches { pvp_kill }
    }

    fn apply_switches(&self, death: &mut DeathEvent, pvp_kill: bool) {
        if !(pvp_kill && self.config.drop_exp) {
            death.keep_experience();
        }
        if !self.config.drop_inventory {
            let kept = std::mem::take(&mut death.main_drops);
            death.restored.extend(kept);
        }
        if !self.config.drop_armor {
            let kept = std::mem::take(&mut death.armor_drops);
            death.restored.extend(kept);
        }
    }

    fn apply_drop_mode(&self, death: &mut DeathEvent, host: &mut dyn ActorHost) {
        match self.config.drop_mode {
            DropMode::Drop => {
                if death.killer.is_none() {
                    death.keep_inventory();
                    death.keep_experience();
                }
            }
            DropMode::Keep => {
                if death.killer.is_some() {
                    death.keep_inventory();
                    death.keep_experience();
                }
            }
            DropMode::Transfer => {
                if let Some(killer) = death.killer {
                    let drops = death.take_drops();
                    let overflow = host.give_items(killer, drops);
                    if !overflow.is_empty() {
                        tracing::debug!(
                            victim = %death.victim,
                            killer = %killer,
                            overflow = overflow.len(),
                            "killer inventory full, dropping the rest"
                        );
                    }
                    death.world_drops.extend(overflow);
                }
            }
            DropMode::Clear => {
                death.clear_drops();
                death.dropped_exp = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use combat_model::{ActorId, Inventory, ItemStack, Location, Timestamp};

    use crate::ledger::InMemoryLedger;

    const VICTIM: ActorId = ActorId(1);
    const KILLER: ActorId = ActorId(2);

    #[derive(Default)]
    struct StubHost {
        log: Arc<Mutex<Vec<String>>>,
        health: BTreeMap<ActorId, u32>,
        inventories: BTreeMap<ActorId, Inventory>,
        flag_during_kill: Option<bool>,
        completed: Vec<DeathEvent>,
    }

    impl ActorHost for StubHost {
        fn kill(&mut self, actor: &ActorState, last_attacker: Option<ActorId>) -> Option<DeathEvent> {
            self.log.lock().unwrap().push("kill".into());
            self.flag_during_kill = Some(actor.pvp_logged());
            self.health.insert(actor.id, 0);
            let mut death = DeathEvent::new(actor.id, last_attacker, actor.location.clone());
            death.main_drops = vec![ItemStack::new("bread", 10)];
            death.armor_drops = vec![ItemStack::new("helmet", 1)];
            death.dropped_exp = 30;
            Some(death)
        }

        fn complete_death(&mut self, death: DeathEvent) {
            self.completed.push(death);
        }

        fn give_items(&mut self, actor: ActorId, items: Vec<ItemStack>) -> Vec<ItemStack> {
            self.inventories
                .entry(actor)
                .or_insert_with(|| Inventory::new(36))
                .add_items(items)
        }
    }

    fn victim() -> ActorState {
        ActorState::new(VICTIM, "victim", Location::new("arena", 4.0, 64.0, -2.0))
    }

    fn tag_by(opponent: Option<ActorId>) -> CombatTag {
        CombatTag::new(Timestamp(0), opponent)
    }

    fn death(killer: Option<ActorId>) -> DeathEvent {
        let mut d = DeathEvent::new(VICTIM, killer, Location::in_zone("arena".into()));
        d.main_drops = vec![ItemStack::new("bread", 10), ItemStack::new("sword", 1)];
        d.armor_drops = vec![ItemStack::new("helmet", 1)];
        d.dropped_exp = 30;
        d
    }

    fn policy(config: PunishmentConfig) -> PunishmentPolicy {
        PunishmentPolicy::new(config)
    }

    fn drop_mode(mode: DropMode) -> PunishmentPolicy {
        policy(PunishmentConfig {
            drop_mode: mode,
            ..PunishmentConfig::default()
        })
    }

    fn logged_victim() -> ActorState {
        let mut v = victim();
        v.set_pvp_logged(true);
        v
    }

    #[test]
    fn combat_log_event_precedes_forced_death() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = StubHost {
            log: log.clone(),
            ..StubHost::default()
        };
        let mut events = EventBus::new();
        let listener_log = log.clone();
        events.subscribe(Box::new(move |e: &CombatEvent| {
            if let CombatEvent::CombatLog(_) = e {
                listener_log.lock().unwrap().push("combat_log".into());
            }
        }));

        let mut actor = victim();
        policy(PunishmentConfig::default()).apply_disconnect_punishment(
            &mut actor,
            tag_by(Some(KILLER)),
            &mut host,
            &mut InMemoryLedger::new(),
            &mut events,
        );

        assert_eq!(*log.lock().unwrap(), vec!["combat_log", "kill"]);
    }

    #[test]
    fn kill_on_logout_zeroes_health_and_resets_flag() {
        let mut host = StubHost::default();
        host.health.insert(VICTIM, 20);
        let mut actor = victim();

        let outcome = policy(PunishmentConfig::default()).apply_disconnect_punishment(
            &mut actor,
            tag_by(Some(KILLER)),
            &mut host,
            &mut InMemoryLedger::new(),
            &mut EventBus::new(),
        );

        assert!(outcome.killed);
        assert_eq!(host.health[&VICTIM], 0);
        assert_eq!(host.flag_during_kill, Some(true));
        assert!(!actor.pvp_logged());
        assert_eq!(host.completed.len(), 1);
        assert_eq!(host.completed[0].killer, Some(KILLER));
    }

    #[test]
    fn no_kill_when_disabled() {
        let mut host = StubHost::default();
        let mut events = EventBus::new();
        let mut actor = victim();
        let outcome = policy(PunishmentConfig {
            kill_on_logout: false,
            ..PunishmentConfig::default()
        })
        .apply_disconnect_punishment(
            &mut actor,
            tag_by(None),
            &mut host,
            &mut InMemoryLedger::new(),
            &mut events,
        );

        assert!(!outcome.killed);
        assert!(host.completed.is_empty());
        let drained = events.drain();
        assert_eq!(drained.len(), 1);
        assert!(matches!(drained[0], CombatEvent::CombatLog(_)));
    }

    #[test]
    fn fine_is_capped_and_reported() {
        let mut ledger = InMemoryLedger::new();
        ledger.open(VICTIM, 40);
        let mut events = EventBus::new();
        let mut actor = victim();

        let outcome = policy(PunishmentConfig {
            fine_amount: 100,
            ..PunishmentConfig::default()
        })
        .apply_disconnect_punishment(
            &mut actor,
            tag_by(None),
            &mut StubHost::default(),
            &mut ledger,
            &mut events,
        );

        assert_eq!(outcome.fine.map(|c| c.charged), Some(40));
        assert_eq!(ledger.get(VICTIM), Some(0));
        let last = events.drain().pop().unwrap();
        assert_eq!(
            last,
            CombatEvent::FineCharged {
                actor: VICTIM,
                requested: 100,
                charged: 40
            }
        );
    }

    #[test]
    fn drop_mode_drop_without_killer_keeps_everything() {
        let mut d = death(None);
        let decision = drop_mode(DropMode::Drop).apply_death_drop_policy(
            &mut d,
            &logged_victim(),
            None,
            &mut StubHost::default(),
        );
        assert_eq!(decision, DropDecision::CombatLog(DropMode::Drop));
        assert!(d.keep_inventory && d.keep_level);
        assert!(!d.has_drops());
        assert_eq!(d.dropped_exp, 0);
    }

    #[test]
    fn drop_mode_drop_with_killer_drops() {
        let mut d = death(Some(KILLER));
        drop_mode(DropMode::Drop).apply_death_drop_policy(
            &mut d,
            &logged_victim(),
            None,
            &mut StubHost::default(),
        );
        assert!(!d.keep_inventory);
        assert_eq!(d.drops().count(), 3);
        assert_eq!(d.dropped_exp, 30);
    }

    #[test]
    fn drop_mode_keep_only_with_killer() {
        let policy = drop_mode(DropMode::Keep);

        let mut with_killer = death(Some(KILLER));
        policy.apply_death_drop_policy(&mut with_killer, &logged_victim(), None, &mut StubHost::default());
        assert!(with_killer.keep_inventory && with_killer.keep_level);
        assert!(!with_killer.has_drops());

        let mut without = death(None);
        policy.apply_death_drop_policy(&mut without, &logged_victim(), None, &mut StubHost::default());
        assert!(!without.keep_inventory);
        assert_eq!(without.drops().count(), 3);
    }

    #[test]
    fn drop_mode_transfer_overflows_to_world() {
        let mut host = StubHost::default();
        // Killer has room for exactly one new stack.
        host.inventories.insert(KILLER, Inventory::new(1));

        let mut d = death(Some(KILLER));
        drop_mode(DropMode::Transfer).apply_death_drop_policy(
            &mut d,
            &logged_victim(),
            None,
            &mut host,
        );

        assert!(!d.has_drops());
        assert_eq!(host.inventories[&KILLER].count("bread"), 10);
        assert_eq!(
            d.world_drops,
            vec![ItemStack::new("sword", 1), ItemStack::new("helmet", 1)]
        );
        assert_eq!(d.location, Location::in_zone("arena".into()));
    }

    #[test]
    fn drop_mode_transfer_without_killer_is_noop() {
        let mut d = death(None);
        drop_mode(DropMode::Transfer).apply_death_drop_policy(
            &mut d,
            &logged_victim(),
            None,
            &mut StubHost::default(),
        );
        assert_eq!(d.drops().count(), 3);
        assert!(d.world_drops.is_empty());
    }

    #[test]
    fn drop_mode_clear_ignores_killer() {
        for killer in [None, Some(KILLER)] {
            let mut d = death(killer);
            drop_mode(DropMode::Clear).apply_death_drop_policy(
                &mut d,
                &logged_victim(),
                None,
                &mut StubHost::default(),
            );
            assert!(!d.has_drops());
            assert_eq!(d.dropped_exp, 0);
            assert!(!d.keep_inventory);
        }
    }

    #[test]
    fn pvp_kill_drops_experience() {
        let mut d = death(Some(KILLER));
        let tag = tag_by(Some(KILLER));
        let decision = policy(PunishmentConfig::default()).apply_death_drop_policy(
            &mut d,
            &victim(),
            Some(&tag),
            &mut StubHost::default(),
        );
        assert_eq!(decision, DropDecision::Switches { pvp_kill: true });
        assert_eq!(d.dropped_exp, 30);
        assert!(!d.keep_level);
    }

    #[test]
    fn tagged_by_someone_else_keeps_experience() {
        let mut d = death(Some(KILLER));
        let tag = tag_by(Some(ActorId(7)));
        let decision = policy(PunishmentConfig::default()).apply_death_drop_policy(
            &mut d,
            &victim(),
            Some(&tag),
            &mut StubHost::default(),
        );
        assert_eq!(decision, DropDecision::Switches { pvp_kill: false });
        assert_eq!(d.dropped_exp, 0);
        assert!(d.keep_level);
    }

    #[test]
    fn exp_kept_when_drop_exp_disabled() {
        let mut d = death(Some(KILLER));
        let tag = tag_by(Some(KILLER));
        policy(PunishmentConfig {
            drop_exp: false,
            ..PunishmentConfig::default()
        })
        .apply_death_drop_policy(&mut d, &victim(), Some(&tag), &mut StubHost::default());
        assert!(d.keep_level);
    }

    #[test]
    fn slot_switches_are_independent() {
        let tag = tag_by(Some(KILLER));

        let mut keep_main = death(Some(KILLER));
        policy(PunishmentConfig {
            drop_inventory: false,
            ..PunishmentConfig::default()
        })
        .apply_death_drop_policy(&mut keep_main, &victim(), Some(&tag), &mut StubHost::default());
        assert!(keep_main.main_drops.is_empty());
        assert_eq!(keep_main.armor_drops, vec![ItemStack::new("helmet", 1)]);
        assert_eq!(keep_main.restored.len(), 2);

        let mut keep_armor = death(Some(KILLER));
        policy(PunishmentConfig {
            drop_armor: false,
            ..PunishmentConfig::default()
        })
        .apply_death_drop_policy(&mut keep_armor, &victim(), Some(&tag), &mut StubHost::default());
        assert_eq!(keep_armor.main_drops.len(), 2);
        assert!(keep_armor.armor_drops.is_empty());
        assert_eq!(keep_armor.restored, vec![ItemStack::new("helmet", 1)]);
    }

    #[test]
    fn untagged_death_is_untouched() {
        let mut d = death(Some(KILLER));
        let before = d.clone();
        let decision = policy(PunishmentConfig::default()).apply_death_drop_policy(
            &mut d,
            &victim(),
            None,
            &mut StubHost::default(),
        );
        assert_eq!(decision, DropDecision::Untouched);
        assert_eq!(d, before);
    }
}
