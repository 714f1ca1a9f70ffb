use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use combat_model::{
    ActorId, ActorKind, ActorRegistry, ActorState, Clock, CombatEvent, CombatListener, EventBus,
    Location, RegistryError, UntagReason, ZoneId, ZoneRegistry, ZoneTable,
};
use combat_tag::{CombatTagTracker, ExpiredTag, TagTransition};
use maintenance::{FeeRun, KillAbuseTracker, KillVerdict, MaintenanceTask};
use protection::{Combatant, OracleSet, ProtectionEngine, ProtectionResult};
use punishment::{ActorHost, CurrencyLedger, DeathEvent, DisconnectOutcome, DropDecision, PunishmentPolicy};

use crate::command::{EngineCommand, Participant};
use crate::settings::CombatSettings;

/// Reply to an attack request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackDecision {
    pub attacker: ActorId,
    pub defender: ActorId,
    pub result: ProtectionResult,
}

/// Owns all combat state for the synchronous context.
///
/// Every mutation of actor state, host entities or currency goes through
/// here. Background jobs only reach it through [`EngineCommand`]s.
pub struct CombatCore<H, L> {
    registry: ActorRegistry,
    tracker: CombatTagTracker,
    zones: Arc<ZoneRegistry>,
    protection: ProtectionEngine,
    punishment: PunishmentPolicy,
    kill_abuse: KillAbuseTracker,
    settings: Arc<CombatSettings>,
    fallback: Location,
    events: EventBus,
    /// Actors whose latest published transition is `Tagged`.
    announced: BTreeSet<ActorId>,
    clock: Arc<dyn Clock>,
    host: H,
    ledger: L,
}

impl<H: ActorHost, L: CurrencyLedger> CombatCore<H, L> {
    pub fn new(
        settings: Arc<CombatSettings>,
        zones: ZoneTable,
        clock: Arc<dyn Clock>,
        host: H,
        ledger: L,
    ) -> Self {
        Self {
            registry: ActorRegistry::new(),
            tracker: CombatTagTracker::new(settings.scan.timeout()),
            zones: Arc::new(ZoneRegistry::new(zones)),
            protection: ProtectionEngine::new(settings.protection.clone()),
            punishment: PunishmentPolicy::new(settings.punishment.clone()),
            kill_abuse: KillAbuseTracker::new(settings.kill_abuse.clone()),
            fallback: settings.lifecycle.fallback_location(),
            settings,
            events: EventBus::new(),
            announced: BTreeSet::new(),
            clock,
            host,
            ledger,
        }
    }

    pub fn with_oracles(mut self, oracles: OracleSet) -> Self {
        self.protection = ProtectionEngine::with_oracles(self.settings.protection.clone(), oracles);
        self
    }

    pub fn subscribe(&mut self, listener: Box<dyn CombatListener>) {
        self.events.subscribe(listener);
    }

    /// Shared handle to the tag set, for the expiry scan and presentation.
    pub fn tracker(&self) -> &CombatTagTracker {
        &self.tracker
    }

    pub fn zones(&self) -> Arc<ZoneRegistry> {
        Arc::clone(&self.zones)
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorState> {
        self.registry.get(id)
    }

    pub fn settings(&self) -> &Arc<CombatSettings> {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn kill_abuse(&self) -> &KillAbuseTracker {
        &self.kill_abuse
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    pub fn is_tagged(&self, id: ActorId) -> bool {
        self.tracker.is_tagged(id)
    }

    pub fn snapshot(&self) -> BTreeSet<ActorId> {
        self.tracker.snapshot()
    }

    pub fn connect(
        &mut self,
        id: ActorId,
        name: impl Into<String>,
        location: Location,
        first_join: bool,
    ) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let lifecycle = &self.settings.lifecycle;
        let actor = self.registry.connect(id, name, location)?;
        if first_join {
            actor.set_pvp_enabled(lifecycle.default_pvp);
            if let Some(window) = lifecycle.newbie_protection() {
                actor.grant_newbie_protection(now, window);
            }
        }
        Ok(())
    }

    /// Decide an attack without touching any state beyond first-sight
    /// registration of the two actors.
    pub fn evaluate(&mut self, attacker: Participant, defender: Participant) -> ProtectionResult {
        let now = self.clock.now();
        let a = self.registry.lookup(attacker.id, attacker.kind, &self.fallback);
        let d = self.registry.lookup(defender.id, defender.kind, &self.fallback);
        let zones = self.zones.snapshot();
        self.protection.evaluate(
            Combatant::new(&a, self.tracker.is_tagged(a.id)),
            Combatant::new(&d, self.tracker.is_tagged(d.id)),
            &zones,
            now,
        )
    }

    pub fn can_attack(&mut self, attacker: Participant, defender: Participant) -> bool {
        self.evaluate(attacker, defender).can_attack()
    }

    /// Attack entry point: evaluate, and tag both players if the hit lands.
    pub fn attack(&mut self, attacker: Participant, defender: Participant) -> ProtectionResult {
        if attacker.id == defender.id {
            return ProtectionResult::allowed();
        }
        let result = self.evaluate(attacker, defender);
        if result.can_attack() && self.is_online_player(attacker) && self.is_online_player(defender) {
            let now = self.clock.now();
            let (a, d) = self.tracker.tag_pair(attacker.id, defender.id, now);
            self.note_tag(attacker.id, Some(defender.id), a, now);
            self.note_tag(defender.id, Some(attacker.id), d, now);
        }
        result
    }

    /// Tag an actor outside the attack path. Only online players can be
    /// tagged; returns whether the actor is tagged afterwards.
    pub fn tag(&mut self, id: ActorId, opponent: Option<ActorId>) -> bool {
        if !self.is_online_player(Participant::player(id)) {
            tracing::debug!(actor = %id, "tag ignored, not an online player");
            return false;
        }
        let now = self.clock.now();
        let transition = self.tracker.tag(id, opponent, now);
        self.note_tag(id, opponent, transition, now);
        true
    }

    /// Untag an actor outside expiry, death and disconnect. No-op if untagged.
    pub fn untag(&mut self, id: ActorId, reason: UntagReason) -> bool {
        if self.tracker.untag(id).is_none() {
            return false;
        }
        self.publish_untag(id, reason);
        true
    }

    fn is_online_player(&self, p: Participant) -> bool {
        p.kind == ActorKind::Player && self.registry.is_online(p.id)
    }

    fn note_tag(
        &mut self,
        actor: ActorId,
        opponent: Option<ActorId>,
        transition: TagTransition,
        now: combat_model::Timestamp,
    ) {
        if transition != TagTransition::Started {
            return;
        }
        // The scan dropped the previous tag but its handoff has not arrived.
        if self.announced.contains(&actor) {
            self.publish_untag(actor, UntagReason::Expired);
        }
        tracing::debug!(actor = %actor, opponent = ?opponent, "tagged");
        self.announced.insert(actor);
        self.events.emit(CombatEvent::Tagged {
            actor,
            opponent,
            since: now,
        });
    }

    fn publish_untag(&mut self, id: ActorId, reason: UntagReason) {
        tracing::debug!(actor = %id, ?reason, "untagged");
        self.announced.remove(&id);
        self.events.emit(CombatEvent::Untagged { actor: id, reason });
    }

    /// Disconnect entry point. A tagged actor is punished before its state
    /// is released.
    pub fn disconnect(&mut self, id: ActorId) -> Option<DisconnectOutcome> {
        let Some(actor) = self.registry.get_mut(id).filter(|a| a.online) else {
            tracing::warn!(actor = %id, "disconnect ignored, actor not online");
            return None;
        };

        // Punishment sees the actor as it was at the disconnect instant.
        let mut outcome = None;
        if let Some(tag) = self.tracker.untag(id) {
            outcome = Some(self.punishment.apply_disconnect_punishment(
                actor,
                tag,
                &mut self.host,
                &mut self.ledger,
                &mut self.events,
            ));
            self.publish_untag(id, UntagReason::Disconnect);
        }

        if let Ok(actor) = self.registry.set_offline(id) {
            tracing::debug!(actor = %actor.id, "actor offline");
        }
        // The tag is settled above, so the state can go now.
        self.registry.release(id);
        outcome
    }

    /// Death entry point. Runs the drop policy, counts the kill, hands the
    /// death back to the host, then untags the victim.
    pub fn handle_death(&mut self, mut death: DeathEvent) -> DropDecision {
        let victim_id = death.victim;
        let Some(victim) = self.registry.get(victim_id).cloned() else {
            self.host.complete_death(death);
            return DropDecision::Untouched;
        };

        let tag = self.tracker.untag(victim_id);
        let decision =
            self.punishment
                .apply_death_drop_policy(&mut death, &victim, tag.as_ref(), &mut self.host);

        let killer = death
            .killer
            .filter(|k| *k != victim_id && self.registry.contains(*k));
        if let Some(killer) = killer {
            if let KillVerdict::Abusive(kills) = self.kill_abuse.record_kill(killer, victim_id) {
                self.events.emit(CombatEvent::KillAbuse {
                    killer,
                    victim: victim_id,
                    kills,
                });
            }
        }

        self.host.complete_death(death);
        if tag.is_some() {
            self.publish_untag(victim_id, UntagReason::Death);
        }
        decision
    }

    /// Open a fresh respawn protection window.
    pub fn respawn(&mut self, id: ActorId) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let window = self.settings.lifecycle.respawn_protection();
        let actor = self.registry.get_mut(id).ok_or(RegistryError::UnknownActor(id))?;
        if let Some(window) = window {
            actor.grant_respawn_protection(now, window);
        }
        Ok(())
    }

    pub fn zone_change(&mut self, id: ActorId, zone: ZoneId) -> Result<(), RegistryError> {
        let actor = self.registry.get_mut(id).ok_or(RegistryError::UnknownActor(id))?;
        actor.location.zone = zone;
        Ok(())
    }

    pub fn set_pvp(&mut self, id: ActorId, enabled: bool) -> Result<(), RegistryError> {
        let actor = self.registry.get_mut(id).ok_or(RegistryError::UnknownActor(id))?;
        actor.set_pvp_enabled(enabled);
        Ok(())
    }

    pub fn set_override(&mut self, id: ActorId, active: bool) -> Result<(), RegistryError> {
        let actor = self.registry.get_mut(id).ok_or(RegistryError::UnknownActor(id))?;
        actor.set_override(active);
        Ok(())
    }

    pub fn end_newbie(&mut self, id: ActorId) -> Result<(), RegistryError> {
        let actor = self.registry.get_mut(id).ok_or(RegistryError::UnknownActor(id))?;
        actor.end_newbie_protection();
        Ok(())
    }

    /// Publish tags the expiry scan already removed.
    pub fn on_tags_expired(&mut self, expired: Vec<ExpiredTag>) {
        for ExpiredTag { actor, .. } in expired {
            // Re-tagged in between: the expiry went out with the new tag.
            if self.tracker.is_tagged(actor) || !self.announced.contains(&actor) {
                continue;
            }
            self.publish_untag(actor, UntagReason::Expired);
        }
    }

    pub fn reset_kill_counters(&mut self) -> usize {
        let cleared = self.kill_abuse.reset();
        tracing::debug!(cleared, "kill counters reset");
        cleared
    }

    pub fn charge_toggle_fees(&mut self) -> FeeRun {
        let fee = self.settings.toggle.pvp_disabled_fee;
        let run = maintenance::charge_toggle_fees(self.registry.pvp_disabled_online(), fee, &mut self.ledger);
        for charge in &run.charges {
            self.events.emit(CombatEvent::ToggleFeeCharged {
                actor: charge.actor,
                requested: charge.requested,
                charged: charge.charged,
            });
        }
        run
    }

    pub fn reload_zones(&mut self, table: ZoneTable) {
        tracing::info!(zones = table.len(), "zone table reloaded");
        self.zones.replace(table);
    }

    pub fn apply_settings(&mut self, settings: Arc<CombatSettings>) {
        self.protection.set_config(settings.protection.clone());
        self.punishment.set_config(settings.punishment.clone());
        self.kill_abuse.set_config(settings.kill_abuse.clone());
        self.tracker.set_timeout(settings.scan.timeout());
        self.fallback = settings.lifecycle.fallback_location();
        self.settings = settings;
        tracing::info!("combat settings reloaded");
    }

    /// Untag everyone without punishment and release every actor.
    pub fn shutdown(&mut self) -> usize {
        let drained = self.tracker.drain();
        for (actor, _) in &drained {
            self.publish_untag(*actor, UntagReason::Shutdown);
        }
        // Expired by the scan, handoff still in flight.
        for actor in std::mem::take(&mut self.announced) {
            self.publish_untag(actor, UntagReason::Expired);
        }
        let released = self.registry.drain_all().len();
        let drained = drained.len();
        tracing::info!(drained, released, "combat state drained");
        self.events.emit(CombatEvent::ShutdownComplete { drained });
        drained
    }

    /// Apply one command. Only attacks produce a reply.
    pub fn apply(&mut self, cmd: EngineCommand) -> Option<AttackDecision> {
        let result = match cmd {
            EngineCommand::Connect {
                actor,
                name,
                location,
                first_join,
            } => self.connect(actor, name, location, first_join),
            EngineCommand::Disconnect { actor } => {
                self.disconnect(actor);
                Ok(())
            }
            EngineCommand::Attack { attacker, defender } => {
                let result = self.attack(attacker, defender);
                return Some(AttackDecision {
                    attacker: attacker.id,
                    defender: defender.id,
                    result,
                });
            }
            EngineCommand::Death(death) => {
                self.handle_death(death);
                Ok(())
            }
            EngineCommand::Respawn { actor } => self.respawn(actor),
            EngineCommand::ZoneChange { actor, zone } => self.zone_change(actor, zone),
            EngineCommand::SetPvp { actor, enabled } => self.set_pvp(actor, enabled),
            EngineCommand::SetOverride { actor, active } => self.set_override(actor, active),
            EngineCommand::EndNewbie { actor } => self.end_newbie(actor),
            EngineCommand::Untag { actor, reason } => {
                self.untag(actor, reason);
                Ok(())
            }
            EngineCommand::ReloadZones(table) => {
                self.reload_zones(table);
                Ok(())
            }
            EngineCommand::ReloadSettings(settings) => {
                self.apply_settings(settings);
                Ok(())
            }
            EngineCommand::TagsExpired(expired) => {
                self.on_tags_expired(expired);
                Ok(())
            }
            EngineCommand::Maintenance(MaintenanceTask::ResetKillCounters) => {
                self.reset_kill_counters();
                Ok(())
            }
            EngineCommand::Maintenance(MaintenanceTask::ChargeToggleFees) => {
                self.charge_toggle_fees();
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "command rejected");
        }
        None
    }
}
