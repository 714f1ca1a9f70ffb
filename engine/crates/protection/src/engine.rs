use combat_model::{ActorState, Timestamp, ZoneTable};

use crate::config::ProtectionConfig;
use crate::oracle::OracleSet;
use crate::result::{ProtectionKind, ProtectionResult};

/// One side of an attack as the engine sees it: the actor's state joined
/// with whether the tag tracker currently holds a tag for it.
#[derive(Debug, Clone, Copy)]
pub struct Combatant<'a> {
    pub state: &'a ActorState,
    pub tagged: bool,
}

impl<'a> Combatant<'a> {
    pub fn new(state: &'a ActorState, tagged: bool) -> Self {
        Self { state, tagged }
    }
}

/// The protection rules, in the order they are tried. The first rule that
/// produces a result decides the attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Override,
    WorldProtection,
    RespawnProtection,
    Newbie,
    PvpDisabled,
    AfkProtection,
}

pub const RULE_CHAIN: [Rule; 6] = [
    Rule::Override,
    Rule::WorldProtection,
    Rule::RespawnProtection,
    Rule::Newbie,
    Rule::PvpDisabled,
    Rule::AfkProtection,
];

struct Attack<'a> {
    attacker: Combatant<'a>,
    defender: Combatant<'a>,
    zones: &'a ZoneTable,
    now: Timestamp,
}

impl Rule {
    fn check(self, engine: &ProtectionEngine, attack: &Attack<'_>) -> Option<ProtectionResult> {
        let attacker = attack.attacker.state;
        let defender = attack.defender.state;
        let oracles = &engine.oracles;

        match self {
            Rule::Override => {
                let border_hop = engine.config.border_hopping_vulnerable
                    && attack.attacker.tagged
                    && attack.defender.tagged
                    && oracles.can_attack(attacker, defender);
                (attacker.override_active() || border_hop)
                    .then(|| ProtectionKind::Override.into())
            }
            Rule::WorldProtection => {
                let zone = attack.zones.get(defender.zone());
                (!zone.combat_allowed).then(|| ProtectionKind::WorldProtection.into())
            }
            Rule::RespawnProtection => {
                let by_attacker = attacker.has_respawn_protection(attack.now);
                (by_attacker || defender.has_respawn_protection(attack.now)).then(|| {
                    ProtectionResult::new(ProtectionKind::RespawnProtection)
                        .with_attacker_caused(by_attacker)
                })
            }
            Rule::Newbie => {
                let by_attacker = attacker.is_newbie(attack.now);
                if !by_attacker && !defender.is_newbie(attack.now) {
                    return None;
                }
                Some(lift_or_block(
                    oracles,
                    attacker,
                    defender,
                    ProtectionKind::Newbie,
                    by_attacker,
                ))
            }
            Rule::PvpDisabled => {
                let by_attacker = !attacker.pvp_enabled();
                if !by_attacker && defender.pvp_enabled() {
                    return None;
                }
                Some(lift_or_block(
                    oracles,
                    attacker,
                    defender,
                    ProtectionKind::PvpDisabled,
                    by_attacker,
                ))
            }
            Rule::AfkProtection => oracles
                .is_afk(defender)
                .then(|| ProtectionKind::AfkProtection.into()),
        }
    }
}

fn lift_or_block(
    oracles: &OracleSet,
    attacker: &ActorState,
    defender: &ActorState,
    reason: ProtectionKind,
    attacker_caused: bool,
) -> ProtectionResult {
    if oracles.should_disable_protection(attacker, defender, reason) {
        ProtectionKind::PluginHookOverride.into()
    } else {
        ProtectionResult::new(reason).with_attacker_caused(attacker_caused)
    }
}

/// Decides whether one actor may attack another.
///
/// Evaluation reads its inputs and the oracles' answers and nothing else:
/// it never mutates actor state and never blocks on I/O of its own.
#[derive(Debug, Default)]
pub struct ProtectionEngine {
    config: ProtectionConfig,
    oracles: OracleSet,
}

impl ProtectionEngine {
    pub fn new(config: ProtectionConfig) -> Self {
        Self {
            config,
            oracles: OracleSet::new(),
        }
    }

    pub fn with_oracles(config: ProtectionConfig, oracles: OracleSet) -> Self {
        Self { config, oracles }
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    /// Swap in a reloaded configuration.
    pub fn set_config(&mut self, config: ProtectionConfig) {
        self.config = config;
    }

    pub fn oracles_mut(&mut self) -> &mut OracleSet {
        &mut self.oracles
    }

    pub fn rules(&self) -> &'static [Rule] {
        &RULE_CHAIN
    }

    pub fn evaluate(
        &self,
        attacker: Combatant<'_>,
        defender: Combatant<'_>,
        zones: &ZoneTable,
        now: Timestamp,
    ) -> ProtectionResult {
        let attack = Attack {
            attacker,
            defender,
            zones,
            now,
        };
        let result = RULE_CHAIN
            .iter()
            .find_map(|rule| rule.check(self, &attack))
            .unwrap_or_else(ProtectionResult::allowed);
        tracing::debug!(
            attacker = %attacker.state.id,
            defender = %defender.state.id,
            outcome = %result.kind,
            attacker_caused = result.attacker_caused,
            "attack evaluated"
        );
        result
    }

    pub fn can_attack(
        &self,
        attacker: Combatant<'_>,
        defender: Combatant<'_>,
        zones: &ZoneTable,
        now: Timestamp,
    ) -> bool {
        self.evaluate(attacker, defender, zones, now).can_attack()
    }
}
