use serde::{Deserialize, Serialize};

/// Closed set of attack decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtectionKind {
    /// Admin bypass, or border hopping between two tagged actors.
    Override,
    WorldProtection,
    RespawnProtection,
    Newbie,
    #[serde(rename = "PVPDISABLED")]
    PvpDisabled,
    AfkProtection,
    /// A consulted oracle lifted newbie or pvp-disabled protection.
    PluginHookOverride,
    Allowed,
}

impl ProtectionKind {
    /// Outcomes for which the attack goes through: `Allowed`, plus the
    /// `Override` and `PluginHookOverride` bypasses.
    pub fn lets_attack_through(self) -> bool {
        matches!(
            self,
            ProtectionKind::Allowed | ProtectionKind::Override | ProtectionKind::PluginHookOverride
        )
    }
}

impl std::fmt::Display for ProtectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Override => "OVERRIDE",
            Self::WorldProtection => "WORLD_PROTECTION",
            Self::RespawnProtection => "RESPAWN_PROTECTION",
            Self::Newbie => "NEWBIE",
            Self::PvpDisabled => "PVPDISABLED",
            Self::AfkProtection => "AFK_PROTECTION",
            Self::PluginHookOverride => "PLUGIN_HOOK_OVERRIDE",
            Self::Allowed => "ALLOWED",
        };
        f.write_str(s)
    }
}

/// An immutable attack decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtectionResult {
    pub kind: ProtectionKind,
    /// True when the attacker's own state caused the block.
    pub attacker_caused: bool,
}

impl ProtectionResult {
    pub fn new(kind: ProtectionKind) -> Self {
        Self {
            kind,
            attacker_caused: false,
        }
    }

    pub fn allowed() -> Self {
        Self::new(ProtectionKind::Allowed)
    }

    pub fn with_attacker_caused(mut self, attacker_caused: bool) -> Self {
        self.attacker_caused = attacker_caused;
        self
    }

    /// True for `Allowed` and for both override outcomes.
    pub fn can_attack(&self) -> bool {
        self.kind.lets_attack_through()
    }

    pub fn is_protected(&self) -> bool {
        !self.can_attack()
    }
}

impl From<ProtectionKind> for ProtectionResult {
    fn from(kind: ProtectionKind) -> Self {
        Self::new(kind)
    }
}
