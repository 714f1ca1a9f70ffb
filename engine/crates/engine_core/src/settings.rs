use std::time::Duration;

use serde::{Deserialize, Serialize};

use combat_model::{Location, ZoneId};
use combat_tag::ScanConfig;
use maintenance::{KillAbuseConfig, ToggleFeeConfig};
use protection::ProtectionConfig;
use punishment::PunishmentConfig;

/// Protection windows granted on lifecycle events, and defaults for new actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub respawn_protection_secs: u64,
    pub newbie_protection_secs: u64,
    pub newbie_enabled: bool,
    /// Pvp toggle for actors joining for the first time.
    pub default_pvp: bool,
    /// Zone assumed for actors first seen outside a connect.
    pub default_zone: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            respawn_protection_secs: 5,
            newbie_protection_secs: 600,
            newbie_enabled: true,
            default_pvp: true,
            default_zone: "world".to_string(),
        }
    }
}

impl LifecycleConfig {
    pub fn respawn_protection(&self) -> Option<Duration> {
        (self.respawn_protection_secs > 0).then(|| Duration::from_secs(self.respawn_protection_secs))
    }

    pub fn newbie_protection(&self) -> Option<Duration> {
        (self.newbie_enabled && self.newbie_protection_secs > 0)
            .then(|| Duration::from_secs(self.newbie_protection_secs))
    }

    pub fn fallback_location(&self) -> Location {
        Location::in_zone(ZoneId::new(self.default_zone.clone()))
    }
}

/// Every policy knob the core reads. Replaced as a whole on reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatSettings {
    pub scan: ScanConfig,
    pub protection: ProtectionConfig,
    pub lifecycle: LifecycleConfig,
    pub punishment: PunishmentConfig,
    pub kill_abuse: KillAbuseConfig,
    pub toggle: ToggleFeeConfig,
}
