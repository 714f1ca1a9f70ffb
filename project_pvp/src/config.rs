use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use combat_model::{CombatZone, ZoneId, ZoneTable};
use combat_tag::ScanConfig;
use engine_core::{CombatSettings, LifecycleConfig, TickConfig};
use maintenance::{KillAbuseConfig, ToggleFeeConfig};
use protection::ProtectionConfig;
use punishment::PunishmentConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TickSection {
    pub tps: u32,
}

impl Default for TickSection {
    fn default() -> Self {
        Self { tps: 20 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombatSection {
    pub combat_timeout_secs: u64,
    pub scan_interval_ms: u64,
    pub default_zone: String,
}

impl Default for CombatSection {
    fn default() -> Self {
        Self {
            combat_timeout_secs: 15,
            scan_interval_ms: 1_000,
            default_zone: "world".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProtectionSection {
    pub border_hopping_vulnerable: bool,
    pub respawn_protection_secs: u64,
    pub newbie_protection_secs: u64,
    pub newbie_enabled: bool,
    pub default_pvp: bool,
}

impl Default for ProtectionSection {
    fn default() -> Self {
        Self {
            border_hopping_vulnerable: false,
            respawn_protection_secs: 5,
            newbie_protection_secs: 600,
            newbie_enabled: true,
            default_pvp: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneSection {
    pub name: String,
    #[serde(default = "default_true")]
    pub combat_allowed: bool,
}

fn default_true() -> bool {
    true
}

/// Simulated game server behind the host bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostSection {
    pub starting_balance: u64,
    pub inventory_size: usize,
    pub max_health: u32,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            starting_balance: 100,
            inventory_size: 36,
            max_health: 20,
        }
    }
}

/// Top-level PvP server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub tick: TickSection,
    pub combat: CombatSection,
    pub protection: ProtectionSection,
    pub punishment: PunishmentConfig,
    pub kill_abuse: KillAbuseConfig,
    pub toggle: ToggleFeeConfig,
    pub host: HostSection,
    pub zones: Vec<ZoneSection>,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_string(),
                    source,
                })?;
                Self::parse(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick.tps == 0 {
            return Err(ConfigError::Invalid("tick.tps must be positive".into()));
        }
        if self.combat.scan_interval_ms == 0 {
            return Err(ConfigError::Invalid("combat.scan_interval_ms must be positive".into()));
        }
        let mut seen = BTreeSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.name.as_str()) {
                return Err(ConfigError::Invalid(format!("zone {} listed twice", zone.name)));
            }
        }
        Ok(())
    }

    /// Convert tick section to engine_core's TickConfig.
    pub fn to_tick_config(&self) -> TickConfig {
        TickConfig {
            tps: self.tick.tps,
            max_ticks: 0,
        }
    }

    pub fn to_zone_table(&self) -> ZoneTable {
        zone_table(&self.zones)
    }

    pub fn to_combat_settings(&self) -> CombatSettings {
        CombatSettings {
            scan: ScanConfig {
                combat_timeout_secs: self.combat.combat_timeout_secs,
                scan_interval_ms: self.combat.scan_interval_ms,
            },
            protection: ProtectionConfig {
                border_hopping_vulnerable: self.protection.border_hopping_vulnerable,
            },
            lifecycle: LifecycleConfig {
                respawn_protection_secs: self.protection.respawn_protection_secs,
                newbie_protection_secs: self.protection.newbie_protection_secs,
                newbie_enabled: self.protection.newbie_enabled,
                default_pvp: self.protection.default_pvp,
                default_zone: self.combat.default_zone.clone(),
            },
            punishment: self.punishment.clone(),
            kill_abuse: self.kill_abuse.clone(),
            toggle: self.toggle.clone(),
        }
    }
}

pub fn zone_table(zones: &[ZoneSection]) -> ZoneTable {
    zones
        .iter()
        .map(|z| {
            (
                ZoneId::new(z.name.clone()),
                CombatZone {
                    combat_allowed: z.combat_allowed,
                },
            )
        })
        .collect()
}

/// The only flag is `--config <path>`; no flag means built-in defaults.
pub fn config_path_from_args<I>(args: I) -> Result<Option<String>, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| ConfigError::Invalid("--config requires a path".into()))?;
                path = Some(value);
            }
            other => return Err(ConfigError::Invalid(format!("unknown argument {other}"))),
        }
    }
    Ok(path)
}

/// Load the server config named on the command line.
pub fn parse_cli_args() -> Result<ServerConfig, ConfigError> {
    let path = config_path_from_args(std::env::args().skip(1))?;
    ServerConfig::load(path.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    use punishment::DropMode;

    #[test]
    fn default_config_values() {
        let config = ServerConfig::default();
        assert_eq!(config.tick.tps, 20);
        assert_eq!(config.combat.combat_timeout_secs, 15);
        assert_eq!(config.combat.default_zone, "world");
        assert!(config.punishment.kill_on_logout);
        assert_eq!(config.toggle.fee_interval_secs, 3600);
        assert!(config.zones.is_empty());
    }

    #[test]
    fn to_tick_config() {
        let tc = ServerConfig::default().to_tick_config();
        assert_eq!(tc.tps, 20);
        assert_eq!(tc.max_ticks, 0);
    }

    #[test]
    fn load_nonexistent_file_returns_defaults() {
        let config = ServerConfig::load(Some("/tmp/nonexistent_pvp_config_12345.toml")).unwrap();
        assert_eq!(config.tick.tps, 20);
    }

    #[test]
    fn load_none_returns_defaults() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.combat.scan_interval_ms, 1_000);
    }

    #[test]
    fn load_full_toml() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[tick]
tps = 10

[combat]
combat_timeout_secs = 30
default_zone = "overworld"

[protection]
border_hopping_vulnerable = true
newbie_enabled = false

[punishment]
fine_amount = 250
drop_mode = "clear"
drop_armor = false

[kill_abuse]
max_kills = 3

[toggle]
pvp_disabled_fee = 15

[[zones]]
name = "lobby"
combat_allowed = false

[[zones]]
name = "arena"
"#
        )
        .unwrap();

        let config = ServerConfig::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.tick.tps, 10);
        assert_eq!(config.combat.scan_interval_ms, 1_000);

        let settings = config.to_combat_settings();
        assert_eq!(settings.scan.timeout(), Duration::from_secs(30));
        assert!(settings.protection.border_hopping_vulnerable);
        assert_eq!(settings.lifecycle.newbie_protection(), None);
        assert_eq!(settings.lifecycle.default_zone, "overworld");
        assert_eq!(settings.punishment.fine_amount, 250);
        assert_eq!(settings.punishment.drop_mode, DropMode::Clear);
        assert!(!settings.punishment.drop_armor);
        assert!(settings.punishment.drop_inventory);
        assert_eq!(settings.kill_abuse.max_kills, 3);
        assert_eq!(settings.toggle.interval(), Some(Duration::from_secs(3600)));

        let zones = config.to_zone_table();
        assert_eq!(zones.len(), 2);
        assert!(!zones.get(&ZoneId::new("lobby")).combat_allowed);
        assert!(zones.get(&ZoneId::new("arena")).combat_allowed);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ServerConfig::parse("[tick]\ntps = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServerConfig::parse("[[zones]]\nname = \"a\"\n[[zones]]\nname = \"a\"\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ServerConfig::parse("[punishment]\ndrop_mode = \"shred\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_flag_is_read() {
        assert_eq!(config_path_from_args(args(&[])).unwrap(), None);
        assert_eq!(
            config_path_from_args(args(&["--config", "pvp.toml"])).unwrap(),
            Some("pvp.toml".to_string())
        );
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(matches!(
            config_path_from_args(args(&["--config"])),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            config_path_from_args(args(&["--verbose"])),
            Err(ConfigError::Invalid(_))
        ));
    }
}
