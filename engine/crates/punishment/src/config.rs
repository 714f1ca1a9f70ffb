use serde::{Deserialize, Serialize};

use crate::death::DropMode;

/// Consequences of leaving or dying while in combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunishmentConfig {
    pub kill_on_logout: bool,
    /// Zero disables the fine.
    pub fine_amount: u64,
    /// Applies to the forced death of a combat logout.
    pub drop_mode: DropMode,
    pub drop_exp: bool,
    pub drop_inventory: bool,
    pub drop_armor: bool,
}

impl Default for PunishmentConfig {
    fn default() -> Self {
        Self {
            kill_on_logout: true,
            fine_amount: 0,
            drop_mode: DropMode::Drop,
            drop_exp: true,
            drop_inventory: true,
            drop_armor: true,
        }
    }
}
