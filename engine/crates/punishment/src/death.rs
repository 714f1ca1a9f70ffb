use serde::{Deserialize, Serialize};

use combat_model::{ActorId, ItemStack, Location};

/// Drop handling for the forced death of a combat logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DropMode {
    /// Keep everything when nobody got the kill.
    #[default]
    Drop,
    /// Keep everything when somebody got the kill.
    Keep,
    /// Hand the drops straight to the killer.
    Transfer,
    /// Destroy drops and experience.
    Clear,
}

/// A death as reported by the host, mutated in place by the drop policy and
/// handed back to the host to complete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeathEvent {
    pub victim: ActorId,
    pub killer: Option<ActorId>,
    pub location: Location,
    pub main_drops: Vec<ItemStack>,
    pub armor_drops: Vec<ItemStack>,
    pub dropped_exp: u32,
    pub keep_inventory: bool,
    pub keep_level: bool,
    /// Items the victim gets back after respawn.
    pub restored: Vec<ItemStack>,
    /// Items spawned at `location` by the policy itself.
    pub world_drops: Vec<ItemStack>,
}

impl DeathEvent {
    pub fn new(victim: ActorId, killer: Option<ActorId>, location: Location) -> Self {
        Self {
            victim,
            killer,
            location,
            ..Self::default()
        }
    }

    pub fn drops(&self) -> impl Iterator<Item = &ItemStack> {
        self.main_drops.iter().chain(self.armor_drops.iter())
    }

    pub fn has_drops(&self) -> bool {
        !self.main_drops.is_empty() || !self.armor_drops.is_empty()
    }

    pub fn take_drops(&mut self) -> Vec<ItemStack> {
        let mut all = std::mem::take(&mut self.main_drops);
        all.append(&mut self.armor_drops);
        all
    }

    pub fn clear_drops(&mut self) {
        self.main_drops.clear();
        self.armor_drops.clear();
    }

    /// The victim keeps the inventory; nothing hits the ground.
    pub fn keep_inventory(&mut self) {
        self.keep_inventory = true;
        self.clear_drops();
    }

    /// The victim keeps its level; no experience orbs.
    pub fn keep_experience(&mut self) {
        self.keep_level = true;
        self.dropped_exp = 0;
    }
}

/// Which rule the death-drop policy ended up applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropDecision {
    /// Forced death of a combat logout.
    CombatLog(DropMode),
    /// A death while tagged. `pvp_kill` is true when the tag came from the killer.
    Switches { pvp_kill: bool },
    /// Not combat related; the host's defaults stand.
    Untouched,
}
