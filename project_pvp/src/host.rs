use std::collections::BTreeMap;

use combat_model::{ActorId, ActorState, Inventory, ItemStack, Location};
use punishment::{ActorHost, DeathEvent};

/// Experience lost on death is capped, like vanilla orb drops.
const MAX_DROPPED_EXP: u32 = 100;
const EXP_PER_LEVEL_DROP: u32 = 7;

#[derive(Debug, Clone)]
struct Body {
    health: u32,
    inventory: Inventory,
    armor: Vec<ItemStack>,
    exp: u32,
    location: Location,
}

impl Body {
    fn dead(&self) -> bool {
        self.health == 0
    }
}

/// In-memory stand-in for the game server: bodies, inventories and the
/// items lying on the ground. Only the tick thread touches it.
#[derive(Debug)]
pub struct SimulatedHost {
    bodies: BTreeMap<ActorId, Body>,
    ground: Vec<(Location, ItemStack)>,
    inventory_size: usize,
    max_health: u32,
}

impl SimulatedHost {
    pub fn new(inventory_size: usize, max_health: u32) -> Self {
        Self {
            bodies: BTreeMap::new(),
            ground: Vec::new(),
            inventory_size,
            max_health: max_health.max(1),
        }
    }

    /// Spawn a body for a joining actor. A returning actor keeps its body.
    pub fn join(&mut self, actor: ActorId, location: Location) {
        let (size, health) = (self.inventory_size, self.max_health);
        let body = self.bodies.entry(actor).or_insert_with(|| Body {
            health,
            inventory: Inventory::new(size),
            armor: Vec::new(),
            exp: 0,
            location: location.clone(),
        });
        body.location = location;
    }

    pub fn move_to(&mut self, actor: ActorId, location: Location) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.location = location;
        }
    }

    pub fn give(&mut self, actor: ActorId, items: Vec<ItemStack>) -> Vec<ItemStack> {
        match self.bodies.get_mut(&actor) {
            Some(body) => body.inventory.add_items(items),
            None => items,
        }
    }

    pub fn equip(&mut self, actor: ActorId, piece: ItemStack) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.armor.push(piece);
        }
    }

    pub fn add_exp(&mut self, actor: ActorId, exp: u32) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.exp = body.exp.saturating_add(exp);
        }
    }

    /// Back to full health after respawn.
    pub fn heal(&mut self, actor: ActorId) {
        let max = self.max_health;
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.health = max;
        }
    }

    pub fn health(&self, actor: ActorId) -> Option<u32> {
        self.bodies.get(&actor).map(|b| b.health)
    }

    pub fn inventory(&self, actor: ActorId) -> Vec<ItemStack> {
        self.bodies
            .get(&actor)
            .map(|b| b.inventory.contents())
            .unwrap_or_default()
    }

    pub fn armor(&self, actor: ActorId) -> Vec<ItemStack> {
        self.bodies.get(&actor).map(|b| b.armor.clone()).unwrap_or_default()
    }

    pub fn exp(&self, actor: ActorId) -> u32 {
        self.bodies.get(&actor).map_or(0, |b| b.exp)
    }

    pub fn ground(&self) -> &[(Location, ItemStack)] {
        &self.ground
    }

    /// Kill a body and describe the death as the server would report it.
    /// Drops are copies; the body keeps its items until the death completes.
    pub fn death_of(&mut self, victim: ActorId, killer: Option<ActorId>) -> Option<DeathEvent> {
        let body = self.bodies.get_mut(&victim)?;
        if body.dead() {
            return None;
        }
        body.health = 0;
        let mut death = DeathEvent::new(victim, killer, body.location.clone());
        death.main_drops = body.inventory.contents();
        death.armor_drops = body.armor.clone();
        death.dropped_exp = body.exp.saturating_mul(EXP_PER_LEVEL_DROP).min(MAX_DROPPED_EXP);
        Some(death)
    }
}

impl ActorHost for SimulatedHost {
    fn kill(&mut self, actor: &ActorState, last_attacker: Option<ActorId>) -> Option<DeathEvent> {
        self.move_to(actor.id, actor.location.clone());
        self.death_of(actor.id, last_attacker)
    }

    fn complete_death(&mut self, death: DeathEvent) {
        let Some(body) = self.bodies.get_mut(&death.victim) else {
            tracing::warn!(actor = %death.victim, "death for unknown body");
            return;
        };
        if !death.keep_inventory {
            body.inventory.take_all();
            body.armor.clear();
        }
        if !death.keep_level {
            body.exp = 0;
        }
        let overflow = body.inventory.add_items(death.restored);
        self.ground.extend(
            death
                .main_drops
                .into_iter()
                .chain(death.armor_drops)
                .chain(death.world_drops)
                .chain(overflow)
                .map(|item| (death.location.clone(), item)),
        );
    }

    fn give_items(&mut self, actor: ActorId, items: Vec<ItemStack>) -> Vec<ItemStack> {
        self.give(actor, items)
    }
}
