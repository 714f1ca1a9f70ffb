use combat_model::{ActorId, ActorState, ItemStack};

use crate::death::DeathEvent;

/// What the engine needs from the game server to carry out punishments.
pub trait ActorHost {
    /// Set the actor's health to zero. Returns the resulting death, or `None`
    /// if the host could not kill it (already dead, unknown).
    fn kill(&mut self, actor: &ActorState, last_attacker: Option<ActorId>) -> Option<DeathEvent>;

    /// Apply a death after the drop policy has run on it.
    fn complete_death(&mut self, death: DeathEvent);

    /// Put items into an actor's inventory, returning what did not fit.
    fn give_items(&mut self, actor: ActorId, items: Vec<ItemStack>) -> Vec<ItemStack>;
}
