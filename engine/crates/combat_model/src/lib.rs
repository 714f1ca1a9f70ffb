pub mod clock;
pub mod error;
pub mod events;
pub mod ids;
pub mod inventory;
pub mod registry;
pub mod state;
pub mod zone;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::RegistryError;
pub use events::{CombatEvent, CombatListener, EventBus, PlayerCombatLogEvent, UntagReason};
pub use ids::{ActorId, ZoneId};
pub use inventory::{Inventory, ItemStack};
pub use registry::ActorRegistry;
pub use state::{ActorKind, ActorState, CombatTag, Location};
pub use zone::{CombatZone, ZoneRegistry, ZoneTable};
