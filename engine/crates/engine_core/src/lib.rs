pub mod combat_core;
pub mod command;
pub mod jobs;
pub mod settings;
pub mod tick;

pub use combat_core::{AttackDecision, CombatCore};
pub use command::{CommandStream, EngineCommand, Participant};
pub use jobs::{spawn_background_jobs, BackgroundJobs};
pub use settings::{CombatSettings, LifecycleConfig};
pub use tick::{TickConfig, TickLoop, TickOutput};
