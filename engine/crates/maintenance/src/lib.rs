pub mod fee;
pub mod jobs;
pub mod kill_abuse;
pub mod schedule;

pub use fee::{charge_toggle_fees, FeeRun, ToggleFeeConfig};
pub use jobs::{JobSchedule, MaintenanceJobs, MaintenanceTask};
pub use kill_abuse::{KillAbuseConfig, KillAbuseTracker, KillVerdict};
pub use schedule::spawn_repeating;
