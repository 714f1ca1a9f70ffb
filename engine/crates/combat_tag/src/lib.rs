pub mod scan;
pub mod tracker;

pub use scan::{ExpiryScan, ScanConfig, ScanReport};
pub use tracker::{CombatTagTracker, ExpiredTag, TagTransition};
