pub mod config;
pub mod engine;
pub mod oracle;
pub mod result;

pub use config::ProtectionConfig;
pub use engine::{Combatant, ProtectionEngine, Rule, RULE_CHAIN};
pub use oracle::{OracleError, OracleSet, ProtectionOracle};
pub use result::{ProtectionKind, ProtectionResult};
