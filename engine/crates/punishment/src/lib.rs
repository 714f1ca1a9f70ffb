pub mod config;
pub mod death;
pub mod host;
pub mod ledger;
pub mod policy;

pub use config::PunishmentConfig;
pub use death::{DeathEvent, DropDecision, DropMode};
pub use host::ActorHost;
pub use ledger::{charge_capped, Charge, CurrencyLedger, InMemoryLedger, LedgerError};
pub use policy::{DisconnectOutcome, PunishmentPolicy};
