use std::collections::BTreeMap;

use thiserror::Error;

use combat_model::ActorId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds for {actor}: balance {balance}, requested {requested}")]
    Insufficient {
        actor: ActorId,
        balance: u64,
        requested: u64,
    },
    #[error("no account for {0}")]
    UnknownAccount(ActorId),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Host-side currency accounts.
pub trait CurrencyLedger {
    fn balance(&self, actor: ActorId) -> Result<u64, LedgerError>;
    fn withdraw(&mut self, actor: ActorId, amount: u64) -> Result<(), LedgerError>;
}

/// Result of a capped deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub actor: ActorId,
    pub requested: u64,
    pub charged: u64,
}

impl Charge {
    pub fn is_capped(&self) -> bool {
        self.charged < self.requested
    }
}

/// Deduct up to `amount`, never more than the balance.
///
/// Shortfalls and ledger failures are logged and reported as a smaller
/// charge; they never surface as errors.
pub fn charge_capped(ledger: &mut dyn CurrencyLedger, actor: ActorId, amount: u64) -> Charge {
    let mut charge = Charge {
        actor,
        requested: amount,
        charged: 0,
    };
    if amount == 0 {
        return charge;
    }
    let balance = match ledger.balance(actor) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(actor = %actor, error = %e, "could not read balance, skipping charge");
            return charge;
        }
    };
    let take = amount.min(balance);
    if take == 0 {
        tracing::info!(actor = %actor, requested = amount, "no funds to charge");
        return charge;
    }
    if let Err(e) = ledger.withdraw(actor, take) {
        tracing::warn!(actor = %actor, amount = take, error = %e, "withdraw failed, skipping charge");
        return charge;
    }
    charge.charged = take;
    if charge.is_capped() {
        tracing::info!(actor = %actor, requested = amount, charged = take, "charge capped at balance");
    }
    charge
}

/// Ledger kept in memory; used by the simulated host and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    accounts: BTreeMap<ActorId, u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, actor: ActorId, balance: u64) {
        self.accounts.entry(actor).or_insert(balance);
    }

    pub fn deposit(&mut self, actor: ActorId, amount: u64) {
        let entry = self.accounts.entry(actor).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn get(&self, actor: ActorId) -> Option<u64> {
        self.accounts.get(&actor).copied()
    }
}

impl CurrencyLedger for InMemoryLedger {
    fn balance(&self, actor: ActorId) -> Result<u64, LedgerError> {
        self.get(actor).ok_or(LedgerError::UnknownAccount(actor))
    }

    fn withdraw(&mut self, actor: ActorId, amount: u64) -> Result<(), LedgerError> {
        let balance = self
            .accounts
            .get_mut(&actor)
            .ok_or(LedgerError::UnknownAccount(actor))?;
        if *balance < amount {
            return Err(LedgerError::Insufficient {
                actor,
                balance: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }
}
