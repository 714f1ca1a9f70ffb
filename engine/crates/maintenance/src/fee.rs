use std::time::Duration;

use serde::{Deserialize, Serialize};

use combat_model::ActorId;
use punishment::{charge_capped, Charge, CurrencyLedger};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleFeeConfig {
    /// Charged per run to every online actor with pvp off. Zero disables the job.
    pub pvp_disabled_fee: u64,
    pub fee_interval_secs: u64,
}

impl Default for ToggleFeeConfig {
    fn default() -> Self {
        Self {
            pvp_disabled_fee: 0,
            fee_interval_secs: 3600,
        }
    }
}

impl ToggleFeeConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.pvp_disabled_fee > 0 && self.fee_interval_secs > 0)
            .then(|| Duration::from_secs(self.fee_interval_secs))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeRun {
    pub charges: Vec<Charge>,
}

impl FeeRun {
    pub fn total_charged(&self) -> u64 {
        self.charges.iter().map(|c| c.charged).sum()
    }
}

/// Charge `fee` once to each actor, capped at their balance.
pub fn charge_toggle_fees(
    actors: impl IntoIterator<Item = ActorId>,
    fee: u64,
    ledger: &mut dyn CurrencyLedger,
) -> FeeRun {
    let mut run = FeeRun::default();
    if fee == 0 {
        return run;
    }
    for actor in actors {
        run.charges.push(charge_capped(ledger, actor, fee));
    }
    tracing::info!(
        actors = run.charges.len(),
        total = run.total_charged(),
        "pvp toggle fees charged"
    );
    run
}
