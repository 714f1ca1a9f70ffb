use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::ids::ZoneId;

/// Per-world combat policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatZone {
    pub combat_allowed: bool,
}

impl Default for CombatZone {
    fn default() -> Self {
        Self {
            combat_allowed: true,
        }
    }
}

/// Immutable set of zone policies. Zones the table does not name fall back
/// to `fallback`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTable {
    zones: BTreeMap<ZoneId, CombatZone>,
    fallback: CombatZone,
}

impl ZoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, zone: impl Into<ZoneId>, policy: CombatZone) -> Self {
        self.zones.insert(zone.into(), policy);
        self
    }

    pub fn get(&self, zone: &ZoneId) -> CombatZone {
        self.zones.get(zone).copied().unwrap_or(self.fallback)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl FromIterator<(ZoneId, CombatZone)> for ZoneTable {
    fn from_iter<I: IntoIterator<Item = (ZoneId, CombatZone)>>(iter: I) -> Self {
        Self {
            zones: iter.into_iter().collect(),
            fallback: CombatZone::default(),
        }
    }
}

/// Holds the current zone table. Reload swaps the whole table; readers keep
/// the snapshot they took.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    current: RwLock<Arc<ZoneTable>>,
}

impl ZoneRegistry {
    pub fn new(table: ZoneTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    pub fn snapshot(&self) -> Arc<ZoneTable> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, table: ZoneTable) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(table);
        tracing::debug!(zones = guard.len(), "zone table replaced");
    }
}
