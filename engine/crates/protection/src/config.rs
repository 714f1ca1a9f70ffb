use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Let two tagged actors keep fighting across a protected border when an
    /// oracle says the pair may interact.
    pub border_hopping_vulnerable: bool,
}
