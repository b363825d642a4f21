//! Vessel types: the boats a firm registers for gate passes.

use serde::{Deserialize, Serialize};

/// A registered boat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vessel {
    /// Unique fleet identifier (e.g. `B-101`).
    pub id: String,

    pub name: String,

    /// Seats, including the driver. Always greater than zero.
    pub capacity: u32,

    #[serde(rename = "status")]
    pub operational_status: OperationalStatus,

    /// Registered owner, when the firm records one.
    #[serde(default)]
    pub owner: Option<String>,
}

impl Vessel {
    pub fn is_active(&self) -> bool {
        self.operational_status == OperationalStatus::Active
    }
}

/// Whether a vessel may be put on the water.
///
/// Changed only by the maintenance workflow; vessels are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationalStatus {
    Active,
    UnderRepair,
    Blocked,
}

impl OperationalStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::UnderRepair => "under repair",
            Self::Blocked => "blocked",
        }
    }
}
