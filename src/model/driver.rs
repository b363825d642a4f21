//! Driver types: licensed operators who sail the fleet.

use serde::{Deserialize, Serialize};

/// A licensed boat driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Driver {
    /// Unique fleet identifier (e.g. `D01`).
    pub id: String,

    pub name: String,

    pub license_number: String,

    pub license_status: LicenseStatus,

    /// The vessel this driver is assigned to, if any.
    /// When set, it names a vessel registered in the same fleet.
    #[serde(default)]
    pub assigned_vessel_id: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,
}

impl Driver {
    pub fn is_active(&self) -> bool {
        self.license_status == LicenseStatus::Active
    }
}

/// Where a driver's license stands with the licensing authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LicenseStatus {
    Active,
    Pending,
    Blocked,
}

impl LicenseStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Blocked => "blocked",
        }
    }
}
