//! Gate pass payloads: the JSON carried inside issued QR codes.
//!
//! ```json
//! { "type": "boat_sail", "id": "B-101", "name": "Ganga Rider 1", "timestamp": 1780300800000 }
//! ```
//!
//! Drivers carry a `driver_verify` card; vessels carry a `boat_sail` pass.
//! The checkpoint hands the decoded `id` to the authorization session.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::model::{Driver, Vessel};

/// Errors from reading a scanned payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Not JSON, or not the pass shape.
    #[error("invalid pass payload: {0}")]
    Invalid(String),

    /// A well-formed pass of the other kind (a driver card at the vessel step).
    #[error("expected a {expected} pass, got {actual}")]
    WrongKind { expected: PassKind, actual: PassKind },
}

/// Which credential a pass stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassKind {
    #[serde(rename = "driver_verify")]
    DriverVerify,

    #[serde(rename = "boat_sail")]
    BoatSail,
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::DriverVerify => "driver_verify",
            Self::BoatSail => "boat_sail",
        })
    }
}

/// The decoded contents of a gate pass QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassPayload {
    #[serde(rename = "type")]
    pub kind: PassKind,

    pub id: String,

    pub name: String,

    /// Issue time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PassPayload {
    /// The sail pass printed for a vessel.
    pub fn for_vessel(vessel: &Vessel, at: Timestamp) -> Self {
        Self {
            kind: PassKind::BoatSail,
            id: vessel.id.clone(),
            name: vessel.name.clone(),
            timestamp: at.as_millisecond(),
        }
    }

    /// The ID card printed for a driver.
    pub fn for_driver(driver: &Driver, at: Timestamp) -> Self {
        Self {
            kind: PassKind::DriverVerify,
            id: driver.id.clone(),
            name: driver.name.clone(),
            timestamp: at.as_millisecond(),
        }
    }

    /// The compact JSON string encoded into the QR code.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses scanned QR content.
    pub fn decode(raw: &str) -> Result<Self, PayloadError> {
        let payload: Self =
            serde_json::from_str(raw.trim()).map_err(|e| PayloadError::Invalid(e.to_string()))?;
        if payload.id.trim().is_empty() {
            return Err(PayloadError::Invalid("empty id".to_string()));
        }
        Ok(payload)
    }

    /// Rejects a pass of the wrong kind for the current step.
    pub fn expect_kind(self, expected: PassKind) -> Result<Self, PayloadError> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(PayloadError::WrongKind {
                expected,
                actual: self.kind,
            })
        }
    }

    /// When the pass was issued, if the timestamp is in range.
    pub fn issued_at(&self) -> Option<Timestamp> {
        Timestamp::from_millisecond(self.timestamp).ok()
    }
}
