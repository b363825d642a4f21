//! Trip records: the append-only entries of the trip ledger.

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

/// One honored gate pass: a vessel left the checkpoint with a driver.
///
/// Created exactly once per approved authorization and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub vessel_id: String,
    pub driver_id: String,
    pub issued_at: Timestamp,

    /// The facility-local calendar day `issued_at` falls on.
    pub operating_day: Date,
}
