//! Core data model for gatepass.
//!
//! The fleet (vessels and the drivers who sail them) and the trip records
//! the ledger accumulates as gate passes are honored.

mod driver;
mod trip;
mod vessel;

pub use driver::{Driver, LicenseStatus};
pub use trip::TripRecord;
pub use vessel::{OperationalStatus, Vessel};
