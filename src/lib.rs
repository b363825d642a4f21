//! Gate pass authorization for a rafting fleet.
//!
//! A verifier at the put-in scans a driver's ID card, then the boat's sail
//! pass. The [`session::AuthorizationSession`] checks both against the fleet
//! directory and the day's [`ledger::TripLedger`], returns a
//! [`policy::Verdict`], and on approval records the trip.

pub mod checkpoint;
pub mod config;
pub mod fleet;
pub mod ledger;
pub mod model;
pub mod pass;
pub mod policy;
pub mod session;

pub use checkpoint::{Checkpoint, Clock, ScanEntry, ScanSummary, SystemClock};
pub use config::Config;
pub use fleet::{DriverRepository, Fleet, FleetError, VesselRepository};
pub use ledger::{InMemoryLedger, LedgerError, OperatingCalendar, SqliteLedger, TripLedger};
pub use pass::{PassKind, PassPayload, PayloadError};
pub use policy::{Decision, ReasonCode, Severity, Verdict};
pub use session::{AuthorizationSession, Credential, Progress, SessionError, SessionState};
