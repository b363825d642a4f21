//! The checkpoint: everything a verifier device works against.
//!
//! A [`Checkpoint`] bundles the fleet directories, the shared trip ledger,
//! and a clock. Authorization sessions borrow it, and every decision they
//! reach is written to the checkpoint's scan history.

use std::sync::{Arc, Mutex, PoisonError};

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    fleet::{DriverRepository, VesselRepository},
    ledger::TripLedger,
    model::{Driver, Vessel},
    policy::{Decision, ReasonCode},
    session::AuthorizationSession,
};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock stopped at a fixed instant.
impl Clock for Timestamp {
    fn now(&self) -> Timestamp {
        *self
    }
}

/// One decision reached at this checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    pub session_id: Uuid,
    pub driver_id: String,

    /// Absent when the session ended at the driver step.
    pub vessel_id: Option<String>,
    pub vessel_name: Option<String>,

    pub decision: Decision,
    pub reason: ReasonCode,

    /// Trips the vessel had already taken when the decision was made.
    pub trips_today: Option<u32>,
    pub max_trips_per_day: u32,

    pub scanned_at: Timestamp,
}

/// Totals over the scan history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub allowed: usize,
    pub denied: usize,
}

/// A verification point and its collaborators.
pub struct Checkpoint {
    vessels: Arc<dyn VesselRepository>,
    drivers: Arc<dyn DriverRepository>,
    ledger: Arc<dyn TripLedger>,
    clock: Arc<dyn Clock>,
    history: Mutex<Vec<ScanEntry>>,
}

impl Checkpoint {
    /// Creates a checkpoint reading the system clock.
    pub fn new(
        vessels: Arc<dyn VesselRepository>,
        drivers: Arc<dyn DriverRepository>,
        ledger: Arc<dyn TripLedger>,
    ) -> Self {
        Self {
            vessels,
            drivers,
            ledger,
            clock: Arc::new(SystemClock),
            history: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Starts a fresh authorization session awaiting a driver.
    pub fn begin(&self) -> AuthorizationSession<'_> {
        AuthorizationSession::new(self)
    }

    pub fn ledger(&self) -> &dyn TripLedger {
        self.ledger.as_ref()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub(crate) fn vessel(&self, id: &str) -> Option<Vessel> {
        self.vessels.get_vessel(id)
    }

    pub(crate) fn driver(&self, id: &str) -> Option<Driver> {
        self.drivers.get_driver(id)
    }

    pub(crate) fn log_scan(&self, entry: ScanEntry) {
        // History is append-only; a panicked writer leaves it consistent.
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Decisions reached here, newest first.
    pub fn history(&self) -> Vec<ScanEntry> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.iter().rev().cloned().collect()
    }

    pub fn summary(&self) -> ScanSummary {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let allowed = history
            .iter()
            .filter(|e| e.decision == Decision::Allowed)
            .count();
        ScanSummary {
            total: history.len(),
            allowed,
            denied: history.len() - allowed,
        }
    }
}
