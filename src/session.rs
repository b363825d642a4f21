//! Authorization sessions: one driver-then-vessel check at a checkpoint.
//!
//! ```text
//! AwaitingDriver ──submit_driver──▶ AwaitingVessel ──submit_vessel──▶ Decided ──commit──▶ (committed)
//!       │                                 │
//!       └── unknown / inactive driver ──▶ Aborted ◀── unknown vessel
//! ```
//!
//! A session is terminal once it is aborted, decided with a denial, or
//! committed. Terminal sessions refuse every call except a repeated
//! `commit` on a committed session, which returns the same record.
//! A step called out of order aborts the session.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    checkpoint::{Checkpoint, ScanEntry},
    ledger::LedgerError,
    model::{Driver, TripRecord, Vessel},
    policy::{self, Verdict},
};

/// Which credential a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Driver,
    Vessel,
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Driver => "driver",
            Self::Vessel => "vessel",
        })
    }
}

/// Errors surfaced to the verifier.
///
/// Denials are not errors; they come back as a [`Verdict`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The scanned id is not in the fleet directory. The session aborts.
    #[error("unknown {kind}: {id}")]
    NotFound { kind: Credential, id: String },

    /// A step was called out of order. The session aborts.
    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Another session filled the vessel's last trip between decision and commit.
    #[error("{0}; please re-scan")]
    CapacityExceeded(#[source] LedgerError),

    /// Commit was called without an allowed decision.
    #[error("session has no allowed verdict to commit")]
    NotAuthorized,

    /// The session already ended; start a new one.
    #[error("session is finished; start a new session")]
    Terminated,

    #[error("ledger error: {0}")]
    Ledger(#[source] LedgerError),
}

impl From<LedgerError> for SessionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::CapacityExceeded { .. } => Self::CapacityExceeded(e),
            other => Self::Ledger(other),
        }
    }
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    AwaitingDriver,
    AwaitingVessel,
    Decided,
    Aborted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingDriver => "awaiting a driver",
            Self::AwaitingVessel => "awaiting a vessel",
            Self::Decided => "decided",
            Self::Aborted => "aborted",
        })
    }
}

/// The result of a submit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub state: SessionState,
    pub verdict: Option<Verdict>,
}

enum Stage {
    AwaitingDriver,
    AwaitingVessel {
        driver: Driver,
    },
    Decided {
        driver: Driver,
        vessel: Vessel,
        verdict: Verdict,
        trips_today: u32,
    },
    Committed {
        verdict: Verdict,
        record: TripRecord,
        trips_today: u32,
    },
    Aborted {
        verdict: Option<Verdict>,
    },
}

/// A single verification encounter.
///
/// Not shared between callers; the checkpoint's ledger is the only shared state.
pub struct AuthorizationSession<'a> {
    checkpoint: &'a Checkpoint,
    id: Uuid,
    driver_id: Option<String>,
    vessel_id: Option<String>,
    stage: Stage,
}

impl<'a> AuthorizationSession<'a> {
    pub(crate) fn new(checkpoint: &'a Checkpoint) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "session started");
        Self {
            checkpoint,
            id,
            driver_id: None,
            vessel_id: None,
            stage: Stage::AwaitingDriver,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn driver_id(&self) -> Option<&str> {
        self.driver_id.as_deref()
    }

    pub fn vessel_id(&self) -> Option<&str> {
        self.vessel_id.as_deref()
    }

    pub fn state(&self) -> SessionState {
        match self.stage {
            Stage::AwaitingDriver => SessionState::AwaitingDriver,
            Stage::AwaitingVessel { .. } => SessionState::AwaitingVessel,
            Stage::Decided { .. } | Stage::Committed { .. } => SessionState::Decided,
            Stage::Aborted { .. } => SessionState::Aborted,
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match &self.stage {
            Stage::AwaitingDriver | Stage::AwaitingVessel { .. } => None,
            Stage::Decided { verdict, .. } | Stage::Committed { verdict, .. } => Some(*verdict),
            Stage::Aborted { verdict } => *verdict,
        }
    }

    /// Trips the vessel had taken when the decision was made.
    pub fn trips_today(&self) -> Option<u32> {
        match &self.stage {
            Stage::Decided { trips_today, .. } | Stage::Committed { trips_today, .. } => {
                Some(*trips_today)
            }
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match &self.stage {
            Stage::AwaitingDriver | Stage::AwaitingVessel { .. } => false,
            Stage::Decided { verdict, .. } => !verdict.is_allowed(),
            Stage::Committed { .. } | Stage::Aborted { .. } => true,
        }
    }

    fn progress(&self) -> Progress {
        Progress {
            state: self.state(),
            verdict: self.verdict(),
        }
    }

    /// Fails if the session is terminal, then if it is not in `expected`.
    fn require(
        &mut self,
        operation: &'static str,
        expected: SessionState,
    ) -> Result<(), SessionError> {
        if self.is_terminal() {
            return Err(SessionError::Terminated);
        }
        let state = self.state();
        if state != expected {
            return Err(self.misuse(operation, state));
        }
        Ok(())
    }

    /// Aborts the session for an out-of-order call.
    fn misuse(&mut self, operation: &'static str, state: SessionState) -> SessionError {
        warn!(session = %self.id, operation, %state, "out-of-order session call; aborting");
        self.stage = Stage::Aborted { verdict: None };
        SessionError::InvalidState { operation, state }
    }

    /// Checks the scanned driver.
    ///
    /// An unknown driver aborts with [`SessionError::NotFound`]. A driver
    /// without an active license aborts with a denial and no vessel step.
    pub fn submit_driver(&mut self, driver_id: &str) -> Result<Progress, SessionError> {
        self.require("submit a driver", SessionState::AwaitingDriver)?;
        self.driver_id = Some(driver_id.to_string());

        let Some(driver) = self.checkpoint.driver(driver_id) else {
            info!(session = %self.id, driver_id, "unknown driver");
            self.stage = Stage::Aborted { verdict: None };
            return Err(SessionError::NotFound {
                kind: Credential::Driver,
                id: driver_id.to_string(),
            });
        };

        if let Some(verdict) = policy::evaluate_driver(&driver) {
            info!(session = %self.id, driver_id, reason = ?verdict.reason, "driver denied");
            self.checkpoint.log_scan(ScanEntry {
                session_id: self.id,
                driver_id: driver.id,
                vessel_id: None,
                vessel_name: None,
                decision: verdict.decision,
                reason: verdict.reason,
                trips_today: None,
                max_trips_per_day: self.checkpoint.ledger().max_trips_per_day(),
                scanned_at: self.checkpoint.now(),
            });
            self.stage = Stage::Aborted {
                verdict: Some(verdict),
            };
            return Ok(self.progress());
        }

        debug!(session = %self.id, driver_id, "driver verified");
        self.stage = Stage::AwaitingVessel { driver };
        Ok(self.progress())
    }

    /// Checks the scanned vessel against the verified driver and today's trips.
    pub fn submit_vessel(&mut self, vessel_id: &str) -> Result<Progress, SessionError> {
        self.require("submit a vessel", SessionState::AwaitingVessel)?;
        let Stage::AwaitingVessel { driver } = &self.stage else {
            let state = self.state();
            return Err(self.misuse("submit a vessel", state));
        };
        let driver = driver.clone();

        let Some(vessel) = self.checkpoint.vessel(vessel_id) else {
            info!(session = %self.id, vessel_id, "unknown vessel");
            self.vessel_id = Some(vessel_id.to_string());
            self.stage = Stage::Aborted { verdict: None };
            return Err(SessionError::NotFound {
                kind: Credential::Vessel,
                id: vessel_id.to_string(),
            });
        };

        let ledger = self.checkpoint.ledger();
        let now = self.checkpoint.now();
        let trips_today = ledger.trips_today(&vessel.id, now)?;
        let max = ledger.max_trips_per_day();
        let verdict = policy::evaluate(&vessel, &driver, trips_today, max);
        self.vessel_id = Some(vessel.id.clone());

        info!(
            session = %self.id,
            driver_id = %driver.id,
            vessel_id = %vessel.id,
            trips_today,
            max,
            decision = ?verdict.decision,
            reason = ?verdict.reason,
            "vessel decided"
        );
        self.checkpoint.log_scan(ScanEntry {
            session_id: self.id,
            driver_id: driver.id.clone(),
            vessel_id: Some(vessel.id.clone()),
            vessel_name: Some(vessel.name.clone()),
            decision: verdict.decision,
            reason: verdict.reason,
            trips_today: Some(trips_today),
            max_trips_per_day: max,
            scanned_at: now,
        });

        self.stage = Stage::Decided {
            driver,
            vessel,
            verdict,
            trips_today,
        };
        Ok(self.progress())
    }

    /// Records the allowed trip in the ledger.
    ///
    /// Idempotent: a second call returns the record from the first. A failed
    /// commit uses up the session, and the operator re-scans in a new one.
    pub fn commit(&mut self) -> Result<TripRecord, SessionError> {
        let (vessel_id, driver_id, verdict, trips_today) = match &self.stage {
            Stage::Committed { record, .. } => return Ok(record.clone()),
            Stage::Aborted { .. } => return Err(SessionError::Terminated),
            Stage::Decided {
                driver,
                vessel,
                verdict,
                trips_today,
            } => {
                if !verdict.is_allowed() {
                    return Err(SessionError::Terminated);
                }
                (vessel.id.clone(), driver.id.clone(), *verdict, *trips_today)
            }
            Stage::AwaitingDriver | Stage::AwaitingVessel { .. } => {
                return Err(SessionError::NotAuthorized);
            }
        };

        let now = self.checkpoint.now();
        match self.checkpoint.ledger().record(&vessel_id, &driver_id, now) {
            Ok(record) => {
                info!(session = %self.id, %vessel_id, %driver_id, day = %record.operating_day, "trip committed");
                self.stage = Stage::Committed {
                    verdict,
                    record: record.clone(),
                    trips_today,
                };
                Ok(record)
            }
            Err(e) => {
                warn!(session = %self.id, %vessel_id, error = %e, "commit failed");
                self.stage = Stage::Aborted {
                    verdict: Some(verdict),
                };
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    use jiff::{Timestamp, tz::TimeZone};

    use crate::{
        fleet::Fleet,
        ledger::{InMemoryLedger, OperatingCalendar, SqliteLedger, TripLedger},
        policy::{Decision, ReasonCode, Severity},
    };

    fn morning() -> Timestamp {
        "2026-06-01T08:00:00Z".parse().unwrap()
    }

    fn calendar() -> OperatingCalendar {
        OperatingCalendar::new(TimeZone::UTC)
    }

    fn checkpoint_with(ledger: Arc<dyn TripLedger>, at: Timestamp) -> Checkpoint {
        let fleet = Arc::new(Fleet::sample());
        Checkpoint::new(fleet.clone(), fleet, ledger).with_clock(at)
    }

    fn checkpoint() -> Checkpoint {
        checkpoint_with(Arc::new(InMemoryLedger::new(calendar(), 3)), morning())
    }

    fn decided<'a>(cp: &'a Checkpoint, driver: &str, vessel: &str) -> AuthorizationSession<'a> {
        let mut session = cp.begin();
        session.submit_driver(driver).unwrap();
        session.submit_vessel(vessel).unwrap();
        session
    }

    #[test]
    fn happy_path() {
        let cp = checkpoint();
        let mut session = cp.begin();
        assert_eq!(session.state(), SessionState::AwaitingDriver);

        let step = session.submit_driver("D01").unwrap();
        assert_eq!(step.state, SessionState::AwaitingVessel);
        assert_eq!(step.verdict, None);

        let step = session.submit_vessel("B-101").unwrap();
        assert_eq!(step.state, SessionState::Decided);
        let verdict = step.verdict.unwrap();
        assert_eq!(verdict.decision, Decision::Allowed);
        assert_eq!(verdict.severity, Some(Severity::Clear));

        let record = session.commit().unwrap();
        assert_eq!(record.vessel_id, "B-101");
        assert_eq!(record.driver_id, "D01");
        assert_eq!(record.issued_at, morning());
        assert_eq!(cp.ledger().trips_today("B-101", morning()).unwrap(), 1);
        assert_eq!(session.driver_id(), Some("D01"));
        assert_eq!(session.vessel_id(), Some("B-101"));
    }

    #[test]
    fn blocked_vessel_denied() {
        let cp = checkpoint();
        let session = decided(&cp, "D01", "B-104");

        let verdict = session.verdict().unwrap();
        assert_eq!(verdict.decision, Decision::Denied);
        assert_eq!(verdict.reason, ReasonCode::VesselNotActive);
        assert!(session.is_terminal());
    }

    #[test]
    fn vessel_under_repair_denied() {
        let cp = checkpoint();
        let session = decided(&cp, "D02", "B-103");
        assert_eq!(session.verdict().unwrap().reason, ReasonCode::VesselNotActive);
    }

    #[test]
    fn inactive_driver_aborts_before_vessel() {
        let cp = checkpoint();
        for driver in ["D03", "D04"] {
            let mut session = cp.begin();

            let step = session.submit_driver(driver).unwrap();

            assert_eq!(step.state, SessionState::Aborted);
            let verdict = step.verdict.unwrap();
            assert_eq!(verdict.decision, Decision::Denied);
            assert_eq!(verdict.reason, ReasonCode::DriverNotActive);
            assert!(matches!(
                session.submit_vessel("B-101").unwrap_err(),
                SessionError::Terminated
            ));
        }
    }

    #[test]
    fn unknown_credentials_abort() {
        let cp = checkpoint();

        let mut session = cp.begin();
        let err = session.submit_driver("D99").unwrap_err();
        assert!(matches!(
            err,
            SessionError::NotFound { kind: Credential::Driver, ref id } if id == "D99"
        ));
        assert_eq!(session.state(), SessionState::Aborted);

        let mut session = cp.begin();
        session.submit_driver("D01").unwrap();
        let err = session.submit_vessel("B-999").unwrap_err();
        assert!(matches!(
            err,
            SessionError::NotFound {
                kind: Credential::Vessel,
                ..
            }
        ));
        assert!(matches!(session.commit().unwrap_err(), SessionError::Terminated));
    }

    #[test]
    fn vessel_before_driver_is_invalid() {
        let cp = checkpoint();
        let mut session = cp.begin();

        let err = session.submit_vessel("B-101").unwrap_err();

        assert!(matches!(
            err,
            SessionError::InvalidState {
                state: SessionState::AwaitingDriver,
                ..
            }
        ));
        assert_eq!(session.state(), SessionState::Aborted);
        assert!(matches!(
            session.submit_driver("D01").unwrap_err(),
            SessionError::Terminated
        ));
        assert!(matches!(session.commit().unwrap_err(), SessionError::Terminated));
        assert_eq!(cp.ledger().trips_today("B-101", morning()).unwrap(), 0);
    }

    #[test]
    fn resubmitting_a_driver_aborts() {
        let cp = checkpoint();
        let mut session = cp.begin();
        session.submit_driver("D01").unwrap();

        assert!(matches!(
            session.submit_driver("D02").unwrap_err(),
            SessionError::InvalidState {
                state: SessionState::AwaitingVessel,
                ..
            }
        ));
        assert!(matches!(
            session.submit_vessel("B-101").unwrap_err(),
            SessionError::Terminated
        ));
        assert_eq!(session.vessel_id(), None);
    }

    #[test]
    fn resubmitting_a_vessel_forfeits_the_commit() {
        let cp = checkpoint();
        let mut session = decided(&cp, "D01", "B-101");

        assert!(matches!(
            session.submit_vessel("B-102").unwrap_err(),
            SessionError::InvalidState {
                state: SessionState::Decided,
                ..
            }
        ));
        assert_eq!(session.state(), SessionState::Aborted);
        assert!(matches!(session.commit().unwrap_err(), SessionError::Terminated));
        assert_eq!(cp.ledger().trips_today("B-101", morning()).unwrap(), 0);
    }

    #[test]
    fn commit_requires_a_decision() {
        let cp = checkpoint();
        let mut session = cp.begin();
        assert!(matches!(session.commit().unwrap_err(), SessionError::NotAuthorized));

        session.submit_driver("D01").unwrap();
        assert!(matches!(session.commit().unwrap_err(), SessionError::NotAuthorized));
    }

    #[test]
    fn denied_session_is_terminated() {
        let cp = checkpoint();
        let mut session = decided(&cp, "D01", "B-104");

        assert!(matches!(session.commit().unwrap_err(), SessionError::Terminated));
        assert!(matches!(
            session.submit_driver("D01").unwrap_err(),
            SessionError::Terminated
        ));
        assert_eq!(cp.ledger().trips_today("B-104", morning()).unwrap(), 0);
    }

    #[test]
    fn commit_is_idempotent() {
        let cp = checkpoint();
        let mut session = decided(&cp, "D01", "B-101");

        let first = session.commit().unwrap();
        let second = session.commit().unwrap();

        assert_eq!(first, second);
        assert_eq!(cp.ledger().trips_today("B-101", morning()).unwrap(), 1);
        assert_eq!(cp.ledger().trips_on(first.operating_day).unwrap().len(), 1);
        assert!(session.is_terminal());
        assert_eq!(session.trips_today(), Some(0));
        assert!(matches!(
            session.submit_vessel("B-101").unwrap_err(),
            SessionError::Terminated
        ));
    }

    #[test]
    fn last_trip_then_limit() {
        let ledger = Arc::new(InMemoryLedger::new(calendar(), 3));
        ledger.record("B-101", "D01", morning()).unwrap();
        ledger.record("B-101", "D01", morning()).unwrap();
        let cp = checkpoint_with(ledger, morning());

        let mut session = decided(&cp, "D01", "B-101");
        let verdict = session.verdict().unwrap();
        assert!(verdict.is_allowed());
        assert_eq!(verdict.severity, Some(Severity::Nearing));
        assert_eq!(session.trips_today(), Some(2));

        session.commit().unwrap();
        assert_eq!(cp.ledger().trips_today("B-101", morning()).unwrap(), 3);

        let next = decided(&cp, "D01", "B-101");
        let verdict = next.verdict().unwrap();
        assert_eq!(verdict.decision, Decision::Denied);
        assert_eq!(verdict.reason, ReasonCode::DailyLimitReached);
    }

    #[test]
    fn limit_resets_on_the_next_operating_day() {
        let ledger: Arc<dyn TripLedger> = Arc::new(InMemoryLedger::new(calendar(), 1));
        let today = checkpoint_with(Arc::clone(&ledger), morning());
        decided(&today, "D01", "B-101").commit().unwrap();
        assert_eq!(
            decided(&today, "D01", "B-101").verdict().unwrap().reason,
            ReasonCode::DailyLimitReached
        );

        let tomorrow = checkpoint_with(ledger, "2026-06-02T08:00:00Z".parse().unwrap());
        assert!(decided(&tomorrow, "D01", "B-101").verdict().unwrap().is_allowed());
    }

    #[test]
    fn commit_racing_a_full_ledger_asks_for_rescan() {
        let cp = checkpoint_with(Arc::new(InMemoryLedger::new(calendar(), 1)), morning());
        let mut first = decided(&cp, "D01", "B-101");
        let mut second = decided(&cp, "D02", "B-101");

        first.commit().unwrap();
        let err = second.commit().unwrap_err();

        assert!(matches!(err, SessionError::CapacityExceeded(_)));
        assert!(err.to_string().ends_with("please re-scan"));
        assert_eq!(second.state(), SessionState::Aborted);
        assert!(matches!(second.commit().unwrap_err(), SessionError::Terminated));
    }

    /// A ledger whose store is unreadable.
    struct UnreadableLedger(OperatingCalendar);

    impl TripLedger for UnreadableLedger {
        fn max_trips_per_day(&self) -> u32 {
            3
        }

        fn calendar(&self) -> &OperatingCalendar {
            &self.0
        }

        fn trips_today(&self, _vessel_id: &str, _as_of: Timestamp) -> crate::ledger::Result<u32> {
            Err(LedgerError::Poisoned)
        }

        fn record(
            &self,
            _vessel_id: &str,
            _driver_id: &str,
            _at: Timestamp,
        ) -> crate::ledger::Result<TripRecord> {
            Err(LedgerError::Poisoned)
        }

        fn trips_on(&self, _day: jiff::civil::Date) -> crate::ledger::Result<Vec<TripRecord>> {
            Err(LedgerError::Poisoned)
        }
    }

    #[test]
    fn ledger_failure_leaves_vessel_unrecorded() {
        let cp = checkpoint_with(Arc::new(UnreadableLedger(calendar())), morning());
        let mut session = cp.begin();
        session.submit_driver("D01").unwrap();

        let err = session.submit_vessel("B-101").unwrap_err();

        assert!(matches!(err, SessionError::Ledger(LedgerError::Poisoned)));
        assert_eq!(session.state(), SessionState::AwaitingVessel);
        assert_eq!(session.vessel_id(), None);
        assert!(cp.history().is_empty());
    }

    fn parallel_commits_admit_one(ledger: Arc<dyn TripLedger>) {
        ledger.record("B-101", "D01", morning()).unwrap();
        ledger.record("B-101", "D01", morning()).unwrap();
        let cp = checkpoint_with(ledger, morning());

        let n = 8;
        let mut sessions: Vec<_> = (0..n).map(|_| decided(&cp, "D01", "B-101")).collect();
        assert!(sessions.iter().all(|s| s.verdict().unwrap().is_allowed()));

        let barrier = Barrier::new(n);
        let results: Vec<_> = thread::scope(|scope| {
            let barrier = &barrier;
            let handles: Vec<_> = sessions
                .iter_mut()
                .map(|s| {
                    scope.spawn(move || {
                        barrier.wait();
                        s.commit()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let capped = results
            .iter()
            .filter(|r| matches!(r, Err(SessionError::CapacityExceeded(_))))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(capped, n - 1);
        assert_eq!(cp.ledger().trips_today("B-101", morning()).unwrap(), 3);
    }

    #[test]
    fn parallel_commits_admit_one_in_memory() {
        parallel_commits_admit_one(Arc::new(InMemoryLedger::new(calendar(), 3)));
    }

    #[test]
    fn parallel_commits_admit_one_sqlite() {
        parallel_commits_admit_one(Arc::new(SqliteLedger::in_memory(calendar(), 3).unwrap()));
    }
}
