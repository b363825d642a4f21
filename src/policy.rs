//! Eligibility policy: may this driver take this vessel out again today?
//!
//! Pure functions over their inputs. The session feeds them the directory
//! records and the ledger's count; nothing here touches storage or the clock.

use serde::{Deserialize, Serialize};

use crate::model::{Driver, Vessel};

/// Daily trip cap applied when configuration does not override it.
pub const DEFAULT_MAX_TRIPS_PER_DAY: u32 = 3;

/// The outcome of an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub decision: Decision,
    pub reason: ReasonCode,

    /// Advisory tier for display. Present only when allowed.
    pub severity: Option<Severity>,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allowed
    }

    fn denied(reason: ReasonCode) -> Self {
        Self {
            decision: Decision::Denied,
            reason,
            severity: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    Allowed,
    Denied,
}

/// Machine-readable reason behind a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReasonCode {
    /// Vessel is under repair or blocked.
    VesselNotActive,

    /// Driver's license is pending or blocked.
    DriverNotActive,

    /// The vessel already used every trip allowed for the operating day.
    DailyLimitReached,

    /// Nothing stands in the way.
    Clear,
}

/// How close an allowed vessel is to its daily cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// First trip of the day.
    Clear,

    /// Some trips taken, more than one left.
    Active,

    /// This is the last trip the vessel may take today.
    Nearing,
}

/// Decides whether `driver` may sail `vessel` given the trips already taken today.
///
/// Checks apply in order and the first failing one wins:
/// vessel status, then driver license, then the daily cap.
pub fn evaluate(
    vessel: &Vessel,
    driver: &Driver,
    trips_today: u32,
    max_trips_per_day: u32,
) -> Verdict {
    if !vessel.is_active() {
        return Verdict::denied(ReasonCode::VesselNotActive);
    }
    if let Some(verdict) = evaluate_driver(driver) {
        return verdict;
    }
    if trips_today >= max_trips_per_day {
        return Verdict::denied(ReasonCode::DailyLimitReached);
    }
    Verdict {
        decision: Decision::Allowed,
        reason: ReasonCode::Clear,
        severity: Some(severity(trips_today, max_trips_per_day)),
    }
}

/// The driver-only part of [`evaluate`], usable before a vessel is known.
///
/// Returns the denial, or `None` when the driver may proceed.
pub fn evaluate_driver(driver: &Driver) -> Option<Verdict> {
    (!driver.is_active()).then(|| Verdict::denied(ReasonCode::DriverNotActive))
}

/// Advisory tier for a vessel that is still under its cap.
pub fn severity(trips_today: u32, max_trips_per_day: u32) -> Severity {
    if trips_today == 0 {
        Severity::Clear
    } else if max_trips_per_day.checked_sub(1) == Some(trips_today) {
        Severity::Nearing
    } else {
        Severity::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{LicenseStatus, OperationalStatus};

    fn vessel(status: OperationalStatus) -> Vessel {
        Vessel {
            id: "B-101".into(),
            name: "Ganga Rider 1".into(),
            capacity: 6,
            operational_status: status,
            owner: None,
        }
    }

    fn driver(status: LicenseStatus) -> Driver {
        Driver {
            id: "D01".into(),
            name: "Ramesh Kumar".into(),
            license_number: "UK07-202201".into(),
            license_status: status,
            assigned_vessel_id: None,
            phone: None,
        }
    }

    #[test]
    fn inactive_vessel_denied_at_any_trip_count() {
        let d = driver(LicenseStatus::Active);
        for status in [OperationalStatus::UnderRepair, OperationalStatus::Blocked] {
            for trips in 0..6 {
                let verdict = evaluate(&vessel(status), &d, trips, 3);
                assert_eq!(verdict.decision, Decision::Denied);
                assert_eq!(verdict.reason, ReasonCode::VesselNotActive);
                assert_eq!(verdict.severity, None);
            }
        }
    }

    #[test]
    fn vessel_check_precedes_driver_check() {
        let verdict = evaluate(
            &vessel(OperationalStatus::Blocked),
            &driver(LicenseStatus::Blocked),
            5,
            3,
        );
        assert_eq!(verdict.reason, ReasonCode::VesselNotActive);
    }

    #[test]
    fn inactive_driver_denied_before_limit() {
        for status in [LicenseStatus::Pending, LicenseStatus::Blocked] {
            let verdict = evaluate(&vessel(OperationalStatus::Active), &driver(status), 3, 3);
            assert_eq!(verdict.reason, ReasonCode::DriverNotActive);
        }
    }

    #[test]
    fn at_or_over_limit_denied() {
        let v = vessel(OperationalStatus::Active);
        let d = driver(LicenseStatus::Active);
        for trips in 3..8 {
            let verdict = evaluate(&v, &d, trips, 3);
            assert_eq!(verdict.decision, Decision::Denied);
            assert_eq!(verdict.reason, ReasonCode::DailyLimitReached);
        }
    }

    #[test]
    fn one_below_limit_is_allowed_and_nearing() {
        let verdict = evaluate(
            &vessel(OperationalStatus::Active),
            &driver(LicenseStatus::Active),
            2,
            3,
        );
        assert!(verdict.is_allowed());
        assert_eq!(verdict.reason, ReasonCode::Clear);
        assert_eq!(verdict.severity, Some(Severity::Nearing));
    }

    #[test]
    fn severity_tiers() {
        assert_eq!(severity(0, 3), Severity::Clear);
        assert_eq!(severity(1, 3), Severity::Active);
        assert_eq!(severity(2, 3), Severity::Nearing);
        assert_eq!(severity(2, 5), Severity::Active);
        assert_eq!(severity(4, 5), Severity::Nearing);
    }

    #[test]
    fn single_trip_cap_starts_clear() {
        // With one trip a day, zero trips is both "first" and "last"; first wins.
        assert_eq!(severity(0, 1), Severity::Clear);
    }

    #[test]
    fn zero_cap_denies_everything() {
        let verdict = evaluate(
            &vessel(OperationalStatus::Active),
            &driver(LicenseStatus::Active),
            0,
            0,
        );
        assert_eq!(verdict.reason, ReasonCode::DailyLimitReached);
    }

    #[test]
    fn driver_only_check() {
        assert_eq!(evaluate_driver(&driver(LicenseStatus::Active)), None);
        let verdict = evaluate_driver(&driver(LicenseStatus::Pending)).unwrap();
        assert_eq!(verdict.decision, Decision::Denied);
        assert_eq!(verdict.reason, ReasonCode::DriverNotActive);
    }
}
