//! Output formatting for CLI display.

use gatepass::{Decision, ReasonCode, Severity, Verdict};

/// The banner shown to the gate operator.
pub(super) fn format_decision(verdict: &Verdict) -> &'static str {
    match verdict.decision {
        Decision::Allowed => "SAIL ALLOWED",
        Decision::Denied => "SAIL DENIED",
    }
}

pub(super) fn format_reason(reason: ReasonCode) -> &'static str {
    match reason {
        ReasonCode::VesselNotActive => "vessel is not active",
        ReasonCode::DriverNotActive => "driver license is not active",
        ReasonCode::DailyLimitReached => "daily trip limit reached",
        ReasonCode::Clear => "clear",
    }
}

pub(super) fn format_severity(severity: Severity) -> &'static str {
    match severity {
        Severity::Clear => "first trip today",
        Severity::Active => "trips remaining",
        Severity::Nearing => "last trip today",
    }
}

/// `2/3 trips`.
pub(super) fn format_trips(taken: u32, max: u32) -> String {
    format!("{taken}/{max} trips")
}
