//! Verify command: one authorization session at the checkpoint.

use gatepass::{Checkpoint, PassKind, PassPayload, SessionError, SessionState, Verdict};

use super::format::{format_decision, format_reason, format_severity, format_trips};

pub(super) fn cmd_verify(
    checkpoint: &Checkpoint,
    driver_raw: &str,
    vessel_raw: &str,
    commit: bool,
) -> Result<(), String> {
    let driver_pass = PassPayload::decode(driver_raw)
        .and_then(|p| p.expect_kind(PassKind::DriverVerify))
        .map_err(|e| format!("driver card rejected: {e}"))?;
    let vessel_pass = PassPayload::decode(vessel_raw)
        .and_then(|p| p.expect_kind(PassKind::BoatSail))
        .map_err(|e| format!("sail pass rejected: {e}"))?;

    let mut session = checkpoint.begin();

    let step = session.submit_driver(&driver_pass.id).map_err(describe)?;
    if step.state == SessionState::Aborted {
        if let Some(verdict) = step.verdict {
            print_verdict(&verdict, &driver_pass, None);
        }
        return Ok(());
    }

    let step = session.submit_vessel(&vessel_pass.id).map_err(describe)?;
    let Some(verdict) = step.verdict else {
        return Err("no verdict reached".to_string());
    };
    let limit = checkpoint.ledger().max_trips_per_day();
    let taken = session.trips_today();
    print_verdict(&verdict, &driver_pass, Some((&vessel_pass, taken, limit)));

    if commit && verdict.is_allowed() {
        let record = session.commit().map_err(describe)?;
        let taken = checkpoint
            .ledger()
            .trips_today(&record.vessel_id, record.issued_at)
            .map_err(|e| format!("failed to read ledger: {e}"))?;
        println!(
            "Recorded:  {} on {}",
            format_trips(taken, limit),
            record.operating_day
        );
    }

    Ok(())
}

fn print_verdict(
    verdict: &Verdict,
    driver: &PassPayload,
    vessel: Option<(&PassPayload, Option<u32>, u32)>,
) {
    println!("{}", format_decision(verdict));
    println!("Driver:    {} ({})", driver.name, driver.id);
    if let Some((vessel, taken, limit)) = vessel {
        println!("Vessel:    {} ({})", vessel.name, vessel.id);
        if let Some(taken) = taken {
            println!("Today:     {}", format_trips(taken, limit));
        }
    }
    match verdict.severity {
        Some(severity) => println!("Status:    {}", format_severity(severity)),
        None => println!("Reason:    {}", format_reason(verdict.reason)),
    }
}

/// Operator-facing wording for session failures.
fn describe(e: SessionError) -> String {
    match e {
        SessionError::NotFound { kind, id } => format!("unknown credential: {kind} {id}"),
        other => other.to_string(),
    }
}
