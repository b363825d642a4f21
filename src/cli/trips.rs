//! Trips command: what left the checkpoint on an operating day.

use jiff::civil::Date;

use gatepass::{Checkpoint, Fleet, VesselRepository};

pub(super) fn cmd_trips(
    fleet: &Fleet,
    checkpoint: &Checkpoint,
    date: Option<&str>,
) -> Result<(), String> {
    let ledger = checkpoint.ledger();
    let calendar = ledger.calendar();
    let day = match date {
        Some(s) => s
            .parse::<Date>()
            .map_err(|e| format!("invalid date '{s}': {e}"))?,
        None => calendar.operating_day(checkpoint.now()),
    };

    let trips = ledger
        .trips_on(day)
        .map_err(|e| format!("failed to read ledger: {e}"))?;

    if trips.is_empty() {
        println!("No trips on {day}");
        return Ok(());
    }

    for t in &trips {
        let time = t.issued_at.to_zoned(calendar.timezone().clone());
        let vessel = fleet
            .get_vessel(&t.vessel_id)
            .map_or_else(|| t.vessel_id.clone(), |v| v.name);
        println!(
            "{}  {:<8} {:<18} {}",
            time.strftime("%H:%M"),
            t.vessel_id,
            vessel,
            t.driver_id
        );
    }
    println!("{} trip(s) on {day}", trips.len());

    Ok(())
}
