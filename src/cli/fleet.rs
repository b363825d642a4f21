//! Fleet commands: vessels with today's trip counts, and drivers.

use clap::Subcommand;

use gatepass::{Checkpoint, Fleet};

use super::format::format_trips;

#[derive(Debug, Subcommand)]
pub enum FleetCommand {
    /// List vessels with their status and trips taken today.
    Vessels,

    /// List drivers.
    Drivers {
        /// Filter by name, license number, or phone.
        #[arg(long)]
        search: Option<String>,
    },
}

pub(super) fn cmd_vessels(fleet: &Fleet, checkpoint: &Checkpoint) -> Result<(), String> {
    let ledger = checkpoint.ledger();
    let now = checkpoint.now();

    for v in fleet.vessels() {
        let status = v.operational_status.label();
        let trips = if v.is_active() {
            let taken = ledger
                .trips_today(&v.id, now)
                .map_err(|e| format!("failed to read ledger: {e}"))?;
            format_trips(taken, ledger.max_trips_per_day())
        } else {
            "-".to_string()
        };
        let owner = v.owner.as_deref().unwrap_or("-");
        println!(
            "{:<8} {:<18} [{status}]  {} seats  {trips}  {owner}",
            v.id, v.name, v.capacity
        );
    }

    Ok(())
}

pub(super) fn cmd_drivers(fleet: &Fleet, search: Option<&str>) -> Result<(), String> {
    let drivers: Vec<_> = match search {
        Some(q) => fleet.search_drivers(q).collect(),
        None => fleet.drivers().collect(),
    };

    if drivers.is_empty() {
        println!("No drivers");
        return Ok(());
    }

    for d in drivers {
        let boat = d
            .assigned_vessel_id
            .as_deref()
            .and_then(|id| fleet.vessels().find(|v| v.id == id))
            .map_or("-", |v| v.name.as_str());
        println!(
            "{:<5} {:<16} {:<14} [{}]  {boat}",
            d.id,
            d.name,
            d.license_number,
            d.license_status.label()
        );
    }

    Ok(())
}
