//! Parcel tracker demo entry point.
//!
//! # Responsibility
//! - Walk one client's parcels through register, send, re-address and delete.
//! - Print each step so the status guard is visible from the terminal.
//!
//! Usage: `parcel_cli [DB_PATH]`. Without a path the demo runs in memory.
//! Set `PARCEL_LOG_DIR` (absolute) to enable file logging, and optionally
//! `PARCEL_LOG_LEVEL`.

use log::error;
use parcel_core::db::{open_db, open_db_in_memory};
use parcel_core::{
    core_version, default_log_level, init_logging, logging_status, ClientId, Parcel,
    ParcelRepository, ParcelService, SqliteParcelRepository,
};
use std::error::Error;
use std::process::ExitCode;

const DEMO_CLIENT: ClientId = 1;
const DEMO_ADDRESS: &str = "Pskov, Pushkin St 5";
const DEMO_NEW_ADDRESS: &str = "Saratov, Lenin Ave 3";

fn main() -> ExitCode {
    println!("parcel_core version={}", core_version());
    if let Err(err) = setup_logging() {
        eprintln!("logging disabled: {err}");
    }
    if let Some((level, log_dir)) = logging_status() {
        println!("logging level={level} dir={}", log_dir.display());
    }

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() -> Result<(), String> {
    let Ok(log_dir) = std::env::var("PARCEL_LOG_DIR") else {
        return Ok(());
    };
    let level =
        std::env::var("PARCEL_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
    init_logging(&level, &log_dir)
}

fn run(db_path: Option<String>) -> Result<(), Box<dyn Error>> {
    let conn = match db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = ParcelService::new(SqliteParcelRepository::try_new(&conn)?);

    let parcel = service.register(DEMO_CLIENT, DEMO_ADDRESS)?;
    println!(
        "registered parcel #{} for client {} at `{}` ({})",
        parcel.number, parcel.client, parcel.address, parcel.created_at
    );

    service.change_address(parcel.number, DEMO_NEW_ADDRESS)?;
    println!("parcel #{} re-addressed to `{DEMO_NEW_ADDRESS}`", parcel.number);

    if let Some(status) = service.next_status(parcel.number)? {
        println!("parcel #{} is now `{status}`", parcel.number);
    }
    print_client_parcels(&service)?;

    // Sent parcels keep their address and cannot be deleted.
    service.change_address(parcel.number, DEMO_ADDRESS)?;
    service.delete(parcel.number)?;
    let current = service.get(parcel.number)?;
    println!(
        "parcel #{} after late edits: status=`{}` address=`{}`",
        current.number, current.status, current.address
    );

    let spare = service.register(DEMO_CLIENT, DEMO_ADDRESS)?;
    service.delete(spare.number)?;
    println!("registered parcel #{} deleted", spare.number);
    print_client_parcels(&service)?;

    Ok(())
}

fn print_client_parcels<R: ParcelRepository>(
    service: &ParcelService<R>,
) -> Result<(), Box<dyn Error>> {
    let parcels = service.client_parcels(DEMO_CLIENT)?;
    println!("client {DEMO_CLIENT} has {} parcel(s):", parcels.len());
    for Parcel {
        number,
        status,
        address,
        created_at,
        ..
    } in &parcels
    {
        println!("  #{number} status=`{status}` address=`{address}` created_at={created_at}");
    }
    Ok(())
}
