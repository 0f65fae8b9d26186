//! CLI smoke entry point.
//!
//! # Responsibility
//! - Build connection settings once at startup and open a unit of work.
//! - Print the core version and catalog sizes for quick sanity checks.
//!
//! Usage: `cosmo_cli [settings.toml]`

use cosmo_core::{
    core_version, default_log_level, init_logging, ConnectionSettings, Repository, UnitOfWork,
};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = init_logging(default_log_level(), None) {
        eprintln!("logging disabled: {err}");
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

fn run(settings_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match settings_path {
        Some(path) => ConnectionSettings::load(path)?,
        None => ConnectionSettings::default(),
    };

    let uow = UnitOfWork::open(&settings)?;
    println!("cosmo_core version={}", core_version());
    println!("planets={}", uow.planets().get_all()?.len());
    println!("stars={}", uow.stars().get_all()?.len());
    uow.close()?;
    Ok(())
}
