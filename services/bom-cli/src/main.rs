use anyhow::Result;
use clap::Parser;
use multibom_models::BomError;
use multibom_utils::init_logging;
use std::process::ExitCode;
use tracing::info;

mod cli;

use cli::{run, Cli, Report};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(report) => {
            for path in &report.written {
                println!("{}", path.display());
            }
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "multibom failed");
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn execute(cli: &Cli) -> Result<Report> {
    let config = cli.load_config()?;

    init_logging(&config.logging)?;
    info!(path = %cli.path.display(), "Starting multibom");

    run(cli, &config)
}

/// Exit status for a failed run; anything that is not a [`BomError`] is 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<BomError>()
        .map(BomError::exit_code)
        .unwrap_or(1)
}
