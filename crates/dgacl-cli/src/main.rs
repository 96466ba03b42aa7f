//! dgacl
//!
//! Manage users, groups and predicate permissions of a cluster.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use dgacl_cli::{Cli, Dispatcher, Report};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dgacl_cli::logging::init(cli.global.verbose);

    match run(&cli).await {
        Ok(report) => {
            println!("{}", report.message);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<dgacl_cli::Error>()
                .map_or(1, dgacl_cli::Error::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: &Cli) -> Result<Report> {
    let report = Dispatcher::from_process_env().dispatch(cli).await?;
    Ok(report)
}
