//! Florae E2E - UI tests for the Florae plant tracker
//!
//! Drives the Android app through an Appium server, or through an in-process
//! simulator when no device is available.

use clap::Parser;
use commands::Commands;
use florae_e2e::{cli, commands};

#[derive(Parser)]
#[command(name = "florae-e2e", about = "UI test suite for the Florae Android app")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
