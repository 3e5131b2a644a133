//! CLI command definitions
//!
//! Defines the clap commands for the test suite CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::DeviceType;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the built-in test cases
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Run only the named test case (repeatable, default: all)
        /// e.g. --scenario create_plant --scenario refresh_app
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Show debug-level output on the console
        #[arg(long, short)]
        verbose: bool,
    },

    /// Run scenarios defined in YAML files
    Test {
        /// Scenario files to run, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,

        /// Show debug-level output on the console
        #[arg(long, short)]
        verbose: bool,
    },

    /// Print the session capabilities for the configured device
    #[command(alias = "caps")]
    Capabilities {
        /// Settings file (default: ./config.toml)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Override the connected device type (PHYSICAL, WIFI, VIRTUAL)
        #[arg(long, short)]
        device: Option<DeviceType>,
    },

    /// List the built-in test cases
    #[command(alias = "ls")]
    List,
}

/// Where and how a run connects
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Settings file (default: ./config.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Override the connected device type (PHYSICAL, WIFI, VIRTUAL)
    #[arg(long, short)]
    pub device: Option<DeviceType>,

    /// Drive the in-process simulator instead of an Appium server
    #[arg(long)]
    pub simulate: bool,

    /// Default wait timeout in seconds
    #[arg(long, short)]
    pub timeout: Option<u64>,
}
