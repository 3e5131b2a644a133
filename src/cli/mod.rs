//! CLI command handling
//!
//! Loads settings, picks the session target and hands scenarios to the runner.

use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;

use crate::commands::{Commands, TargetArgs};
use crate::common::paths::{self, OUTPUT_ROOT};
use crate::common::{logging, AppConfig, DeviceType, Error, OutputDir, Result};
use crate::testing::{
    run_all, scenarios, AppiumConnector, Connector, Scenario, ScriptedScenario,
    SimulatorConnector, TestCore,
};
use crate::webdriver::capabilities;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            target,
            scenarios: names,
            verbose,
        } => {
            let selected = scenarios::select(&names)?;
            run(target, &selected, verbose).await
        }

        Commands::Test {
            files,
            target,
            verbose,
        } => {
            let loaded = files
                .iter()
                .map(|path| {
                    ScriptedScenario::load(path).map(|s| Box::new(s) as Box<dyn Scenario>)
                })
                .collect::<Result<Vec<_>>>()?;
            run(target, &loaded, verbose).await
        }

        Commands::Capabilities { config, device } => {
            logging::init_cli(false);
            let config = load_config(config.as_deref(), device)?;
            let caps = capabilities::build(&config, &app_root()?);
            println!("{}", serde_json::to_string_pretty(&caps)?);
            Ok(())
        }

        Commands::List => {
            for scenario in scenarios::builtin() {
                println!(
                    "{:<16} {}",
                    scenario.name().bold(),
                    scenario.description().unwrap_or_default()
                );
            }
            Ok(())
        }
    }
}

async fn run(target: TargetArgs, scenarios: &[Box<dyn Scenario>], verbose: bool) -> Result<()> {
    let config = load_config(target.config.as_deref(), target.device)?;
    let capabilities = capabilities::build(&config, &app_root()?);

    let mut output = OutputDir::create(Path::new(OUTPUT_ROOT), config.env.debug)?;
    output.attach_log(logging::init_run(output.path(), verbose));

    let connector: Box<dyn Connector> = if target.simulate {
        Box::new(SimulatorConnector::new(&config.app.package))
    } else {
        Box::new(AppiumConnector::new(config.appium_url()))
    };

    let mut core = TestCore::new(config, capabilities, connector, output);
    if let Some(secs) = target.timeout {
        core = core.with_timeout(Duration::from_secs(secs));
    }

    let summary = run_all(core, scenarios, verbose).await?;

    if summary.all_passed() {
        Ok(())
    } else {
        Err(Error::TestFailure(format!(
            "{} of {} test(s) did not pass",
            summary.failed(),
            summary.results.len()
        )))
    }
}

fn load_config(explicit: Option<&Path>, device: Option<DeviceType>) -> Result<AppConfig> {
    let path = paths::resolve_config_path(explicit)?;
    let config = AppConfig::load(&path)?;
    tracing::debug!(path = %path.display(), "Loaded settings");

    Ok(match device {
        Some(device) => config.with_device(device),
        None => config,
    })
}

/// App packages are resolved against the working directory
fn app_root() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}
