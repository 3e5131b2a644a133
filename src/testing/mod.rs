//! Test bootstrap, scenarios and runner
//!
//! Built-in scenarios and YAML-defined ones run through the same
//! bootstrap, either against an Appium server or the in-process simulator.

pub mod bootstrap;
pub mod config;
pub mod runner;
pub mod scenarios;
pub mod script;
pub mod simulator;

pub use bootstrap::{
    AppiumConnector, Connector, Failure, Scenario, SimulatorConnector, TestContext, TestCore,
    TestResult, Verdict,
};
pub use config::{TestScenario, TestStep};
pub use runner::{run_all, RunSummary};
pub use script::ScriptedScenario;
