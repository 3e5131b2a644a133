//! Test bootstrap
//!
//! Opens one session per test, hands the body a context of helpers and
//! pages, and turns the outcome into a `TestResult`. The session is always
//! closed, and a failing test leaves a screenshot in the output folder.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Span;

use crate::automation::{device::DEFAULT_SETTLE_DELAY, wait::DEFAULT_TIMEOUT};
use crate::automation::{Action, Device, Wait};
use crate::common::{AppConfig, Error, OutputDir, Result};
use crate::pages::{GardenPage, HomePage, PlantPage};
use crate::webdriver::{AppiumClient, Capabilities, Driver};

use super::simulator::Simulator;

/// Explicit outcome of a test body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// Assertion-level failure with a human-readable reason
    Failed(String),
}

impl Verdict {
    /// `Passed` if `condition` holds, otherwise `Failed` with the reason
    pub fn check(condition: bool, reason: impl FnOnce() -> String) -> Self {
        if condition {
            Verdict::Passed
        } else {
            Verdict::Failed(reason())
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// Why a test did not pass
#[derive(Debug)]
pub enum Failure {
    /// The body returned `Verdict::Failed`
    Verdict(String),
    /// Session setup or the body failed with an error
    Error(Error),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Verdict(reason) => write!(f, "{}", reason),
            Failure::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Result of a single test
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub error: Option<Failure>,
    pub screenshot: Option<PathBuf>,
    pub duration: Duration,
}

/// A test body
#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<Verdict>;
}

/// Opens sessions for the bootstrap
#[async_trait]
pub trait Connector: Send + Sync {
    /// Where sessions are opened, for logs and reports
    fn target(&self) -> String;

    async fn connect(&self, capabilities: &Capabilities) -> Result<Box<dyn Driver>>;
}

/// Sessions on a live Appium server
pub struct AppiumConnector {
    url: String,
}

impl AppiumConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for AppiumConnector {
    fn target(&self) -> String {
        self.url.clone()
    }

    async fn connect(&self, capabilities: &Capabilities) -> Result<Box<dyn Driver>> {
        let client = AppiumClient::connect(&self.url, capabilities).await?;
        Ok(Box::new(client))
    }
}

/// Sessions on an in-process simulated device
pub struct SimulatorConnector {
    device: Simulator,
}

impl SimulatorConnector {
    pub fn new(package: &str) -> Self {
        Self {
            device: Simulator::with_package(package),
        }
    }

    /// The shared device, for inspecting state after a run
    pub fn device(&self) -> &Simulator {
        &self.device
    }
}

#[async_trait]
impl Connector for SimulatorConnector {
    fn target(&self) -> String {
        "simulator".to_string()
    }

    async fn connect(&self, capabilities: &Capabilities) -> Result<Box<dyn Driver>> {
        let package = self.device.package();
        let requested = capabilities.get("appPackage").and_then(|v| v.as_str());
        if let Some(requested) = requested {
            if requested != package {
                return Err(Error::SessionNotCreated {
                    url: self.target(),
                    message: format!("App '{}' is not installed", requested),
                });
            }
        }
        Ok(Box::new(self.device.new_session()))
    }
}

/// Everything a test body can use during one session
pub struct TestContext<'a> {
    driver: &'a dyn Driver,
    config: &'a AppConfig,
    output_dir: &'a Path,
    span: Span,
    timeout: Duration,
    settle_delay: Duration,
}

impl<'a> TestContext<'a> {
    pub fn new(
        driver: &'a dyn Driver,
        config: &'a AppConfig,
        output_dir: &'a Path,
        span: Span,
    ) -> Self {
        Self {
            driver,
            config,
            output_dir,
            span,
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn driver(&self) -> &'a dyn Driver {
        self.driver
    }

    pub fn config(&self) -> &'a AppConfig {
        self.config
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn wait(&self) -> Wait<'a> {
        Wait::new(self.driver, self.span.clone()).with_timeout(self.timeout)
    }

    /// Wait with a timeout other than the run's default
    pub fn wait_for(&self, timeout: Duration) -> Wait<'a> {
        Wait::new(self.driver, self.span.clone()).with_timeout(timeout)
    }

    pub fn action(&self) -> Action<'a> {
        Action::new(self.driver, self.span.clone())
    }

    pub fn device(&self) -> Device<'a> {
        Device::new(
            self.driver,
            &self.config.app.package,
            self.output_dir,
            self.span.clone(),
        )
        .with_settle_delay(self.settle_delay)
    }

    pub fn home(&self) -> HomePage<'a> {
        HomePage::new(self.driver, &self.span).with_timeout(self.timeout)
    }

    pub fn plant(&self) -> PlantPage<'a> {
        PlantPage::new(self.driver, &self.span).with_timeout(self.timeout)
    }

    pub fn garden(&self) -> GardenPage<'a> {
        GardenPage::new(self.driver, &self.span).with_timeout(self.timeout)
    }
}

/// Runs tests against sessions from one connector, within one output folder
pub struct TestCore {
    config: AppConfig,
    capabilities: Capabilities,
    connector: Box<dyn Connector>,
    output: OutputDir,
    timeout: Duration,
    settle_delay: Duration,
}

impl TestCore {
    pub fn new(
        config: AppConfig,
        capabilities: Capabilities,
        connector: Box<dyn Connector>,
        output: OutputDir,
    ) -> Self {
        Self {
            config,
            capabilities,
            connector,
            output,
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Default timeout for waits and page checks
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn output(&self) -> &OutputDir {
        &self.output
    }

    pub fn target(&self) -> String {
        self.connector.target()
    }

    /// Run one test in a fresh session
    pub async fn run_test(&self, scenario: &dyn Scenario) -> TestResult {
        let started = Instant::now();
        let span = tracing::info_span!("test", name = scenario.name());
        tracing::info!(parent: &span, target = %self.connector.target(), "Starting test");

        let driver = match self.connector.connect(&self.capabilities).await {
            Ok(driver) => driver,
            Err(e) => {
                tracing::error!(parent: &span, error = %e, "Could not open session");
                return TestResult {
                    name: scenario.name().to_string(),
                    passed: false,
                    error: Some(Failure::Error(e)),
                    screenshot: None,
                    duration: started.elapsed(),
                };
            }
        };

        let ctx = TestContext::new(
            driver.as_ref(),
            &self.config,
            self.output.path(),
            span.clone(),
        )
        .with_timeout(self.timeout)
        .with_settle_delay(self.settle_delay);

        let error = match scenario.run(&ctx).await {
            Ok(Verdict::Passed) => None,
            Ok(Verdict::Failed(reason)) => {
                tracing::warn!(parent: &span, %reason, "Test failed");
                Some(Failure::Verdict(reason))
            }
            Err(e) => {
                tracing::error!(parent: &span, error = %e, "Test aborted");
                Some(Failure::Error(e))
            }
        };

        let screenshot = match error {
            Some(_) => capture_best_effort(&ctx).await,
            None => None,
        };

        if let Err(e) = driver.quit().await {
            tracing::warn!(parent: &span, error = %e, "Failed to close session");
        }

        let passed = error.is_none();
        tracing::info!(
            parent: &span,
            passed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished test"
        );

        TestResult {
            name: scenario.name().to_string(),
            passed,
            error,
            screenshot,
            duration: started.elapsed(),
        }
    }

    /// Close out the output folder; see `OutputDir::finish`
    pub fn finish(self, passed: bool) -> Result<Option<PathBuf>> {
        self.output.finish(passed)
    }
}

async fn capture_best_effort(ctx: &TestContext<'_>) -> Option<PathBuf> {
    match ctx.device().screenshot().await {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(parent: ctx.span(), error = %e, "No screenshot for failed test");
            None
        }
    }
}
