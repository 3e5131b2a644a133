//! Device-level operations: screenshots, app lifecycle, contexts, permissions

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::Span;

use crate::common::{Error, Result};
use crate::webdriver::{Driver, NATIVE_CONTEXT};

/// Time given to the app to shut down before it is relaunched
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

const SCREENSHOT_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.3f";

pub struct Device<'a> {
    driver: &'a dyn Driver,
    package: &'a str,
    output_dir: &'a Path,
    settle_delay: Duration,
    span: Span,
}

impl<'a> Device<'a> {
    pub fn new(driver: &'a dyn Driver, package: &'a str, output_dir: &'a Path, span: Span) -> Self {
        Self {
            driver,
            package,
            output_dir,
            settle_delay: DEFAULT_SETTLE_DELAY,
            span,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Save the current screen as a timestamped PNG in the output dir
    pub async fn screenshot(&self) -> Result<PathBuf> {
        let name = format!("screenshot_{}.png", Utc::now().format(SCREENSHOT_FORMAT));
        let path = self.output_dir.join(name);

        self.capture(&path).await.map_err(|e| {
            tracing::error!(parent: &self.span, error = %e, "Screenshot failed");
            Error::screenshot(e)
        })?;

        tracing::info!(parent: &self.span, path = %path.display(), "Screenshot saved");
        Ok(path)
    }

    async fn capture(&self, path: &Path) -> Result<()> {
        let png = self.driver.screenshot_png().await?;
        tokio::fs::write(path, png)
            .await
            .map_err(|error| Error::FileWrite {
                path: path.to_path_buf(),
                error,
            })
    }

    /// Terminate and relaunch the app under test
    pub async fn refresh_app_instance(&self) -> Result<()> {
        tracing::info!(parent: &self.span, package = self.package, "Refreshing app");
        self.restart()
            .await
            .map_err(|e| Error::app_refresh(self.package, e))
    }

    async fn restart(&self) -> Result<()> {
        self.driver.terminate_app(self.package).await?;
        tokio::time::sleep(self.settle_delay).await;
        self.driver.activate_app(self.package).await
    }

    pub async fn switch_context(&self, context: &str) -> Result<()> {
        tracing::info!(parent: &self.span, context, "Switching context");
        self.driver
            .set_context(context)
            .await
            .map_err(|e| Error::context_switch(context, e))
    }

    pub async fn switch_to_native(&self) -> Result<()> {
        self.switch_context(NATIVE_CONTEXT).await
    }

    /// Switch to the app's webview (`WEBVIEW_<package>`)
    pub async fn switch_to_webview(&self) -> Result<()> {
        let wanted = format!("WEBVIEW_{}", self.package);
        let available = self.driver.contexts().await?;

        match available.iter().find(|name| name.contains(&wanted)) {
            Some(context) => self.switch_context(context).await,
            None => Err(Error::ContextNotFound { wanted, available }),
        }
    }

    pub async fn grant_all_permissions(&self) -> Result<()> {
        tracing::info!(parent: &self.span, package = self.package, "Granting all permissions");
        self.driver
            .execute_script(
                "mobile: changePermissions",
                json!({
                    "permissions": "all",
                    "appPackage": self.package,
                    "action": "grant",
                }),
            )
            .await?;
        Ok(())
    }
}
