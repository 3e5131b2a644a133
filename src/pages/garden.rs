use std::time::Duration;

use tracing::Span;

use crate::common::Result;
use crate::webdriver::{Driver, Locator};

use super::PageBase;

pub const GARDEN_HEADING: Locator =
    Locator::ui_automator(r#"new UiSelector().description("Garden")"#);
pub const PLACEHOLDER: Locator =
    Locator::ui_automator(r#"new UiSelector().description("Placeholder")"#);

/// Every saved plant
pub struct GardenPage<'a> {
    base: PageBase<'a>,
}

impl<'a> GardenPage<'a> {
    pub fn new(driver: &'a dyn Driver, parent: &Span) -> Self {
        Self {
            base: PageBase::new(driver, parent, "Garden"),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            base: self.base.with_timeout(timeout),
        }
    }

    pub async fn confirm_ready(&self) -> Result<()> {
        self.base.wait.for_element_to_be_visible(&GARDEN_HEADING).await
    }

    /// Fails with the remote "no such element" error if the plant is missing
    pub async fn verify_plant(&self, name: &str) -> Result<()> {
        let locator = Locator::description_contains(name);
        self.base.driver.find_element(&locator).await?;
        tracing::info!(parent: &self.base.span, plant = name, "Plant found in garden");
        Ok(())
    }

    pub async fn has_plant(&self, name: &str) -> Result<bool> {
        match self.verify_plant(name).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_no_such_element() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
