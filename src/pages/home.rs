use std::time::Duration;

use tracing::Span;

use crate::common::Result;
use crate::webdriver::{Driver, Locator};

use super::PageBase;

pub const TODAY_HEADING: Locator = Locator::ui_automator(r#"new UiSelector().description("Today")"#);
pub const ADD_PLANT_BUTTON: Locator =
    Locator::ui_automator(r#"new UiSelector().className("android.widget.Button").instance(3)"#);
pub const NEW_HEADING: Locator = Locator::ui_automator(r#"new UiSelector().description("New")"#);
pub const GARDEN_TAB: Locator = Locator::ui_automator(
    r#"new UiSelector().className("android.widget.Button").descriptionContains("Garden")"#,
);

/// Landing screen listing today's care tasks
pub struct HomePage<'a> {
    base: PageBase<'a>,
}

impl<'a> HomePage<'a> {
    pub fn new(driver: &'a dyn Driver, parent: &Span) -> Self {
        Self {
            base: PageBase::new(driver, parent, "Home"),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            base: self.base.with_timeout(timeout),
        }
    }

    pub async fn confirm_ready(&self) -> Result<()> {
        self.base.wait.for_element_to_be_visible(&TODAY_HEADING).await
    }

    /// Open the new-plant form
    pub async fn open_add_plant(&self) -> Result<()> {
        let base = &self.base;
        base.wait.for_element_to_be_clickable(&ADD_PLANT_BUTTON).await?;
        let button = base.driver.find_element(&ADD_PLANT_BUTTON).await?;
        base.driver.click(&button).await?;
        base.wait.for_element_to_be_visible(&NEW_HEADING).await
    }

    /// Switch to the garden tab
    pub async fn open_garden(&self) -> Result<()> {
        let base = &self.base;
        base.wait.for_element_to_be_clickable(&GARDEN_TAB).await?;
        base.action.click(&GARDEN_TAB).await?;
        base.wait
            .for_element_to_be_visible(&super::garden::GARDEN_HEADING)
            .await
    }
}
