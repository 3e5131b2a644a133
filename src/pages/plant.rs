//! New/edit plant form

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::Span;

use crate::automation::{SeekDirection, DEFAULT_MAX_SWIPES};
use crate::common::Result;
use crate::webdriver::{Driver, Locator};

use super::PageBase;

pub const NEW_HEADING: Locator = super::home::NEW_HEADING;
pub const NAME_FIELD: Locator =
    Locator::ui_automator(r#"new UiSelector().className("android.widget.EditText").instance(0)"#);
pub const DESC_FIELD: Locator =
    Locator::ui_automator(r#"new UiSelector().className("android.widget.EditText").instance(1)"#);
pub const LOCATION_FIELD: Locator =
    Locator::ui_automator(r#"new UiSelector().className("android.widget.EditText").instance(2)"#);
pub const NAME_TEXT: Locator = Locator::ui_automator(
    r#"new UiSelector().className("android.view.View").instance(6).childSelector(className("android.widget.EditText").instance(0))"#,
);
pub const DESC_TEXT: Locator = Locator::ui_automator(
    r#"new UiSelector().className("android.view.View").instance(6).childSelector(className("android.widget.EditText").instance(1))"#,
);
pub const LOCATION_TEXT: Locator = Locator::ui_automator(
    r#"new UiSelector().className("android.view.View").instance(6).childSelector(className("android.widget.EditText").instance(2))"#,
);
pub const DAY_PLANTED: Locator =
    Locator::ui_automator(r#"new UiSelector().descriptionContains("Day planted")"#);
pub const DATE_PICKER_EDIT: Locator =
    Locator::ui_automator(r#"new UiSelector().className("android.widget.Button").instance(0)"#);
pub const DATE_PICKER_OK: Locator = Locator::ui_automator(r#"new UiSelector().description("OK")"#);
pub const SAVE_BUTTON: Locator = Locator::ui_automator(r#"new UiSelector().description("Save")"#);
pub const SAVE_BUTTON_XPATH: Locator =
    Locator::xpath(r#"//android.widget.Button[@content-desc="Save"]"#);

/// The three free-text fields of a plant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantDetails {
    pub name: String,
    pub desc: String,
    pub location: String,
}

impl PlantDetails {
    pub fn new(name: impl Into<String>, desc: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            location: location.into(),
        }
    }

    /// Keyed by field label: `Name`, `Desc`, `Location`
    pub fn labelled(&self) -> BTreeMap<&'static str, &str> {
        BTreeMap::from([
            ("Name", self.name.as_str()),
            ("Desc", self.desc.as_str()),
            ("Location", self.location.as_str()),
        ])
    }
}

pub struct PlantPage<'a> {
    base: PageBase<'a>,
}

impl<'a> PlantPage<'a> {
    pub fn new(driver: &'a dyn Driver, parent: &Span) -> Self {
        Self {
            base: PageBase::new(driver, parent, "Plant"),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            base: self.base.with_timeout(timeout),
        }
    }

    pub async fn confirm_ready(&self) -> Result<()> {
        self.base.wait.for_element_to_be_visible(&NEW_HEADING).await
    }

    pub async fn set_details(&self, name: &str, desc: &str, location: &str) -> Result<()> {
        let action = &self.base.action;
        action.fill(&NAME_FIELD, name).await?;
        action.fill(&DESC_FIELD, desc).await?;
        action.fill(&LOCATION_FIELD, location).await
    }

    pub async fn get_details(&self) -> Result<PlantDetails> {
        let action = &self.base.action;
        Ok(PlantDetails {
            name: action.get_element_text(&NAME_TEXT).await?,
            desc: action.get_element_text(&DESC_TEXT).await?,
            location: action.get_element_text(&LOCATION_TEXT).await?,
        })
    }

    /// Enter the planting date through the date picker, then save the plant
    pub async fn set_day_planted(&self, date: &str) -> Result<()> {
        let base = &self.base;
        tracing::info!(parent: &base.span, date, "Setting day planted");

        base.action
            .swipe_element_into_view(&DAY_PLANTED, SeekDirection::Down, DEFAULT_MAX_SWIPES)
            .await?;
        base.action.click(&DAY_PLANTED).await?;
        base.wait.for_element_to_be_clickable(&DATE_PICKER_EDIT).await?;
        base.action.click(&DATE_PICKER_EDIT).await?;
        base.action.send_keycodes(date).await?;
        base.action.send_enter_key().await?;
        base.action.click(&DATE_PICKER_OK).await?;
        base.wait.for_element_to_be_clickable(&SAVE_BUTTON).await?;
        base.action.click(&SAVE_BUTTON).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::HomePage;
    use crate::testing::simulator::Simulator;

    async fn open_form(sim: &Simulator) -> PlantPage<'_> {
        HomePage::new(sim, &Span::none()).open_add_plant().await.unwrap();
        PlantPage::new(sim, &Span::none())
    }

    #[test]
    fn test_labelled_details() {
        let details = PlantDetails::new("Tulips", "Very pretty!", "5th Floor Dungeon");
        let labelled = details.labelled();
        assert_eq!(labelled.len(), 3);
        assert_eq!(labelled["Name"], "Tulips");
        assert_eq!(labelled["Desc"], "Very pretty!");
        assert_eq!(labelled["Location"], "5th Floor Dungeon");
    }

    #[tokio::test]
    async fn test_details_round_trip() {
        let sim = Simulator::new();
        let page = open_form(&sim).await;
        page.confirm_ready().await.unwrap();

        page.set_details("Tulips", "Very pretty!", "5th Floor Dungeon")
            .await
            .unwrap();
        let details = page.get_details().await.unwrap();

        assert_eq!(
            details.labelled(),
            BTreeMap::from([
                ("Name", "Tulips"),
                ("Desc", "Very pretty!"),
                ("Location", "5th Floor Dungeon"),
            ])
        );
    }

    #[tokio::test]
    async fn test_set_day_planted_saves_plant() {
        let sim = Simulator::new();
        let page = open_form(&sim).await;
        page.set_details("Tulips", "Very pretty!", "5th Floor Dungeon")
            .await
            .unwrap();
        page.set_day_planted("06/01/2024").await.unwrap();

        let plants = sim.plants();
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].name, "Tulips");
        assert_eq!(plants[0].planted.as_deref(), Some("06/01/2024"));
    }

    #[tokio::test]
    async fn test_save_visible_by_xpath() {
        let sim = Simulator::new();
        let _page = open_form(&sim).await;
        assert!(sim.find_element(&SAVE_BUTTON_XPATH).await.is_ok());
    }
}
