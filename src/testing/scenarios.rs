//! Built-in test cases

use async_trait::async_trait;

use crate::automation::{SeekDirection, DEFAULT_MAX_SWIPES};
use crate::common::{Error, Result};
use crate::pages::{home, plant, PlantDetails};

use super::bootstrap::{Scenario, TestContext, Verdict};

/// Home screen loads, the add form opens and scrolls to the planting date
pub struct ElementSearch;

#[async_trait]
impl Scenario for ElementSearch {
    fn name(&self) -> &str {
        "element_search"
    }

    fn description(&self) -> Option<&str> {
        Some("Open the app, navigate to Add Plant and find Day planted")
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<Verdict> {
        let wait = ctx.wait();
        let action = ctx.action();

        wait.for_element_to_be_visible(&home::TODAY_HEADING).await?;
        action.click(&home::ADD_PLANT_BUTTON).await?;
        wait.for_element_to_be_visible(&plant::SAVE_BUTTON_XPATH).await?;
        action
            .swipe_element_into_view(&plant::DAY_PLANTED, SeekDirection::Down, DEFAULT_MAX_SWIPES)
            .await?;

        Ok(Verdict::Passed)
    }
}

/// Add a plant through the form and find it in the garden
pub struct CreatePlant {
    pub details: PlantDetails,
    pub planted: String,
}

impl Default for CreatePlant {
    fn default() -> Self {
        Self {
            details: PlantDetails::new("Tulips", "Very pretty!", "5th Floor Dungeon"),
            planted: "06/01/2024".to_string(),
        }
    }
}

#[async_trait]
impl Scenario for CreatePlant {
    fn name(&self) -> &str {
        "create_plant"
    }

    fn description(&self) -> Option<&str> {
        Some("Create a plant and verify it appears in the garden")
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<Verdict> {
        let home = ctx.home();
        home.confirm_ready().await?;
        home.open_add_plant().await?;

        let form = ctx.plant();
        let wanted = &self.details;
        form.set_details(&wanted.name, &wanted.desc, &wanted.location)
            .await?;

        let entered = form.get_details().await?;
        if entered != *wanted {
            return Ok(Verdict::Failed(format!(
                "Form shows {:?}, expected {:?}",
                entered.labelled(),
                wanted.labelled()
            )));
        }

        form.set_day_planted(&self.planted).await?;

        home.open_garden().await?;
        let garden = ctx.garden();
        garden.confirm_ready().await?;

        let found = garden.has_plant(&wanted.name).await?;
        Ok(Verdict::check(found, || {
            format!("Plant '{}' not found in garden", wanted.name)
        }))
    }
}

/// Restart the app and land on the home screen again
pub struct RefreshApp;

#[async_trait]
impl Scenario for RefreshApp {
    fn name(&self) -> &str {
        "refresh_app"
    }

    fn description(&self) -> Option<&str> {
        Some("Terminate and relaunch the app")
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<Verdict> {
        ctx.device().refresh_app_instance().await?;
        ctx.home().confirm_ready().await?;
        Ok(Verdict::Passed)
    }
}

/// Every built-in scenario, in run order
pub fn builtin() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(ElementSearch),
        Box::new(CreatePlant::default()),
        Box::new(RefreshApp),
    ]
}

/// Built-in scenarios by name, in the order given
pub fn select(names: &[String]) -> Result<Vec<Box<dyn Scenario>>> {
    if names.is_empty() {
        return Ok(builtin());
    }

    names
        .iter()
        .map(|name| {
            builtin()
                .into_iter()
                .find(|s| s.name() == name)
                .ok_or_else(|| Error::UnknownScenario {
                    name: name.clone(),
                    available: names_of(&builtin()).join(", "),
                })
        })
        .collect()
}

fn names_of(scenarios: &[Box<dyn Scenario>]) -> Vec<&str> {
    scenarios.iter().map(|s| s.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert_eq!(
            names_of(&builtin()),
            ["element_search", "create_plant", "refresh_app"]
        );
    }

    #[test]
    fn test_select_by_name() {
        let picked = select(&["refresh_app".into(), "element_search".into()]).unwrap();
        assert_eq!(names_of(&picked), ["refresh_app", "element_search"]);
        assert_eq!(select(&[]).unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_name() {
        match select(&["nope".into()]) {
            Err(Error::UnknownScenario { name, available }) => {
                assert_eq!(name, "nope");
                assert!(available.contains("create_plant"));
            }
            Err(e) => panic!("Expected UnknownScenario, got {e:?}"),
            Ok(_) => panic!("Expected UnknownScenario"),
        }
    }
}
