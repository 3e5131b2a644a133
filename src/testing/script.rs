//! YAML-defined scenarios
//!
//! Each step maps onto a helper call. Text assertions produce a failed
//! verdict; every other problem is an error that aborts the test.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::automation::DEFAULT_MAX_SWIPES;
use crate::common::Result;

use super::bootstrap::{Scenario, TestContext, Verdict};
use super::config::{ContextTarget, HardwareKey, TestScenario, TestStep};

pub struct ScriptedScenario {
    scenario: TestScenario,
}

impl ScriptedScenario {
    pub fn new(scenario: TestScenario) -> Self {
        Self { scenario }
    }

    pub fn load(path: &Path) -> Result<Self> {
        TestScenario::load(path).map(Self::new)
    }

    pub fn steps(&self) -> &[TestStep] {
        &self.scenario.steps
    }
}

#[async_trait]
impl Scenario for ScriptedScenario {
    fn name(&self) -> &str {
        &self.scenario.name
    }

    fn description(&self) -> Option<&str> {
        self.scenario.description.as_deref()
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<Verdict> {
        let total = self.scenario.steps.len();

        for (i, step) in self.scenario.steps.iter().enumerate() {
            let step_num = i + 1;
            tracing::info!(parent: ctx.span(), step = step_num, total, ?step, "Running step");

            if let Verdict::Failed(reason) = execute_step(ctx, step).await? {
                return Ok(Verdict::Failed(format!("Step {}: {}", step_num, reason)));
            }
        }

        Ok(Verdict::Passed)
    }
}

/// Execute a single test step
async fn execute_step(ctx: &TestContext<'_>, step: &TestStep) -> Result<Verdict> {
    let wait = |timeout: Option<u64>| match timeout {
        Some(secs) => ctx.wait_for(Duration::from_secs(secs)),
        None => ctx.wait(),
    };
    let action = ctx.action();

    match step {
        TestStep::WaitVisible { locator, timeout } => {
            wait(*timeout).for_element_to_be_visible(locator).await?
        }
        TestStep::WaitInvisible { locator, timeout } => {
            wait(*timeout).for_element_to_be_invisible(locator).await?
        }
        TestStep::WaitPresent { locator, timeout } => {
            wait(*timeout).for_element_to_be_present(locator).await?
        }
        TestStep::WaitClickable { locator, timeout } => {
            wait(*timeout).for_element_to_be_clickable(locator).await?
        }
        TestStep::Click { locator, centre } => {
            if *centre {
                action.click_element_centre(locator).await?
            } else {
                action.click(locator).await?
            }
        }
        TestStep::Fill { locator, text } => action.fill(locator, text).await?,
        TestStep::SendKeys { text } => action.send_keys(text).await?,
        TestStep::SendKeycodes { value } => action.send_keycodes(value).await?,
        TestStep::Press { key } => match key {
            HardwareKey::Enter => action.send_enter_key().await?,
            HardwareKey::Back => action.send_back_key().await?,
        },
        TestStep::DismissKeyboard => action.dismiss_keyboard().await?,
        TestStep::SwipeIntoView {
            locator,
            direction,
            max_swipes,
        } => {
            action
                .swipe_element_into_view(
                    locator,
                    *direction,
                    max_swipes.unwrap_or(DEFAULT_MAX_SWIPES),
                )
                .await?
        }
        TestStep::AssertText {
            locator,
            equals,
            contains,
        } => {
            let text = action.get_element_text(locator).await?;
            return Ok(check_text(&text, equals.as_deref(), contains.as_deref()));
        }
        TestStep::Screenshot => {
            ctx.device().screenshot().await?;
        }
        TestStep::RefreshApp => ctx.device().refresh_app_instance().await?,
        TestStep::SwitchContext { context } => match context {
            ContextTarget::Native => ctx.device().switch_to_native().await?,
            ContextTarget::Webview => ctx.device().switch_to_webview().await?,
        },
        TestStep::GrantPermissions => ctx.device().grant_all_permissions().await?,
    }

    Ok(Verdict::Passed)
}

fn check_text(text: &str, equals: Option<&str>, contains: Option<&str>) -> Verdict {
    if let Some(expected) = equals {
        if text != expected {
            return Verdict::Failed(format!("Expected text '{}', got '{}'", expected, text));
        }
    }
    if let Some(needle) = contains {
        if !text.contains(needle) {
            return Verdict::Failed(format!("Expected text containing '{}', got '{}'", needle, text));
        }
    }
    Verdict::Passed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_text() {
        assert!(check_text("Tulips", Some("Tulips"), None).is_passed());
        assert!(check_text("Tulips", None, Some("lip")).is_passed());
        assert!(check_text("Tulips", None, None).is_passed());
        assert!(!check_text("Tulips", Some("Roses"), None).is_passed());
        assert!(!check_text("Tulips", Some("Tulips"), Some("Rose")).is_passed());
    }
}
