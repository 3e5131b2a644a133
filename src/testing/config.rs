//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use std::path::Path;

use crate::automation::SeekDirection;
use crate::common::{Error, Result};
use crate::webdriver::Locator;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// The sequence of test steps to execute
    pub steps: Vec<TestStep>,
}

impl TestScenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::config_parse(origin, e))
    }
}

/// A single test step in the execution flow
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Wait until the element is displayed
    WaitVisible {
        locator: Locator,
        /// Timeout in seconds (default: 30)
        timeout: Option<u64>,
    },
    /// Wait until the element is gone or hidden
    WaitInvisible {
        locator: Locator,
        timeout: Option<u64>,
    },
    /// Wait until the element exists in the UI tree
    WaitPresent {
        locator: Locator,
        timeout: Option<u64>,
    },
    /// Wait until the element is displayed and enabled
    WaitClickable {
        locator: Locator,
        timeout: Option<u64>,
    },
    /// Click an element, or tap its centre with `centre: true`
    Click {
        locator: Locator,
        #[serde(default)]
        centre: bool,
    },
    /// Focus a field, type into it and close the keyboard
    Fill { locator: Locator, text: String },
    /// Type into the focused element
    SendKeys { text: String },
    /// Send a digit/slash string as Android keycodes
    SendKeycodes { value: String },
    /// Press a hardware key
    Press { key: HardwareKey },
    DismissKeyboard,
    /// Scroll until the element is on screen
    SwipeIntoView {
        locator: Locator,
        #[serde(default)]
        direction: SeekDirection,
        max_swipes: Option<u32>,
    },
    /// Check an element's text
    AssertText {
        locator: Locator,
        /// Expected exact text
        equals: Option<String>,
        /// Expected substring
        contains: Option<String>,
    },
    Screenshot,
    RefreshApp,
    SwitchContext { context: ContextTarget },
    GrantPermissions,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HardwareKey {
    Enter,
    Back,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContextTarget {
    Native,
    Webview,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webdriver::Strategy;

    #[test]
    fn test_parse_steps() {
        let yaml = r#"
name: add form
description: Open the add form
steps:
  - action: wait_visible
    locator:
      strategy: android_ui_automator
      selector: 'new UiSelector().description("Today")'
    timeout: 10
  - action: click
    locator: { strategy: xpath, selector: '//android.widget.Button' }
    centre: true
  - action: send_keycodes
    value: "06/01/2024"
  - action: press
    key: enter
  - action: dismiss_keyboard
  - action: swipe_into_view
    locator: { strategy: accessibility_id, selector: Day planted }
  - action: switch_context
    context: webview
"#;
        let scenario = TestScenario::parse(yaml, Path::new("s.yaml")).unwrap();
        assert_eq!(scenario.name, "add form");
        assert_eq!(scenario.steps.len(), 7);

        match &scenario.steps[0] {
            TestStep::WaitVisible { locator, timeout } => {
                assert_eq!(locator.strategy, Strategy::AndroidUiAutomator);
                assert_eq!(*timeout, Some(10));
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert!(matches!(scenario.steps[1], TestStep::Click { centre: true, .. }));
        assert_eq!(scenario.steps[3], TestStep::Press { key: HardwareKey::Enter });
        assert_eq!(scenario.steps[4], TestStep::DismissKeyboard);
        assert!(matches!(
            scenario.steps[5],
            TestStep::SwipeIntoView {
                direction: SeekDirection::Down,
                max_swipes: None,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let yaml = "name: x\nsteps:\n  - action: teleport\n";
        let err = TestScenario::parse(yaml, Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_missing_file() {
        let err = TestScenario::load(Path::new("/nonexistent/scenario.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
