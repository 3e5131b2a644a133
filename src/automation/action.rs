//! Element and keyboard interactions
//!
//! Thin wrappers over the remote session: one round trip per call, except
//! for the batched keycode sender and the swipe-into-view loop.

use serde::Deserialize;
use tracing::Span;

use crate::common::{Error, Result};
use crate::webdriver::{ActionSequence, Anchor, Driver, ElementId, Locator, Point};

use super::keycodes::{self, KEYCODE_BACK, KEYCODE_ENTER};

/// How long a tap holds the pointer down
const TAP_HOLD_MS: u64 = 1000;

/// Pause before typed keys are sent
const KEY_PAUSE_MS: u64 = 1000;

/// Duration of one scroll gesture
const SWIPE_DURATION_MS: u64 = 800;

/// Swipes attempted before giving up on an off-screen element
pub const DEFAULT_MAX_SWIPES: u32 = 10;

/// Which way to move through scrollable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekDirection {
    /// Reveal content further down (finger moves up)
    #[default]
    Down,
    /// Reveal content further up (finger moves down)
    Up,
}

impl SeekDirection {
    /// Start and end of a swipe across the middle of a viewport
    fn gesture(self, width: f64, height: f64) -> (Point, Point) {
        let x = (width / 2.0).round() as i64;
        let low = (height * 0.7).round() as i64;
        let high = (height * 0.3).round() as i64;
        match self {
            SeekDirection::Down => (Point { x, y: low }, Point { x, y: high }),
            SeekDirection::Up => (Point { x, y: high }, Point { x, y: low }),
        }
    }
}

/// Performs interactions on behalf of a page or test
pub struct Action<'a> {
    driver: &'a dyn Driver,
    span: Span,
}

impl<'a> Action<'a> {
    pub fn new(driver: &'a dyn Driver, span: Span) -> Self {
        Self { driver, span }
    }

    pub async fn click(&self, locator: &Locator) -> Result<()> {
        tracing::info!(parent: &self.span, %locator, "Clicking element");
        let element = self.driver.find_element(locator).await?;
        self.driver.click(&element).await
    }

    /// Tap the middle of the element's bounding box
    pub async fn click_element_centre(&self, locator: &Locator) -> Result<()> {
        self.click_element_at(locator, Anchor::Mid).await
    }

    /// Tap one of the nine reference points of the element
    pub async fn click_element_at(&self, locator: &Locator, anchor: Anchor) -> Result<()> {
        let element = self.driver.find_element(locator).await?;
        let point = self.driver.rect(&element).await?.points().get(anchor);

        tracing::info!(
            parent: &self.span,
            %locator,
            x = point.x,
            y = point.y,
            ?anchor,
            "Tapping element"
        );
        self.driver
            .perform_actions(&[ActionSequence::tap(point, TAP_HOLD_MS)])
            .await
    }

    /// Type into whatever currently has focus
    pub async fn send_keys(&self, text: &str) -> Result<()> {
        tracing::info!(parent: &self.span, chars = text.chars().count(), "Sending keys");
        self.driver
            .perform_actions(&[ActionSequence::typing(text, KEY_PAUSE_MS)])
            .await
    }

    pub async fn send_keycode(&self, keycode: u32) -> Result<()> {
        tracing::debug!(parent: &self.span, keycode, "Sending keycode");
        self.driver.press_keycode(keycode).await
    }

    /// Send a digit/slash string as keycodes
    ///
    /// The whole string is mapped before anything is sent, so an
    /// unmappable character leaves the device untouched.
    pub async fn send_keycodes(&self, value: &str) -> Result<()> {
        let codes = keycodes::to_keycodes(value)?;
        tracing::info!(parent: &self.span, value, "Sending keycodes");
        for code in codes {
            self.driver.press_keycode(code).await?;
        }
        Ok(())
    }

    pub async fn send_enter_key(&self) -> Result<()> {
        self.send_keycode(KEYCODE_ENTER).await
    }

    pub async fn send_back_key(&self) -> Result<()> {
        self.send_keycode(KEYCODE_BACK).await
    }

    pub async fn dismiss_keyboard(&self) -> Result<()> {
        tracing::debug!(parent: &self.span, "Dismissing keyboard");
        self.driver.hide_keyboard().await
    }

    pub async fn get_element_text(&self, locator: &Locator) -> Result<String> {
        let element = self.driver.find_element(locator).await?;
        let text = self.driver.text(&element).await?;
        tracing::debug!(parent: &self.span, %locator, %text, "Read element text");
        Ok(text)
    }

    /// Focus a field, type into it, then close the keyboard
    pub async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        tracing::info!(parent: &self.span, %locator, "Filling field");
        let element = self.driver.find_element(locator).await?;
        self.driver.click(&element).await?;
        self.driver.send_keys_to(&element, text).await?;
        self.driver.hide_keyboard().await
    }

    /// Scroll until the element is found and displayed
    pub async fn swipe_element_into_view(
        &self,
        locator: &Locator,
        direction: SeekDirection,
        max_swipes: u32,
    ) -> Result<()> {
        let window = self.driver.window_rect().await?;
        let (from, to) = direction.gesture(window.width, window.height);

        for swipes in 0..=max_swipes {
            if self.in_view(locator).await?.is_some() {
                tracing::info!(parent: &self.span, %locator, swipes, "Element in view");
                return Ok(());
            }
            if swipes == max_swipes {
                break;
            }
            tracing::debug!(parent: &self.span, %locator, ?direction, "Swiping");
            self.driver
                .perform_actions(&[ActionSequence::swipe(from, to, SWIPE_DURATION_MS)])
                .await?;
        }

        tracing::error!(parent: &self.span, %locator, max_swipes, "Element not reachable");
        Err(Error::ElementNotReachable {
            locator: locator.to_string(),
            swipes: max_swipes,
        })
    }

    async fn in_view(&self, locator: &Locator) -> Result<Option<ElementId>> {
        let element = match self.driver.find_element(locator).await {
            Ok(element) => element,
            Err(e) if e.is_element_absent() => return Ok(None),
            Err(e) => return Err(e),
        };
        match self.driver.is_displayed(&element).await {
            Ok(true) => Ok(Some(element)),
            Ok(false) => Ok(None),
            Err(e) if e.is_element_absent() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{home, plant};
    use crate::testing::simulator::Simulator;

    fn action(sim: &Simulator) -> Action<'_> {
        Action::new(sim, Span::none())
    }

    #[test]
    fn test_swipe_gesture_geometry() {
        let (from, to) = SeekDirection::Down.gesture(1080.0, 2400.0);
        assert_eq!(from, Point { x: 540, y: 1680 });
        assert_eq!(to, Point { x: 540, y: 720 });

        let (from, to) = SeekDirection::Up.gesture(1080.0, 2400.0);
        assert!(from.y < to.y);
    }

    #[tokio::test]
    async fn test_fill_and_read_back() {
        let sim = Simulator::new();
        let action = action(&sim);
        action.click(&home::ADD_PLANT_BUTTON).await.unwrap();

        action.fill(&plant::NAME_FIELD, "Tulips").await.unwrap();
        assert_eq!(
            action.get_element_text(&plant::NAME_TEXT).await.unwrap(),
            "Tulips"
        );
        assert!(!sim.keyboard_shown());
    }

    #[tokio::test]
    async fn test_tap_centre_and_typed_keys() {
        let sim = Simulator::new();
        let action = action(&sim);
        action.click_element_centre(&home::ADD_PLANT_BUTTON).await.unwrap();
        action.click_element_centre(&plant::DESC_FIELD).await.unwrap();
        action.send_keys("Very pretty!").await.unwrap();

        assert_eq!(
            action.get_element_text(&plant::DESC_TEXT).await.unwrap(),
            "Very pretty!"
        );
    }

    #[tokio::test]
    async fn test_bad_keycode_string_sends_nothing() {
        let sim = Simulator::new();
        let before = sim.history().len();

        let err = action(&sim).send_keycodes("06-01").await.unwrap_err();
        assert!(matches!(err, Error::UnmappableKeycode { character: '-', .. }));
        assert_eq!(sim.history().len(), before);
    }

    #[tokio::test]
    async fn test_keycodes_are_sent_in_order() {
        let sim = Simulator::new();
        action(&sim).send_keycodes("1/2").await.unwrap();

        let pressed: Vec<String> = sim
            .history()
            .into_iter()
            .filter(|entry| entry.starts_with("press_keycode"))
            .collect();
        assert_eq!(pressed, ["press_keycode 8", "press_keycode 76", "press_keycode 9"]);
    }

    #[tokio::test]
    async fn test_swipe_into_view() {
        let sim = Simulator::new();
        let action = action(&sim);
        action.click(&home::ADD_PLANT_BUTTON).await.unwrap();

        assert!(sim.find_element(&plant::DAY_PLANTED).await.is_err());
        action
            .swipe_element_into_view(&plant::DAY_PLANTED, SeekDirection::Down, DEFAULT_MAX_SWIPES)
            .await
            .unwrap();
        assert!(sim.find_element(&plant::DAY_PLANTED).await.is_ok());
    }

    #[tokio::test]
    async fn test_swipe_gives_up() {
        let sim = Simulator::new();
        let err = action(&sim)
            .swipe_element_into_view(&plant::DAY_PLANTED, SeekDirection::Down, 3)
            .await
            .unwrap_err();
        match err {
            Error::ElementNotReachable { swipes, .. } => assert_eq!(swipes, 3),
            other => panic!("Expected ElementNotReachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_back_key_leaves_plant_screen() {
        let sim = Simulator::new();
        let action = action(&sim);
        action.click(&home::ADD_PLANT_BUTTON).await.unwrap();
        action.send_back_key().await.unwrap();
        assert!(sim.find_element(&home::TODAY_HEADING).await.is_ok());
    }
}
