//! Remote session interface
//!
//! Everything the helpers and pages need from an automation session. The
//! HTTP client implements it against a live Appium server; the simulator
//! implements it in-process.

use async_trait::async_trait;
use serde_json::Value;

use crate::common::Result;

use super::types::{ActionSequence, ElementId, Locator, Rect};

/// A live automation session controlling one app on one device
#[async_trait]
pub trait Driver: Send + Sync {
    /// Server-assigned session id
    fn session_id(&self) -> &str;

    /// Find the first element matching `locator`
    ///
    /// Fails with the remote "no such element" error if nothing matches.
    async fn find_element(&self, locator: &Locator) -> Result<ElementId>;

    /// Find every element matching `locator` (possibly none)
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>>;

    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Type into a specific element
    async fn send_keys_to(&self, element: &ElementId, text: &str) -> Result<()>;

    async fn text(&self, element: &ElementId) -> Result<String>;

    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    async fn is_enabled(&self, element: &ElementId) -> Result<bool>;

    async fn rect(&self, element: &ElementId) -> Result<Rect>;

    /// Size of the device viewport
    async fn window_rect(&self) -> Result<Rect>;

    /// Run W3C input action sequences, then release all inputs
    async fn perform_actions(&self, actions: &[ActionSequence]) -> Result<()>;

    /// Press an Android keycode
    async fn press_keycode(&self, keycode: u32) -> Result<()>;

    async fn hide_keyboard(&self) -> Result<()>;

    /// PNG bytes of the current screen
    async fn screenshot_png(&self) -> Result<Vec<u8>>;

    async fn terminate_app(&self, app_id: &str) -> Result<()>;

    async fn activate_app(&self, app_id: &str) -> Result<()>;

    /// Names of available contexts (`NATIVE_APP`, `WEBVIEW_*`)
    async fn contexts(&self) -> Result<Vec<String>>;

    async fn current_context(&self) -> Result<String>;

    async fn set_context(&self, name: &str) -> Result<()>;

    /// Run a script, including Appium `mobile:` extension commands
    async fn execute_script(&self, script: &str, args: Value) -> Result<Value>;

    /// End the session
    async fn quit(&self) -> Result<()>;
}
