//! WebDriver message types
//!
//! The subset of W3C WebDriver (plus Appium locator strategies) that the
//! suite uses. See: https://www.w3.org/TR/webdriver2/

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Key under which W3C servers return element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a07c-4f96efcfe4c3";

/// Legacy JSONWP element key, still sent by some Appium drivers
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Context name of the native UI tree
pub const NATIVE_CONTEXT: &str = "NATIVE_APP";

// === Locators ===

/// Element lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Id,
    Xpath,
    #[serde(alias = "accessibility id")]
    AccessibilityId,
    #[serde(alias = "class name")]
    ClassName,
    #[serde(alias = "-android uiautomator", alias = "uiautomator")]
    AndroidUiAutomator,
}

impl Strategy {
    /// Value of the `using` field on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::Xpath => "xpath",
            Strategy::AccessibilityId => "accessibility id",
            Strategy::ClassName => "class name",
            Strategy::AndroidUiAutomator => "-android uiautomator",
        }
    }
}

/// Identifies a UI element: a strategy plus a selector string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: Strategy,
    pub selector: Cow<'static, str>,
}

impl Locator {
    pub const fn new(strategy: Strategy, selector: &'static str) -> Self {
        Self {
            strategy,
            selector: Cow::Borrowed(selector),
        }
    }

    pub const fn ui_automator(selector: &'static str) -> Self {
        Self::new(Strategy::AndroidUiAutomator, selector)
    }

    pub const fn xpath(selector: &'static str) -> Self {
        Self::new(Strategy::Xpath, selector)
    }

    /// Locator built at runtime
    pub fn dynamic(strategy: Strategy, selector: String) -> Self {
        Self {
            strategy,
            selector: Cow::Owned(selector),
        }
    }

    /// `UiSelector().descriptionContains(text)`
    pub fn description_contains(text: &str) -> Self {
        Self::dynamic(
            Strategy::AndroidUiAutomator,
            format!(r#"new UiSelector().descriptionContains("{}")"#, escape_java(text)),
        )
    }

    /// Body of a find-element request
    pub fn to_request(&self) -> Value {
        serde_json::json!({
            "using": self.strategy.as_str(),
            "value": self.selector,
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.selector)
    }
}

fn escape_java(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

// === Elements ===

/// Opaque reference to an element in the remote UI tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    /// Extract the reference from a find-element response value
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get(LEGACY_ELEMENT_KEY))
            .and_then(Value::as_str)
            .map(|id| ElementId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element or window bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Screen coordinate in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// One of the nine reference points of a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopMid,
    TopRight,
    LeftMid,
    #[default]
    Mid,
    RightMid,
    BottomLeft,
    BottomMid,
    BottomRight,
}

/// The nine reference points of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementPoints {
    pub top_left: Point,
    pub top_mid: Point,
    pub top_right: Point,
    pub left_mid: Point,
    pub mid: Point,
    pub right_mid: Point,
    pub bottom_left: Point,
    pub bottom_mid: Point,
    pub bottom_right: Point,
}

impl ElementPoints {
    pub fn get(&self, anchor: Anchor) -> Point {
        match anchor {
            Anchor::TopLeft => self.top_left,
            Anchor::TopMid => self.top_mid,
            Anchor::TopRight => self.top_right,
            Anchor::LeftMid => self.left_mid,
            Anchor::Mid => self.mid,
            Anchor::RightMid => self.right_mid,
            Anchor::BottomLeft => self.bottom_left,
            Anchor::BottomMid => self.bottom_mid,
            Anchor::BottomRight => self.bottom_right,
        }
    }
}

impl Rect {
    pub fn contains(&self, point: Point) -> bool {
        let (x, y) = (point.x as f64, point.y as f64);
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Reference points using whole-pixel halves
    pub fn points(&self) -> ElementPoints {
        let x = self.x.round() as i64;
        let y = self.y.round() as i64;
        let w = self.width.round() as i64;
        let h = self.height.round() as i64;
        let p = |x, y| Point { x, y };

        ElementPoints {
            top_left: p(x, y),
            top_mid: p(x + w / 2, y),
            top_right: p(x + w, y),
            left_mid: p(x, y + h / 2),
            mid: p(x + w / 2, y + h / 2),
            right_mid: p(x + w, y + h / 2),
            bottom_left: p(x, y + h),
            bottom_mid: p(x + w / 2, y + h),
            bottom_right: p(x + w, y + h),
        }
    }
}

// === Actions ===

/// One input source in a `POST /actions` request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionSequence {
    Pointer {
        id: String,
        parameters: PointerParameters,
        actions: Vec<PointerAction>,
    },
    Key {
        id: String,
        actions: Vec<KeyAction>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerParameters {
    pub pointer_type: PointerType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerAction {
    #[serde(rename_all = "camelCase")]
    PointerMove {
        duration: u64,
        x: i64,
        y: i64,
        origin: &'static str,
    },
    PointerDown {
        button: u8,
    },
    PointerUp {
        button: u8,
    },
    Pause {
        duration: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyAction {
    KeyDown { value: String },
    KeyUp { value: String },
    Pause { duration: u64 },
}

impl ActionSequence {
    /// Touch tap at a point, held for `hold_ms`
    pub fn tap(at: Point, hold_ms: u64) -> Self {
        ActionSequence::Pointer {
            id: "touch".to_string(),
            parameters: PointerParameters {
                pointer_type: PointerType::Touch,
            },
            actions: vec![
                PointerAction::PointerMove {
                    duration: 0,
                    x: at.x,
                    y: at.y,
                    origin: "viewport",
                },
                PointerAction::PointerDown { button: 0 },
                PointerAction::Pause { duration: hold_ms },
                PointerAction::PointerUp { button: 0 },
            ],
        }
    }

    /// Touch drag from one point to another over `duration_ms`
    pub fn swipe(from: Point, to: Point, duration_ms: u64) -> Self {
        ActionSequence::Pointer {
            id: "touch".to_string(),
            parameters: PointerParameters {
                pointer_type: PointerType::Touch,
            },
            actions: vec![
                PointerAction::PointerMove {
                    duration: 0,
                    x: from.x,
                    y: from.y,
                    origin: "viewport",
                },
                PointerAction::PointerDown { button: 0 },
                PointerAction::PointerMove {
                    duration: duration_ms,
                    x: to.x,
                    y: to.y,
                    origin: "viewport",
                },
                PointerAction::PointerUp { button: 0 },
            ],
        }
    }

    /// Type `text` into whatever has focus, after an initial pause
    pub fn typing(text: &str, pause_ms: u64) -> Self {
        let mut actions = Vec::with_capacity(text.chars().count() * 2 + 1);
        if pause_ms > 0 {
            actions.push(KeyAction::Pause { duration: pause_ms });
        }
        for c in text.chars() {
            actions.push(KeyAction::KeyDown {
                value: c.to_string(),
            });
            actions.push(KeyAction::KeyUp {
                value: c.to_string(),
            });
        }
        ActionSequence::Key {
            id: "keyboard".to_string(),
            actions,
        }
    }
}

// === Wire envelopes ===

/// Every WebDriver response wraps its payload in `value`
#[derive(Debug, Deserialize)]
pub struct WireResponse<T> {
    pub value: T,
}

/// Error payload of a failed command
#[derive(Debug, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Payload of `POST /session`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub session_id: String,
    #[serde(default)]
    pub capabilities: Value,
}
