//! In-process Florae device
//!
//! Implements `Driver` against a small model of the app: the home screen,
//! the new-plant form with its date picker dialog, and the garden. Lookups
//! evaluate the same UiSelector and XPath locators a UiAutomator2 server
//! would, so pages and scenarios run against it unchanged.
//!
//! Sessions opened from one simulator share the device: plants saved in
//! one session are still there in the next.

mod selector;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::automation::keycodes::{KEYCODE_BACK, KEYCODE_ENTER};
use crate::common::error::STALE_ELEMENT;
use crate::common::{Error, Result};
use crate::webdriver::client::decode_screenshot;
use crate::webdriver::{
    ActionSequence, Driver, ElementId, KeyAction, Locator, Point, PointerAction, Rect,
    NATIVE_CONTEXT,
};

use selector::Node;

/// Package the simulator installs unless told otherwise
pub const DEFAULT_PACKAGE: &str = "cat.naval.florae";

const VIEW: &str = "android.view.View";
const BUTTON: &str = "android.widget.Button";
const EDIT_TEXT: &str = "android.widget.EditText";

const SCREEN_WIDTH: f64 = 1080.0;
const SCREEN_HEIGHT: f64 = 2400.0;

/// Below the app bar; scrolled content above this is hidden
const CONTENT_TOP: f64 = 300.0;

/// How far the plant form scrolls
const MAX_SCROLL: i64 = 250;

/// Pointer travel below which a gesture counts as a tap
const TAP_SLOP: i64 = 20;

/// 1x1 transparent PNG
const SCREENSHOT: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// A plant saved through the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantRecord {
    pub name: String,
    pub desc: String,
    pub location: String,
    pub planted: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Plant,
    Garden,
}

#[derive(Debug, Default)]
struct PlantForm {
    name: String,
    desc: String,
    location: String,
    planted: Option<String>,
}

#[derive(Debug, Default)]
struct DatePicker {
    text_mode: bool,
    entry: String,
}

struct DeviceState {
    package: String,
    running: bool,
    screen: Screen,
    form: PlantForm,
    scroll: i64,
    picker: Option<DatePicker>,
    focus: Option<String>,
    keyboard: bool,
    plants: Vec<PlantRecord>,
    contexts: Vec<String>,
    context: String,
    permissions_granted: bool,
    fail_next: Option<String>,
    history: Vec<String>,
}

/// Simulated device with one open session
pub struct Simulator {
    session_id: String,
    device: Arc<Mutex<DeviceState>>,
    closed: AtomicBool,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Device with Florae installed and running on the home screen
    pub fn new() -> Self {
        Self::with_package(DEFAULT_PACKAGE)
    }

    pub fn with_package(package: &str) -> Self {
        let state = DeviceState {
            package: package.to_string(),
            running: true,
            screen: Screen::Home,
            form: PlantForm::default(),
            scroll: 0,
            picker: None,
            focus: None,
            keyboard: false,
            plants: Vec::new(),
            contexts: vec![NATIVE_CONTEXT.to_string()],
            context: NATIVE_CONTEXT.to_string(),
            permissions_granted: false,
            fail_next: None,
            history: Vec::new(),
        };
        Self::attach(Arc::new(Mutex::new(state)))
    }

    fn attach(device: Arc<Mutex<DeviceState>>) -> Self {
        Self {
            session_id: format!("sim-{}", NEXT_SESSION.fetch_add(1, Ordering::Relaxed)),
            device,
            closed: AtomicBool::new(false),
        }
    }

    /// Expose a `WEBVIEW_<package>` context
    pub fn with_webview(self) -> Self {
        {
            let mut state = self.lock();
            let webview = format!("WEBVIEW_{}", state.package);
            state.contexts.push(webview);
        }
        self
    }

    /// Open another session on the same device, relaunching the app
    pub fn new_session(&self) -> Simulator {
        {
            let mut state = self.lock();
            state.launch();
            state.context = NATIVE_CONTEXT.to_string();
        }
        Self::attach(Arc::clone(&self.device))
    }

    pub fn package(&self) -> String {
        self.lock().package.clone()
    }

    /// Make the next command fail with the given W3C error code
    pub fn fail_next(&self, code: &str) {
        self.lock().fail_next = Some(code.to_string());
    }

    /// Commands received so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    pub fn plants(&self) -> Vec<PlantRecord> {
        self.lock().plants.clone()
    }

    /// Add a plant as if it had been saved earlier
    pub fn seed_plant(&self, name: &str, desc: &str, location: &str) {
        self.lock().plants.push(PlantRecord {
            name: name.to_string(),
            desc: desc.to_string(),
            location: location.to_string(),
            planted: None,
        });
    }

    pub fn keyboard_shown(&self) -> bool {
        self.lock().keyboard
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn permissions_granted(&self) -> bool {
        self.lock().permissions_granted
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.device
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check the session, consume an injected failure and log the command
    fn begin(&self, command: impl Into<String>) -> Result<MutexGuard<'_, DeviceState>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::webdriver(
                "invalid session id",
                &format!("Session {} has been deleted", self.session_id),
            ));
        }

        let mut state = self.lock();
        if let Some(code) = state.fail_next.take() {
            return Err(Error::webdriver(&code, "Injected failure"));
        }
        state.history.push(command.into());
        Ok(state)
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Builds one screen's hierarchy
#[derive(Default)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn push(
        &mut self,
        parent: Option<usize>,
        class: &'static str,
        id: &str,
        desc: &str,
        rect: Rect,
    ) -> usize {
        self.nodes.push(Node {
            id: id.to_string(),
            class,
            desc: desc.to_string(),
            text: String::new(),
            rect,
            parent,
            clickable: class != VIEW,
        });
        self.nodes.len() - 1
    }

    fn field(&mut self, parent: usize, id: &str, text: &str, y: f64) {
        let index = self.push(Some(parent), EDIT_TEXT, id, "", rect(40.0, y, 1000.0, 150.0));
        self.nodes[index].text = text.to_string();
    }
}

impl DeviceState {
    /// Elements currently on screen, in document order
    fn nodes(&self) -> Vec<Node> {
        if !self.running || self.context != NATIVE_CONTEXT {
            return Vec::new();
        }
        if let Some(picker) = &self.picker {
            return self.date_picker(picker);
        }
        match self.screen {
            Screen::Home => self.home(),
            Screen::Plant => self.plant_form(),
            Screen::Garden => self.garden(),
        }
    }

    fn home(&self) -> Vec<Node> {
        let mut tree = Tree::default();
        let root = Some(tree.push(None, VIEW, "home", "", rect(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT)));
        tree.push(root, VIEW, "today-heading", "Today", rect(40.0, 150.0, 400.0, 100.0));
        tree.push(root, BUTTON, "settings", "Settings", rect(940.0, 150.0, 100.0, 100.0));
        tree.push(root, BUTTON, "today-tab", "Today\nTab 1 of 2", rect(0.0, 2250.0, 540.0, 150.0));
        tree.push(root, BUTTON, "garden-tab", "Garden\nTab 2 of 2", rect(540.0, 2250.0, 540.0, 150.0));
        tree.push(root, BUTTON, "add-plant", "", rect(880.0, 2050.0, 150.0, 150.0));
        tree.nodes
    }

    fn plant_form(&self) -> Vec<Node> {
        let offset = self.scroll as f64;
        let full = rect(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT);
        let body = rect(0.0, CONTENT_TOP, SCREEN_WIDTH, SCREEN_HEIGHT - CONTENT_TOP);

        let mut tree = Tree::default();
        let root = tree.push(None, VIEW, "plant", "", full);
        let scaffold = tree.push(Some(root), VIEW, "scaffold", "", full);
        let app_bar = tree.push(Some(scaffold), VIEW, "app-bar", "", rect(0.0, 0.0, SCREEN_WIDTH, CONTENT_TOP));
        tree.push(Some(app_bar), VIEW, "new-heading", "New", rect(120.0, 150.0, 300.0, 100.0));
        tree.push(Some(app_bar), BUTTON, "back", "Back", rect(0.0, 150.0, 100.0, 100.0));
        tree.push(Some(app_bar), BUTTON, "save", "Save", rect(880.0, 150.0, 200.0, 100.0));
        let body = tree.push(Some(scaffold), VIEW, "body", "", body);
        let scroll = tree.push(Some(body), VIEW, "scroll", "", rect(0.0, CONTENT_TOP, SCREEN_WIDTH, SCREEN_HEIGHT - CONTENT_TOP));
        let form = tree.push(Some(scroll), VIEW, "form", "", rect(0.0, 850.0 - offset, SCREEN_WIDTH, 650.0));
        tree.field(form, "name-field", &self.form.name, 900.0 - offset);
        tree.field(form, "desc-field", &self.form.desc, 1100.0 - offset);
        tree.field(form, "location-field", &self.form.location, 1300.0 - offset);

        let planted = rect(40.0, 2500.0 - offset, 1000.0, 150.0);
        if planted.y >= CONTENT_TOP && planted.y + planted.height <= SCREEN_HEIGHT {
            let label = format!(
                "Day planted\n{}",
                self.form.planted.as_deref().unwrap_or("Not set")
            );
            let index = tree.push(Some(scroll), VIEW, "day-planted", &label, planted);
            tree.nodes[index].clickable = true;
        }
        tree.nodes
    }

    fn date_picker(&self, picker: &DatePicker) -> Vec<Node> {
        let mut tree = Tree::default();
        let dialog = tree.push(None, VIEW, "date-dialog", "", rect(90.0, 600.0, 900.0, 1200.0));
        tree.push(Some(dialog), VIEW, "date-title", "Select date", rect(140.0, 650.0, 600.0, 100.0));
        tree.push(Some(dialog), BUTTON, "mode-toggle", "Switch to input", rect(800.0, 650.0, 150.0, 150.0));
        if picker.text_mode {
            tree.field(dialog, "date-entry", &picker.entry, 900.0);
        }
        tree.push(Some(dialog), BUTTON, "cancel", "Cancel", rect(400.0, 1650.0, 250.0, 100.0));
        tree.push(Some(dialog), BUTTON, "ok", "OK", rect(700.0, 1650.0, 250.0, 100.0));
        tree.nodes
    }

    fn garden(&self) -> Vec<Node> {
        let mut tree = Tree::default();
        let root = Some(tree.push(None, VIEW, "garden", "", rect(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT)));
        tree.push(root, VIEW, "garden-heading", "Garden", rect(40.0, 150.0, 400.0, 100.0));
        tree.push(root, BUTTON, "today-tab", "Today\nTab 1 of 2", rect(0.0, 2250.0, 540.0, 150.0));
        tree.push(root, BUTTON, "garden-tab", "Garden\nTab 2 of 2", rect(540.0, 2250.0, 540.0, 150.0));

        if self.plants.is_empty() {
            tree.push(root, VIEW, "placeholder", "Placeholder", rect(240.0, 900.0, 600.0, 600.0));
        }
        for (i, plant) in self.plants.iter().enumerate() {
            let card = rect(40.0, 400.0 + 250.0 * i as f64, 1000.0, 200.0);
            if card.y + card.height > 2250.0 {
                break;
            }
            let label = format!("{}\n{}", plant.name, plant.location);
            let index = tree.push(root, VIEW, &format!("plant-{i}"), &label, card);
            tree.nodes[index].clickable = true;
        }
        tree.nodes
    }

    fn find(&self, locator: &Locator) -> Result<Vec<ElementId>> {
        let selector =
            selector::compile(locator).map_err(|message| Error::webdriver("invalid selector", &message))?;
        let nodes = self.nodes();
        Ok(selector::select(&nodes, &selector)
            .into_iter()
            .map(|i| ElementId(nodes[i].id.clone()))
            .collect())
    }

    fn element(&self, id: &ElementId) -> Result<Node> {
        self.nodes()
            .into_iter()
            .find(|node| node.id == id.as_str())
            .ok_or_else(|| {
                Error::webdriver(
                    STALE_ELEMENT,
                    &format!("Element {} is no longer attached to the page", id),
                )
            })
    }

    fn launch(&mut self) {
        self.running = true;
        self.reset_ui();
    }

    fn reset_ui(&mut self) {
        self.screen = Screen::Home;
        self.form = PlantForm::default();
        self.scroll = 0;
        self.picker = None;
        self.focus = None;
        self.keyboard = false;
    }

    fn check_package(&self, app_id: &str) -> Result<()> {
        if app_id == self.package {
            Ok(())
        } else {
            Err(Error::webdriver(
                "unknown error",
                &format!("App '{}' is not installed", app_id),
            ))
        }
    }

    fn terminate(&mut self, app_id: &str) -> Result<()> {
        self.check_package(app_id)?;
        self.running = false;
        self.reset_ui();
        Ok(())
    }

    fn activate(&mut self, app_id: &str) -> Result<()> {
        self.check_package(app_id)?;
        if !self.running {
            self.launch();
        }
        Ok(())
    }

    /// React to a click on the element with this id
    fn press(&mut self, id: &str) {
        match id {
            "add-plant" => {
                self.reset_ui();
                self.screen = Screen::Plant;
            }
            "garden-tab" => self.screen = Screen::Garden,
            "today-tab" | "back" => self.reset_ui(),
            "name-field" | "desc-field" | "location-field" | "date-entry" => {
                self.focus = Some(id.to_string());
                self.keyboard = true;
            }
            "day-planted" => self.picker = Some(DatePicker::default()),
            "mode-toggle" => {
                if let Some(picker) = &mut self.picker {
                    picker.text_mode = !picker.text_mode;
                    picker.entry.clear();
                    self.keyboard = picker.text_mode;
                    self.focus = picker.text_mode.then(|| "date-entry".to_string());
                }
            }
            "ok" => {
                if let Some(picker) = self.picker.take() {
                    if !picker.entry.is_empty() {
                        self.form.planted = Some(picker.entry);
                    }
                }
                self.focus = None;
                self.keyboard = false;
            }
            "cancel" => {
                self.picker = None;
                self.focus = None;
                self.keyboard = false;
            }
            "save" => self.save_plant(),
            _ => {}
        }
    }

    fn save_plant(&mut self) {
        if self.form.name.is_empty() {
            return;
        }
        let form = std::mem::take(&mut self.form);
        self.plants.push(PlantRecord {
            name: form.name,
            desc: form.desc,
            location: form.location,
            planted: form.planted,
        });
        self.reset_ui();
    }

    fn field_mut(&mut self, id: &str) -> Option<&mut String> {
        match id {
            "name-field" => Some(&mut self.form.name),
            "desc-field" => Some(&mut self.form.desc),
            "location-field" => Some(&mut self.form.location),
            "date-entry" => self.picker.as_mut().map(|picker| &mut picker.entry),
            _ => None,
        }
    }

    /// Type into the focused field; special WebDriver keys are dropped
    fn type_text(&mut self, text: &str) {
        let Some(focus) = self.focus.clone() else {
            return;
        };
        if let Some(field) = self.field_mut(&focus) {
            field.extend(text.chars().filter(|c| !('\u{E000}'..='\u{F8FF}').contains(c)));
        }
    }

    fn set_value(&mut self, id: &ElementId, text: &str) -> Result<()> {
        let node = self.element(id)?;
        if node.class != EDIT_TEXT {
            return Err(Error::webdriver(
                "invalid element state",
                &format!("Element {} does not accept text", id),
            ));
        }
        if let Some(field) = self.field_mut(id.as_str()) {
            *field = text.to_string();
        }
        self.focus = Some(node.id);
        self.keyboard = true;
        Ok(())
    }

    fn press_keycode(&mut self, keycode: u32) {
        match keycode {
            7..=16 => {
                let digit = char::from(b'0' + (keycode - 7) as u8);
                self.type_text(&digit.to_string());
            }
            76 => self.type_text("/"),
            KEYCODE_ENTER => self.keyboard = false,
            KEYCODE_BACK => self.back(),
            _ => {}
        }
    }

    fn back(&mut self) {
        if self.keyboard {
            self.keyboard = false;
        } else if self.picker.is_some() {
            self.picker = None;
            self.focus = None;
        } else if self.screen != Screen::Home {
            self.reset_ui();
        } else {
            self.running = false;
        }
    }

    fn perform(&mut self, actions: &[ActionSequence]) {
        for sequence in actions {
            match sequence {
                ActionSequence::Pointer { actions, .. } => {
                    let mut position = Point { x: 0, y: 0 };
                    let mut pressed_at = None;
                    for action in actions {
                        match action {
                            PointerAction::PointerMove { x, y, .. } => {
                                position = Point { x: *x, y: *y };
                            }
                            PointerAction::PointerDown { .. } => pressed_at = Some(position),
                            PointerAction::PointerUp { .. } => {
                                if let Some(start) = pressed_at.take() {
                                    self.gesture(start, position);
                                }
                            }
                            PointerAction::Pause { .. } => {}
                        }
                    }
                }
                ActionSequence::Key { actions, .. } => {
                    for action in actions {
                        if let KeyAction::KeyDown { value } = action {
                            self.type_text(value);
                        }
                    }
                }
            }
        }
    }

    fn gesture(&mut self, start: Point, end: Point) {
        let travel = (start.x - end.x).abs() + (start.y - end.y).abs();
        if travel < TAP_SLOP {
            self.tap(start);
        } else if self.screen == Screen::Plant && self.picker.is_none() {
            self.scroll = (self.scroll + start.y - end.y).clamp(0, MAX_SCROLL);
        }
    }

    fn tap(&mut self, at: Point) {
        let target = self
            .nodes()
            .into_iter()
            .rev()
            .find(|node| node.clickable && node.rect.contains(at));
        if let Some(node) = target {
            self.press(&node.id);
        }
    }

    fn execute(&mut self, script: &str, args: Value) -> Result<Value> {
        let args = match args {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        let arg = |name: &str| -> Result<String> {
            args.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::webdriver("invalid argument", &format!("'{}' is required", name)))
        };

        match script {
            "mobile: pressKey" => {
                let keycode = args
                    .get("keycode")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| Error::webdriver("invalid argument", "'keycode' is required"))?;
                let keycode = u32::try_from(keycode).map_err(|_| {
                    Error::webdriver("invalid argument", &format!("Keycode {} is out of range", keycode))
                })?;
                self.press_keycode(keycode);
            }
            "mobile: hideKeyboard" => self.keyboard = false,
            "mobile: terminateApp" => self.terminate(&arg("appId")?)?,
            "mobile: activateApp" => self.activate(&arg("appId")?)?,
            "mobile: changePermissions" => {
                self.check_package(&arg("appPackage")?)?;
                self.permissions_granted = arg("permissions")? == "all" && arg("action")? == "grant";
            }
            other => {
                return Err(Error::webdriver(
                    "unknown method",
                    &format!("Script '{}' is not supported", other),
                ))
            }
        }
        Ok(Value::Null)
    }
}

#[async_trait]
impl Driver for Simulator {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn find_element(&self, locator: &Locator) -> Result<ElementId> {
        let state = self.begin(format!("find_element {}", locator))?;
        state
            .find(locator)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::no_such_element(locator))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>> {
        self.begin(format!("find_elements {}", locator))?.find(locator)
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        let mut state = self.begin(format!("click {}", element))?;
        let node = state.element(element)?;
        state.press(&node.id);
        Ok(())
    }

    async fn send_keys_to(&self, element: &ElementId, text: &str) -> Result<()> {
        self.begin(format!("send_keys_to {}", element))?
            .set_value(element, text)
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        Ok(self.begin(format!("text {}", element))?.element(element)?.text)
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        // Off-screen nodes are left out of the tree entirely
        self.begin(format!("is_displayed {}", element))?
            .element(element)
            .map(|_| true)
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        self.begin(format!("is_enabled {}", element))?
            .element(element)
            .map(|_| true)
    }

    async fn rect(&self, element: &ElementId) -> Result<Rect> {
        Ok(self.begin(format!("rect {}", element))?.element(element)?.rect)
    }

    async fn window_rect(&self) -> Result<Rect> {
        drop(self.begin("window_rect")?);
        Ok(rect(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT))
    }

    async fn perform_actions(&self, actions: &[ActionSequence]) -> Result<()> {
        self.begin("perform_actions")?.perform(actions);
        Ok(())
    }

    async fn press_keycode(&self, keycode: u32) -> Result<()> {
        self.begin(format!("press_keycode {}", keycode))?
            .press_keycode(keycode);
        Ok(())
    }

    async fn hide_keyboard(&self) -> Result<()> {
        self.begin("hide_keyboard")?.keyboard = false;
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        drop(self.begin("screenshot")?);
        decode_screenshot(SCREENSHOT)
    }

    async fn terminate_app(&self, app_id: &str) -> Result<()> {
        self.begin(format!("terminate_app {}", app_id))?
            .terminate(app_id)
    }

    async fn activate_app(&self, app_id: &str) -> Result<()> {
        self.begin(format!("activate_app {}", app_id))?
            .activate(app_id)
    }

    async fn contexts(&self) -> Result<Vec<String>> {
        Ok(self.begin("contexts")?.contexts.clone())
    }

    async fn current_context(&self) -> Result<String> {
        Ok(self.begin("current_context")?.context.clone())
    }

    async fn set_context(&self, name: &str) -> Result<()> {
        let mut state = self.begin(format!("set_context {}", name))?;
        if !state.contexts.iter().any(|c| c == name) {
            return Err(Error::webdriver(
                "no such context",
                &format!("Context '{}' does not exist", name),
            ));
        }
        state.context = name.to_string();
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: Value) -> Result<Value> {
        self.begin(format!("execute_script {}", script))?
            .execute(script, args)
    }

    async fn quit(&self) -> Result<()> {
        drop(self.begin("quit")?);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{garden, home, plant};
    use serde_json::json;

    #[tokio::test]
    async fn test_starts_on_home() {
        let sim = Simulator::new();
        assert!(sim.find_element(&home::TODAY_HEADING).await.is_ok());
        let err = sim.find_element(&plant::SAVE_BUTTON).await.unwrap_err();
        assert!(err.is_no_such_element());
    }

    #[tokio::test]
    async fn test_elements_go_stale_off_screen() {
        let sim = Simulator::new();
        let heading = sim.find_element(&home::TODAY_HEADING).await.unwrap();
        let add = sim.find_element(&home::ADD_PLANT_BUTTON).await.unwrap();
        sim.click(&add).await.unwrap();

        let err = sim.is_displayed(&heading).await.unwrap_err();
        assert!(err.is_element_absent());
        assert!(!err.is_no_such_element());
    }

    #[tokio::test]
    async fn test_tap_hits_element_under_point() {
        let sim = Simulator::new();
        let add = sim.find_element(&home::ADD_PLANT_BUTTON).await.unwrap();
        let centre = sim.rect(&add).await.unwrap().points().mid;
        sim.perform_actions(&[ActionSequence::tap(centre, 1000)])
            .await
            .unwrap();
        assert!(sim.find_element(&plant::NEW_HEADING).await.is_ok());
    }

    #[tokio::test]
    async fn test_date_picker_flow() {
        let sim = Simulator::new();
        let click = |locator: Locator| {
            let sim = &sim;
            async move {
                let element = sim.find_element(&locator).await.unwrap();
                sim.click(&element).await.unwrap();
            }
        };

        click(home::ADD_PLANT_BUTTON).await;
        let name = sim.find_element(&plant::NAME_FIELD).await.unwrap();
        sim.send_keys_to(&name, "Fern").await.unwrap();

        let swipe = ActionSequence::swipe(Point { x: 540, y: 1680 }, Point { x: 540, y: 720 }, 800);
        sim.perform_actions(&[swipe]).await.unwrap();
        click(plant::DAY_PLANTED).await;
        click(plant::DATE_PICKER_EDIT).await;
        for code in [8, 9, 76, 7, 9] {
            sim.press_keycode(code).await.unwrap();
        }
        click(plant::DATE_PICKER_OK).await;

        let planted = sim.find_element(&plant::DAY_PLANTED).await.unwrap();
        assert_eq!(planted, ElementId("day-planted".into()));
        click(plant::SAVE_BUTTON).await;

        assert_eq!(
            sim.plants(),
            [PlantRecord {
                name: "Fern".into(),
                desc: String::new(),
                location: String::new(),
                planted: Some("12/02".into()),
            }]
        );
        assert!(sim.find_element(&home::TODAY_HEADING).await.is_ok());
    }

    #[tokio::test]
    async fn test_garden_lists_saved_plants() {
        let sim = Simulator::new();
        sim.seed_plant("Tulips", "Very pretty!", "5th Floor Dungeon");
        let tab = sim.find_element(&home::GARDEN_TAB).await.unwrap();
        sim.click(&tab).await.unwrap();

        assert!(sim.find_element(&garden::GARDEN_HEADING).await.is_ok());
        assert!(sim
            .find_element(&Locator::description_contains("Tulips"))
            .await
            .is_ok());
        assert!(sim.find_element(&garden::PLACEHOLDER).await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_share_device() {
        let first = Simulator::new();
        first.seed_plant("Tulips", "", "");
        first.quit().await.unwrap();
        assert!(matches!(
            first.window_rect().await,
            Err(Error::WebDriver { ref code, .. }) if code == "invalid session id"
        ));

        let second = first.new_session();
        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(second.plants().len(), 1);
        assert!(second.window_rect().await.is_ok());
    }

    #[tokio::test]
    async fn test_mobile_scripts() {
        let sim = Simulator::new();
        sim.execute_script("mobile: terminateApp", json!({ "appId": DEFAULT_PACKAGE }))
            .await
            .unwrap();
        assert!(!sim.is_running());
        sim.execute_script("mobile: activateApp", json!([{ "appId": DEFAULT_PACKAGE }]))
            .await
            .unwrap();
        assert!(sim.is_running());

        let err = sim
            .execute_script("mobile: shell", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WebDriver { .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_keycode_rejected() {
        let sim = Simulator::new();
        let err = sim
            .execute_script("mobile: pressKey", json!({ "keycode": u64::from(u32::MAX) + 8 }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WebDriver { ref code, .. } if code == "invalid argument"));

        sim.execute_script("mobile: pressKey", json!({ "keycode": 66 }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_screenshot_is_png() {
        let png = Simulator::new().screenshot_png().await.unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
