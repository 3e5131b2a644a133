//! Session capabilities
//!
//! Turns loaded settings into the capability set used to open an
//! Appium UiAutomator2 session.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::common::config::{AppConfig, DeviceType};

/// Capability names defined by W3C; everything else gets the `appium:` prefix
const W3C_CAPABILITIES: &[&str] = &[
    "platformName",
    "browserName",
    "browserVersion",
    "acceptInsecureCerts",
    "pageLoadStrategy",
    "proxy",
    "setWindowRect",
    "timeouts",
    "strictFileInteractability",
    "unhandledPromptBehavior",
    "webSocketUrl",
];

/// Ordered capability map with unprefixed names
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeMap<String, Value>);

impl Capabilities {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// W3C form: vendor capabilities carry the `appium:` prefix
    pub fn to_w3c(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.0 {
            let key = if W3C_CAPABILITIES.contains(&name.as_str()) || name.contains(':') {
                name.clone()
            } else {
                format!("appium:{}", name)
            };
            map.insert(key, value.clone());
        }
        Value::Object(map)
    }
}

/// Build capabilities for the configured device; `app_root` anchors a
/// relative APK path
pub fn build(config: &AppConfig, app_root: &Path) -> Capabilities {
    let appium = &config.appium;
    let android = &config.android;
    let mut caps = Capabilities::default();

    caps.set("platformName", "Android");
    caps.set("automationName", "UIAutomator2");
    caps.set("platformVersion", android.platform_version.as_str());
    caps.set("appPackage", config.app.package.as_str());
    caps.set("appActivity", config.app.activity.as_str());
    caps.set("noReset", appium.no_reset);
    caps.set("fullReset", appium.full_reset);
    caps.set("autoGrantPermissions", true);
    caps.set("ignoreUnimportantViews", false);
    caps.set("ensureWebviewsHavePages", true);
    caps.set("remoteAppsCacheLimit", appium.remote_apps_cache_limit);
    caps.set("newCommandTimeout", appium.new_command_timeout);
    caps.set(
        "uiautomator2ServerInstallTimeout",
        appium.uiautomator2_server_install_timeout,
    );
    caps.set("adbExecTimeout", appium.adb_exec_timeout);

    match android.connected_device {
        DeviceType::Physical => {
            caps.set("udid", android.id_physical.as_str());
            caps.set("deviceName", android.id_physical.as_str());
        }
        DeviceType::Wifi => {
            caps.set("deviceName", android.id_wifi.as_str());
        }
        DeviceType::Virtual => {
            caps.set("avd", android.id_virtual.as_str());
            caps.set("deviceName", android.id_virtual.as_str());
        }
    }

    let app = app_root.join(&config.app.apk);
    caps.set("app", app.to_string_lossy().into_owned());

    caps
}
