//! Settings file handling
//!
//! The settings file keeps an INI-style layout
//! (`[ENVIRONMENT]`, `[APPIUM]`, `[ANDROID]`, `[APP]`) in TOML syntax.
//! Values written as strings are coerced, so `no_reset = "True"` and
//! `no_reset = true` load the same way.

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{Error, Result};

/// Complete settings for one test run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "ENVIRONMENT")]
    pub env: EnvConfig,

    #[serde(rename = "APPIUM")]
    pub appium: AppiumConfig,

    #[serde(rename = "ANDROID")]
    pub android: AndroidConfig,

    #[serde(rename = "APP")]
    pub app: AppSettings,
}

/// `[ENVIRONMENT]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvConfig {
    pub url: String,

    /// Keeps the output folder around after a green run
    #[serde(deserialize_with = "coerce_bool")]
    pub debug: bool,
}

/// `[APPIUM]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppiumConfig {
    #[serde(rename = "appium_host")]
    pub host: String,

    #[serde(rename = "appium_port", deserialize_with = "coerce_int")]
    pub port: u16,

    /// Path prefix for servers that still mount under `/wd/hub`
    #[serde(rename = "appium_base_path", default)]
    pub base_path: String,

    #[serde(deserialize_with = "coerce_bool")]
    pub no_reset: bool,

    #[serde(deserialize_with = "coerce_bool")]
    pub full_reset: bool,

    #[serde(deserialize_with = "coerce_int")]
    pub remote_apps_cache_limit: u32,

    /// Seconds the server waits for a new command before ending the session
    #[serde(deserialize_with = "coerce_int")]
    pub new_command_timeout: u64,

    /// Milliseconds
    #[serde(deserialize_with = "coerce_int")]
    pub uiautomator2_server_install_timeout: u64,

    /// Milliseconds
    #[serde(deserialize_with = "coerce_int")]
    pub adb_exec_timeout: u64,
}

/// `[ANDROID]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AndroidConfig {
    #[serde(rename = "android_connected_device", deserialize_with = "device_type")]
    pub connected_device: DeviceType,

    #[serde(rename = "android_id_physical")]
    pub id_physical: String,

    #[serde(rename = "android_id_wifi")]
    pub id_wifi: String,

    #[serde(rename = "android_id_virtual")]
    pub id_virtual: String,

    #[serde(default = "default_platform_version")]
    pub platform_version: String,
}

/// `[APP]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppSettings {
    /// APK path, relative to the working directory unless absolute
    #[serde(rename = "android_apk")]
    pub apk: PathBuf,

    pub package: String,

    #[serde(default = "default_activity")]
    pub activity: String,
}

fn default_platform_version() -> String {
    "13".to_string()
}

fn default_activity() -> String {
    ".MainActivity".to_string()
}

/// How the target device is connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// USB-attached handset, addressed by serial
    Physical,
    /// adb over TCP, addressed by `host:port`
    Wifi,
    /// Emulator, addressed by AVD name
    Virtual,
}

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [DeviceType::Physical, DeviceType::Wifi, DeviceType::Virtual];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Physical => "PHYSICAL",
            DeviceType::Wifi => "WIFI",
            DeviceType::Virtual => "VIRTUAL",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PHYSICAL" => Ok(DeviceType::Physical),
            "WIFI" => Ok(DeviceType::Wifi),
            "VIRTUAL" => Ok(DeviceType::Virtual),
            _ => Err(Error::UnknownDeviceType(s.to_string())),
        }
    }
}

impl AppConfig {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Parse settings text; `origin` only labels errors
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config_parse(origin, e.message()))
    }

    /// Base URL of the automation server
    pub fn appium_url(&self) -> String {
        let base = self.appium.base_path.trim_end_matches('/');
        let base = if base.is_empty() || base.starts_with('/') {
            base.to_string()
        } else {
            format!("/{}", base)
        };
        format!("http://{}:{}{}", self.appium.host, self.appium.port, base)
    }

    /// Copy of these settings targeting a different device type
    pub fn with_device(mut self, device: DeviceType) -> Self {
        self.android.connected_device = device;
        self
    }
}

/// Parse the boolean spellings accepted in settings files
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn coerce_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    struct BoolVisitor;

    impl<'de> Visitor<'de> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean (true/false, True/False, yes/no, 1/0)")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<bool, E> {
            parse_bool(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(BoolVisitor)
}

fn coerce_int<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + FromStr,
{
    struct IntVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for IntVisitor<T>
    where
        T: TryFrom<i64> + FromStr,
    {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or a numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<T, E> {
            T::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<T, E> {
            i64::try_from(v)
                .ok()
                .and_then(|v| T::try_from(v).ok())
                .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<T, E> {
            v.trim()
                .parse::<T>()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(IntVisitor(PhantomData))
}

fn device_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DeviceType, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(de::Error::custom)
}
