//! Error types for the test suite
//!
//! Infrastructure failures (config, transport, remote commands) and
//! assertion-level test failures share one enum so helpers can propagate
//! with `?` while the bootstrap still tells them apart.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// W3C error code for a locator that matched nothing
pub const NO_SUCH_ELEMENT: &str = "no such element";

/// W3C error code for an element that left the UI tree
pub const STALE_ELEMENT: &str = "stale element reference";

/// Main error type for the test suite
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file '{path}': {message}")]
    ConfigParse { path: String, message: String },

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Unknown device type '{0}'. Expected one of: PHYSICAL, WIFI, VIRTUAL")]
    UnknownDeviceType(String),

    // === Session / Transport Errors ===
    #[error("Failed to create session at {url}: {message}")]
    SessionNotCreated { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver error '{code}': {message}")]
    WebDriver { code: String, message: String },

    #[error("Unexpected response from automation server: {0}")]
    Protocol(String),

    // === Wait Errors ===
    #[error("Timed out after {}s waiting for element to be {condition}: {locator}", .timeout.as_secs_f64())]
    WaitTimeout {
        condition: &'static str,
        locator: String,
        timeout: Duration,
    },

    #[error("Element {locator} not reachable after {swipes} swipes")]
    ElementNotReachable { locator: String, swipes: u32 },

    // === Device Errors ===
    #[error("Failed to take screenshot: {source}")]
    Screenshot {
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to refresh app {package}: {source}")]
    AppRefresh {
        package: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to switch to context {context}: {source}")]
    ContextSwitch {
        context: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to switch to {wanted}. Available contexts: {}", .available.join(", "))]
    ContextNotFound {
        wanted: String,
        available: Vec<String>,
    },

    #[error("Failed to map string ({value}) to keycodes, invalid character: ({character})")]
    UnmappableKeycode { value: String, character: char },

    // === Test Errors ===
    #[error("Test failed: {0}")]
    TestFailure(String),

    #[error("Unknown scenario '{name}'. Available: {available}")]
    UnknownScenario { name: String, available: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write '{}': {error}", .path.display())]
    FileWrite { path: PathBuf, error: io::Error },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a config parse error for a file
    pub fn config_parse(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        Self::ConfigParse {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a remote command error from a W3C error body
    pub fn webdriver(code: &str, message: &str) -> Self {
        Self::WebDriver {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Shorthand for the "no such element" remote error
    pub fn no_such_element(locator: impl std::fmt::Display) -> Self {
        Self::webdriver(
            NO_SUCH_ELEMENT,
            &format!("An element could not be located using {}", locator),
        )
    }

    /// True if the remote side reported that nothing matched the locator
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, Self::WebDriver { code, .. } if code == NO_SUCH_ELEMENT)
    }

    /// True if the element is missing or went stale; waits treat this as "not yet"
    pub fn is_element_absent(&self) -> bool {
        matches!(
            self,
            Self::WebDriver { code, .. } if code == NO_SUCH_ELEMENT || code == STALE_ELEMENT
        )
    }

    /// Wrap a failure from a screenshot attempt
    pub fn screenshot(source: Error) -> Self {
        Self::Screenshot {
            source: Box::new(source),
        }
    }

    /// Wrap a failure from an app restart
    pub fn app_refresh(package: &str, source: Error) -> Self {
        Self::AppRefresh {
            package: package.to_string(),
            source: Box::new(source),
        }
    }

    /// Wrap a failure from a context switch
    pub fn context_switch(context: &str, source: Error) -> Self {
        Self::ContextSwitch {
            context: context.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_absent_classification() {
        assert!(Error::no_such_element("id=foo").is_element_absent());
        assert!(Error::no_such_element("id=foo").is_no_such_element());
        assert!(Error::webdriver(STALE_ELEMENT, "gone").is_element_absent());
        assert!(!Error::webdriver(STALE_ELEMENT, "gone").is_no_such_element());
        assert!(!Error::webdriver("invalid session id", "x").is_element_absent());
        assert!(!Error::Internal("x".into()).is_element_absent());
    }

    #[test]
    fn test_wrapped_errors_keep_cause() {
        let err = Error::app_refresh("cat.naval.florae", Error::webdriver("unknown error", "adb died"));
        assert!(err.to_string().contains("cat.naval.florae"));
        let source = err.source().expect("cause preserved");
        assert!(source.to_string().contains("adb died"));
    }

    #[test]
    fn test_keycode_error_names_character() {
        let err = Error::UnmappableKeycode {
            value: "06-01".into(),
            character: '-',
        };
        assert!(err.to_string().contains("(-)"));
        assert!(err.to_string().contains("06-01"));
    }

    #[test]
    fn test_wait_timeout_message() {
        let err = Error::WaitTimeout {
            condition: "visible",
            locator: "id=heading".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 30s waiting for element to be visible: id=heading"
        );
    }
}
