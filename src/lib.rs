//! Florae E2E - UI test automation for the Florae plant tracker
//!
//! Layers, bottom up: a WebDriver client ([`webdriver`]), wait/action/device
//! helpers ([`automation`]), page objects ([`pages`]) and the test bootstrap
//! with its scenarios ([`testing`]).

pub mod automation;
pub mod cli;
pub mod commands;
pub mod common;
pub mod pages;
pub mod testing;
pub mod webdriver;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use webdriver::{Driver, Locator};
