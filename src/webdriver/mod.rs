//! WebDriver / Appium session layer
//!
//! This module holds the `Driver` seam used by every helper, the HTTP
//! client that implements it against an Appium server, and the capability
//! builder used to open sessions.

pub mod capabilities;
pub mod client;
pub mod driver;
pub mod types;

pub use capabilities::Capabilities;
pub use client::AppiumClient;
pub use driver::Driver;
pub use types::*;
