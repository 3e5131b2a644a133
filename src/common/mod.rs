//! Common utilities shared by the helpers, pages and the runner

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod paths;

pub use config::{AppConfig, DeviceType};
pub use error::{Error, Result};
pub use output::OutputDir;
