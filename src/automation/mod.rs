//! Automation helpers shared by pages and tests
//!
//! Each helper borrows the session and takes the caller's span, so its
//! events nest under the page or test that owns it.

pub mod action;
pub mod device;
pub mod keycodes;
pub mod wait;

pub use action::{Action, SeekDirection, DEFAULT_MAX_SWIPES};
pub use device::Device;
pub use wait::{Condition, Wait};
