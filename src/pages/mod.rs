//! Page objects for the Florae screens
//!
//! Each page borrows the session, nests its events under the caller's span
//! and announces itself on construction. Locators are public constants so
//! scenarios and the simulator can refer to them.

pub mod garden;
pub mod home;
pub mod plant;

use std::time::Duration;

use tracing::Span;

use crate::automation::{Action, Wait};
use crate::webdriver::Driver;

pub use garden::GardenPage;
pub use home::HomePage;
pub use plant::{PlantDetails, PlantPage};

/// Session handle and helpers shared by every page
struct PageBase<'a> {
    driver: &'a dyn Driver,
    wait: Wait<'a>,
    action: Action<'a>,
    span: Span,
}

impl<'a> PageBase<'a> {
    fn new(driver: &'a dyn Driver, parent: &Span, name: &'static str) -> Self {
        let span = tracing::info_span!(parent: parent, "page", name);
        tracing::info!(parent: &span, "Interacting with: {} Page", name);

        Self {
            driver,
            wait: Wait::new(driver, span.clone()),
            action: Action::new(driver, span.clone()),
            span,
        }
    }

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.wait = self.wait.with_timeout(timeout);
        self
    }
}
