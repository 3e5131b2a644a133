//! Waiting for element conditions
//!
//! All waits share one polling primitive: check, and if unmet, sleep
//! `min(interval, remaining)` until the deadline. A wait therefore returns
//! within `timeout + interval` (plus one check's latency).

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Span;

use crate::common::{Error, Result};
use crate::webdriver::{Driver, ElementId, Locator};

/// Default time to wait for a condition
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time between checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Re-run `check` until it returns `true` or `timeout` elapses
///
/// Returns `Ok(false)` on timeout; errors from the check end the wait.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    // A timeout too large to represent waits without a deadline
    let deadline = Instant::now().checked_add(timeout);

    loop {
        if check().await? {
            return Ok(true);
        }

        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(false);
                }
                interval.min(deadline - now)
            }
            None => interval,
        };
        tokio::time::sleep(pause).await;
    }
}

/// Element states a wait can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Found and displayed
    Visible,
    /// Not found, stale, or not displayed
    Invisible,
    /// Found in the UI tree
    Present,
    /// Found, displayed and enabled
    Clickable,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Visible => "visible",
            Condition::Invisible => "invisible",
            Condition::Present => "present",
            Condition::Clickable => "clickable",
        }
    }

    /// Evaluate the condition once
    pub async fn check(self, driver: &dyn Driver, locator: &Locator) -> Result<bool> {
        let element = match driver.find_element(locator).await {
            Ok(element) => element,
            Err(e) if e.is_element_absent() => return Ok(self == Condition::Invisible),
            Err(e) => return Err(e),
        };

        match self {
            Condition::Present => Ok(true),
            Condition::Visible => Ok(displayed(driver, &element).await?.unwrap_or(false)),
            Condition::Invisible => Ok(!displayed(driver, &element).await?.unwrap_or(false)),
            Condition::Clickable => {
                if !displayed(driver, &element).await?.unwrap_or(false) {
                    return Ok(false);
                }
                match driver.is_enabled(&element).await {
                    Ok(enabled) => Ok(enabled),
                    Err(e) if e.is_element_absent() => Ok(false),
                    Err(e) => Err(e),
                }
            }
        }
    }
}

/// `None` if the element went stale between lookup and query
async fn displayed(driver: &dyn Driver, element: &ElementId) -> Result<Option<bool>> {
    match driver.is_displayed(element).await {
        Ok(shown) => Ok(Some(shown)),
        Err(e) if e.is_element_absent() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Waits on element conditions within one session
pub struct Wait<'a> {
    driver: &'a dyn Driver,
    timeout: Duration,
    interval: Duration,
    span: Span,
}

impl<'a> Wait<'a> {
    pub fn new(driver: &'a dyn Driver, span: Span) -> Self {
        Self {
            driver,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
            span,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Block until `condition` holds for `locator`, or fail with `WaitTimeout`
    pub async fn for_condition(&self, condition: Condition, locator: &Locator) -> Result<()> {
        let driver = self.driver;
        let met = poll_until(self.timeout, self.interval, || condition.check(driver, locator)).await?;

        if met {
            tracing::info!(parent: &self.span, %locator, "Element {} successfully", condition.as_str());
            Ok(())
        } else {
            tracing::error!(
                parent: &self.span,
                %locator,
                timeout_secs = self.timeout.as_secs_f64(),
                "Timeout waiting for element to be {}",
                condition.as_str()
            );
            Err(Error::WaitTimeout {
                condition: condition.as_str(),
                locator: locator.to_string(),
                timeout: self.timeout,
            })
        }
    }

    pub async fn for_element_to_be_visible(&self, locator: &Locator) -> Result<()> {
        self.for_condition(Condition::Visible, locator).await
    }

    pub async fn for_element_to_be_invisible(&self, locator: &Locator) -> Result<()> {
        self.for_condition(Condition::Invisible, locator).await
    }

    pub async fn for_element_to_be_present(&self, locator: &Locator) -> Result<()> {
        self.for_condition(Condition::Present, locator).await
    }

    pub async fn for_element_to_be_clickable(&self, locator: &Locator) -> Result<()> {
        self.for_condition(Condition::Clickable, locator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::simulator::Simulator;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_poll_succeeds_after_known_polls() {
        let calls = Cell::new(0);
        let met = poll_until(Duration::from_secs(2), Duration::from_millis(5), || {
            calls.set(calls.get() + 1);
            let done = calls.get() >= 4;
            async move { Ok(done) }
        })
        .await
        .unwrap();

        assert!(met);
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_poll_times_out_within_one_interval() {
        let timeout = Duration::from_millis(120);
        let interval = Duration::from_millis(40);
        let started = std::time::Instant::now();

        let met = poll_until(timeout, interval, || async { Ok(false) })
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(!met);
        assert!(elapsed >= timeout, "returned early: {elapsed:?}");
        assert!(elapsed < timeout + interval + Duration::from_millis(100), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_poll_propagates_check_errors() {
        let result = poll_until(Duration::from_secs(1), Duration::from_millis(5), || async {
            Err(Error::Internal("boom".into()))
        })
        .await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_unbounded_timeout_still_polls() {
        let calls = Cell::new(0);
        let met = poll_until(Duration::from_secs(u64::MAX), Duration::from_millis(5), || {
            calls.set(calls.get() + 1);
            let done = calls.get() >= 3;
            async move { Ok(done) }
        })
        .await
        .unwrap();

        assert!(met);
        assert_eq!(calls.get(), 3);

        let sim = Simulator::new();
        Wait::new(&sim, Span::none())
            .with_timeout(Duration::from_secs(u64::MAX))
            .for_element_to_be_visible(&crate::pages::home::TODAY_HEADING)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_default_timeout_is_thirty_seconds() {
        let sim = Simulator::new();
        let wait = Wait::new(&sim, Span::none());
        assert_eq!(wait.timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_visible_and_invisible() {
        let sim = Simulator::new();
        let wait = Wait::new(&sim, Span::none())
            .with_timeout(Duration::from_millis(50))
            .with_interval(Duration::from_millis(5));

        let today = crate::pages::home::TODAY_HEADING;
        let save = crate::pages::plant::SAVE_BUTTON;

        wait.for_element_to_be_visible(&today).await.unwrap();
        wait.for_element_to_be_present(&today).await.unwrap();
        wait.for_element_to_be_clickable(&crate::pages::home::ADD_PLANT_BUTTON)
            .await
            .unwrap();
        wait.for_element_to_be_invisible(&save).await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_is_not_masked() {
        let sim = Simulator::new();
        let wait = Wait::new(&sim, Span::none())
            .with_timeout(Duration::from_millis(30))
            .with_interval(Duration::from_millis(5));

        let err = wait
            .for_element_to_be_visible(&crate::pages::plant::SAVE_BUTTON)
            .await
            .unwrap_err();
        match err {
            Error::WaitTimeout { condition, timeout, .. } => {
                assert_eq!(condition, "visible");
                assert_eq!(timeout, Duration::from_millis(30));
            }
            other => panic!("Expected WaitTimeout, got {other:?}"),
        }

        assert!(matches!(
            wait.for_element_to_be_invisible(&crate::pages::home::TODAY_HEADING)
                .await,
            Err(Error::WaitTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_infrastructure_errors_surface_immediately() {
        let sim = Simulator::new();
        sim.fail_next("invalid session id");
        let wait = Wait::new(&sim, Span::none()).with_timeout(Duration::from_secs(5));

        let started = std::time::Instant::now();
        let err = wait
            .for_element_to_be_visible(&crate::pages::home::TODAY_HEADING)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WebDriver { .. }));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
