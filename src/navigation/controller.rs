//! Navigation controller - drives one browser session through gated pages
//!
//! This module contains the per-URL navigation loop:
//! - adaptive pre-navigation pacing
//! - challenge detection after each load
//! - the solve-then-wait sub-loop with idle interaction
//! - retry with backoff until the attempt budget is spent

use crate::browser::{DriverError, DriverResult, PageDriver};
use crate::navigation::challenge::{
    ChallengeProbe, ChallengeState, IDLE_INTERACTION_SCRIPT, SOLVE_SCRIPT,
};
use crate::navigation::retry::{Pacer, RetryPolicy};
use crate::FailureKind;
use std::time::{Duration, Instant};

/// Outcome of one `navigate_with_retry` call
///
/// Produced once per call and consumed immediately by the caller; never
/// persisted.
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Whether the page is loaded and clear of challenges
    pub success: bool,

    /// Whether a challenge was seen at any point during the call
    pub challenge_encountered: bool,

    /// Wall-clock time the whole call took
    pub elapsed: Duration,

    /// Terminal classification when `success` is false
    pub failure: Option<FailureKind>,
}

impl NavigationResult {
    /// Elapsed wall-clock time in seconds
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Drives one browser session; owns the driver for its lifetime
pub struct NavigationController<D> {
    driver: D,
    policy: RetryPolicy,
    pacer: Pacer,
    probe: ChallengeProbe,
}

impl<D: PageDriver> NavigationController<D> {
    /// Creates a controller over a driver
    pub fn new(driver: D, policy: RetryPolicy, probe: ChallengeProbe) -> Self {
        let pacer = Pacer::new(policy.clone());
        Self {
            driver,
            policy,
            pacer,
            probe,
        }
    }

    /// Mutable access to the underlying driver, for page reads between
    /// navigations (identity, snapshot assembly)
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Consumes the controller and returns the driver
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Number of consecutive challenge-free navigations
    pub fn clear_streak(&self) -> u32 {
        self.pacer.clear_streak()
    }

    /// Navigates to `url`, clearing challenges where mechanically possible
    ///
    /// Retries up to `max_retries` attempts. Only a batch-fatal driver
    /// failure is returned as `Err`; every retryable condition ends up in
    /// the returned [`NavigationResult`].
    pub async fn navigate_with_retry(
        &mut self,
        url: &str,
        max_retries: u32,
    ) -> DriverResult<NavigationResult> {
        let started = Instant::now();
        let attempts = max_retries.max(1);
        let mut challenge_seen = false;

        for attempt in 1..=attempts {
            let delay = self.pacer.pre_navigation_delay(attempt);
            if !delay.is_zero() {
                tracing::debug!("Attempt {}/{}: pacing {:?} before {}", attempt, attempts, delay, url);
                tokio::time::sleep(delay).await;
            }

            match self.driver.navigate(url).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Attempt {}/{} failed to load {}: {}", attempt, attempts, url, e);
                    continue;
                }
            }

            let state = match self.classify_current().await {
                Ok(s) => s,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Attempt {}/{}: could not read page state: {}", attempt, attempts, e);
                    continue;
                }
            };

            match state {
                ChallengeState::None => {
                    self.pacer.record_clear_navigation();
                    return Ok(NavigationResult {
                        success: true,
                        challenge_encountered: challenge_seen,
                        elapsed: started.elapsed(),
                        failure: None,
                    });
                }
                _ => {
                    challenge_seen = true;
                    self.pacer.record_challenge();
                    tracing::info!("Challenge detected on {} (attempt {}/{})", url, attempt, attempts);

                    match self.wait_out_challenge().await? {
                        ChallengeState::Passed => {
                            tracing::info!("Challenge passed on {}", url);
                            return Ok(NavigationResult {
                                success: true,
                                challenge_encountered: true,
                                elapsed: started.elapsed(),
                                failure: None,
                            });
                        }
                        other => {
                            tracing::warn!(
                                "Challenge wait ended in state '{}' on {} (attempt {}/{})",
                                other,
                                url,
                                attempt,
                                attempts
                            );
                        }
                    }
                }
            }
        }

        Ok(NavigationResult {
            success: false,
            challenge_encountered: challenge_seen,
            elapsed: started.elapsed(),
            failure: Some(FailureKind::NavigationBlocked),
        })
    }

    /// Reads title and source and classifies the current page
    async fn classify_current(&mut self) -> DriverResult<ChallengeState> {
        let title = self.driver.title().await?;
        let source = self.driver.page_source().await?;
        Ok(self.probe.classify(&title, &source))
    }

    /// One best-effort solve action, then poll until the page clears or the
    /// wall-clock ceiling is reached
    ///
    /// Each poll tick applies the idle-interaction script; that exists only
    /// to avoid idle-session detection while waiting.
    async fn wait_out_challenge(&mut self) -> DriverResult<ChallengeState> {
        tracing::debug!("Challenge state: {}", ChallengeState::Solving);
        match self.driver.execute_script(SOLVE_SCRIPT).await {
            Err(e) if e.is_fatal() => return Err(e),
            _ => {}
        }

        let waited = Instant::now();
        loop {
            if waited.elapsed() >= self.policy.poll_ceiling {
                return Ok(ChallengeState::TimedOut);
            }

            tokio::time::sleep(self.policy.poll_interval).await;

            match self.driver.execute_script(IDLE_INTERACTION_SCRIPT).await {
                Err(e) if e.is_fatal() => return Err(e),
                _ => {}
            }

            match self.classify_current().await {
                Ok(ChallengeState::None) => return Ok(ChallengeState::Passed),
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::debug!("Poll read failed, keeping on: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use async_trait::async_trait;

    /// Driver that serves a fixed sequence of page states; the last state
    /// repeats forever. One state is consumed per `page_source` read.
    struct FakeDriver {
        states: Vec<(String, String)>,
        reads: usize,
        navigations: u32,
        fail_navigation: Option<DriverError>,
    }

    impl FakeDriver {
        fn serving(states: Vec<(&str, &str)>) -> Self {
            Self {
                states: states
                    .into_iter()
                    .map(|(t, s)| (t.to_string(), s.to_string()))
                    .collect(),
                reads: 0,
                navigations: 0,
                fail_navigation: None,
            }
        }

        fn current(&self) -> &(String, String) {
            let idx = self.reads.min(self.states.len() - 1);
            &self.states[idx]
        }
    }

    #[async_trait]
    impl PageDriver for FakeDriver {
        async fn navigate(&mut self, url: &str) -> DriverResult<()> {
            self.navigations += 1;
            match self.fail_navigation.take() {
                Some(e) => Err(e),
                None => {
                    let _ = url;
                    Ok(())
                }
            }
        }

        async fn execute_script(&mut self, _script: &str) -> DriverResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn title(&mut self) -> DriverResult<String> {
            Ok(self.current().0.clone())
        }

        async fn page_source(&mut self) -> DriverResult<String> {
            let source = self.current().1.clone();
            self.reads += 1;
            Ok(source)
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_min: Duration::ZERO,
            base_delay_max: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            poll_ceiling: Duration::from_millis(50),
        }
    }

    fn create_controller(driver: FakeDriver, max_attempts: u32) -> NavigationController<FakeDriver> {
        let probe = ChallengeProbe::from_site(&SiteConfig::default());
        NavigationController::new(driver, fast_policy(max_attempts), probe)
    }

    #[tokio::test]
    async fn test_clear_page_succeeds_first_attempt() {
        let driver = FakeDriver::serving(vec![("Telefon Fiyatları", "<html>offers</html>")]);
        let mut controller = create_controller(driver, 3);

        let result = controller
            .navigate_with_retry("https://example.com/p,1.html", 3)
            .await
            .unwrap();

        assert!(result.success);
        assert!(!result.challenge_encountered);
        assert!(result.failure.is_none());
        assert_eq!(controller.clear_streak(), 1);
        assert_eq!(controller.driver_mut().navigations, 1);
    }

    #[tokio::test]
    async fn test_permanent_challenge_blocks_after_exact_attempts() {
        let driver = FakeDriver::serving(vec![("Bir dakika...", "<html>wait</html>")]);
        let mut controller = create_controller(driver, 2);

        let result = controller
            .navigate_with_retry("https://example.com/p,1.html", 2)
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.challenge_encountered);
        assert_eq!(result.failure, Some(FailureKind::NavigationBlocked));
        // Exactly two navigation attempts, no more
        assert_eq!(controller.driver_mut().navigations, 2);
    }

    #[tokio::test]
    async fn test_challenge_clears_during_poll() {
        // First read shows the challenge; subsequent polls see a clear page
        let driver = FakeDriver::serving(vec![
            ("Bir dakika...", "<html>wait</html>"),
            ("Telefon Fiyatları", "<html>offers</html>"),
        ]);
        let mut controller = create_controller(driver, 3);

        let result = controller
            .navigate_with_retry("https://example.com/p,1.html", 3)
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.challenge_encountered);
        assert_eq!(controller.driver_mut().navigations, 1);
        // Passing a challenge does not count toward the clear streak
        assert_eq!(controller.clear_streak(), 0);
    }

    #[tokio::test]
    async fn test_fatal_driver_error_propagates() {
        let mut driver = FakeDriver::serving(vec![("x", "y")]);
        driver.fail_navigation = Some(DriverError::Disconnected("gone".to_string()));
        let mut controller = create_controller(driver, 3);

        let result = controller
            .navigate_with_retry("https://example.com/p,1.html", 3)
            .await;

        assert!(matches!(result, Err(DriverError::Disconnected(_))));
    }

    #[tokio::test]
    async fn test_retryable_navigation_error_consumes_attempt() {
        let mut driver = FakeDriver::serving(vec![("Telefon Fiyatları", "<html>ok</html>")]);
        driver.fail_navigation = Some(DriverError::Timeout {
            url: "https://example.com/p,1.html".to_string(),
        });
        let mut controller = create_controller(driver, 2);

        let result = controller
            .navigate_with_retry("https://example.com/p,1.html", 2)
            .await
            .unwrap();

        // First attempt timed out, second succeeded
        assert!(result.success);
        assert_eq!(controller.driver_mut().navigations, 2);
    }

    #[tokio::test]
    async fn test_streak_accumulates_across_calls() {
        let driver = FakeDriver::serving(vec![("Fiyat", "<html>a</html>")]);
        let mut controller = create_controller(driver, 1);

        for _ in 0..3 {
            let result = controller
                .navigate_with_retry("https://example.com/p,1.html", 1)
                .await
                .unwrap();
            assert!(result.success);
        }

        assert_eq!(controller.clear_streak(), 3);
    }
}
