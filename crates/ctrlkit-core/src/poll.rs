/*!
 * Timeout-bounded polling.
 *
 * A predicate is called repeatedly, with a fixed sleep between negative
 * answers, until it reports success or the deadline passes. The blocking
 * variants sleep the calling thread; the `_async` variants yield to tokio.
 */
use std::convert::Infallible;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::PollingConfig;

/// Deadline `timeout` from now, or `None` if it does not fit in an `Instant`
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

fn before(deadline: Option<Instant>) -> bool {
    deadline.map_or(true, |d| Instant::now() < d)
}

/// Call `state_check` every `interval` until it returns `true` or `timeout`
/// has elapsed.
///
/// Returns `true` as soon as the predicate succeeds, without sleeping again.
/// If `interval` is larger than `timeout` the predicate runs exactly once and
/// the full interval is still slept before returning `false`.
pub fn poll_with_timeout<F>(mut state_check: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> bool,
{
    match try_poll_with_timeout(|| Ok::<_, Infallible>(state_check()), timeout, interval) {
        Ok(ready) => ready,
        Err(never) => match never {},
    }
}

/// Like [`poll_with_timeout`], but for predicates that can fail.
///
/// The first error returned by `state_check` ends polling and is passed back
/// unchanged.
pub fn try_poll_with_timeout<F, E>(
    mut state_check: F,
    timeout: Duration,
    interval: Duration,
) -> Result<bool, E>
where
    F: FnMut() -> Result<bool, E>,
{
    let deadline = deadline_after(timeout);
    let mut attempts: u64 = 0;

    while before(deadline) {
        attempts = attempts.saturating_add(1);
        if state_check()? {
            trace!(attempts, "Poll condition met");
            return Ok(true);
        }
        thread::sleep(interval);
    }

    debug!(attempts, timeout_ms = timeout.as_millis() as u64, "Poll timed out");
    Ok(false)
}

/// Async variant of [`poll_with_timeout`] that sleeps with `tokio::time::sleep`
pub async fn poll_with_timeout_async<F>(
    mut state_check: F,
    timeout: Duration,
    interval: Duration,
) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = deadline_after(timeout);
    let mut attempts: u64 = 0;

    while before(deadline) {
        attempts = attempts.saturating_add(1);
        if state_check() {
            trace!(attempts, "Poll condition met");
            return true;
        }
        tokio::time::sleep(interval).await;
    }

    debug!(attempts, timeout_ms = timeout.as_millis() as u64, "Poll timed out");
    false
}

/// A timeout and interval pair for repeated polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
}

impl Poller {
    /// Create a poller
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Create a poller from configuration
    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.timeout(), config.interval())
    }

    /// Total time a predicate has to succeed
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sleep between predicate calls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// See [`poll_with_timeout`]
    pub fn poll<F: FnMut() -> bool>(&self, state_check: F) -> bool {
        poll_with_timeout(state_check, self.timeout, self.interval)
    }

    /// See [`try_poll_with_timeout`]
    pub fn try_poll<F, E>(&self, state_check: F) -> Result<bool, E>
    where
        F: FnMut() -> Result<bool, E>,
    {
        try_poll_with_timeout(state_check, self.timeout, self.interval)
    }

    /// See [`poll_with_timeout_async`]
    pub async fn poll_async<F: FnMut() -> bool>(&self, state_check: F) -> bool {
        poll_with_timeout_async(state_check, self.timeout, self.interval).await
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}
