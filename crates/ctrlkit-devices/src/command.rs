/*!
 * Fire-and-poll command execution.
 *
 * Some backends run an operation in their own context and only let callers
 * start it and later ask whether it has finished. [`CommandExecutor`] turns
 * such a pair of calls into one blocking (or awaitable) call.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace, warn};

use ctrlkit_core::config::CommandConfig;
use ctrlkit_core::types::Value;

/// Interval between completion checks unless configured otherwise
pub const DEFAULT_COMPLETION_INTERVAL: Duration = Duration::from_millis(100);

/// A target that can start a named operation and report when it has finished.
///
/// For every operation name the target supports, `launch` must return without
/// waiting for the work to finish, and `is_complete` must eventually return
/// `true` once it has.
pub trait AsyncCapable {
    /// Error raised by the target
    type Error;

    /// Start the named operation
    fn launch(&self, name: &str, args: &[Value]) -> Result<(), Self::Error>;

    /// Whether the named operation has finished
    fn is_complete(&self, name: &str) -> Result<bool, Self::Error>;
}

/// Error type for command execution
#[derive(Error, Debug)]
pub enum ExecError<E> {
    /// The target failed to launch or report on the command
    #[error("Command target error: {0}")]
    Target(E),

    /// The command did not complete before the deadline
    #[error("Command '{0}' did not complete within {1:?}")]
    Timeout(String, Duration),

    /// The command wait was cancelled
    #[error("Command '{0}' was cancelled")]
    Cancelled(String),
}

impl<E> ExecError<E> {
    /// The target's own error, if that is what ended execution
    pub fn into_target(self) -> Option<E> {
        match self {
            ExecError::Target(e) => Some(e),
            _ => None,
        }
    }
}

/// A flag that stops a pending command wait when set.
///
/// Cloning shares the flag, so a clone handed to another thread can cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs commands on [`AsyncCapable`] targets and waits for them to complete.
///
/// The default executor waits forever and cannot be cancelled. A deadline or a
/// [`CancelFlag`] can be added; both are checked between completion polls.
/// Launch and completion-check errors are returned as-is, without retry.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    interval: Duration,
    deadline: Option<Duration>,
    cancel: Option<CancelFlag>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    /// Unbounded executor polling every [`DEFAULT_COMPLETION_INTERVAL`]
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_COMPLETION_INTERVAL,
            deadline: None,
            cancel: None,
        }
    }

    /// Create an executor from configuration
    pub fn from_config(config: &CommandConfig) -> Self {
        Self {
            interval: config.interval(),
            deadline: config.deadline(),
            cancel: None,
        }
    }

    /// Set the interval between completion checks
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Fail with [`ExecError::Timeout`] if the command is not complete after `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fail with [`ExecError::Cancelled`] once `flag` is set
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Interval between completion checks
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Configured deadline, if any
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Launch `name` on `target` and block until it completes
    pub fn execute<T>(&self, target: &T, name: &str, args: &[Value]) -> Result<(), ExecError<T::Error>>
    where
        T: AsyncCapable + ?Sized,
    {
        let deadline = self.launch(target, name, args)?;
        let mut polls: u64 = 0;

        loop {
            polls = polls.saturating_add(1);
            if target.is_complete(name).map_err(ExecError::Target)? {
                debug!(command = %name, polls, "Command complete");
                return Ok(());
            }
            self.check_bounds::<T::Error>(name, deadline)?;
            thread::sleep(self.interval);
        }
    }

    /// Launch `name` on `target` and wait for it without blocking the runtime
    pub async fn execute_async<T>(
        &self,
        target: &T,
        name: &str,
        args: &[Value],
    ) -> Result<(), ExecError<T::Error>>
    where
        T: AsyncCapable + ?Sized,
    {
        let deadline = self.launch(target, name, args)?;
        let mut polls: u64 = 0;

        loop {
            polls = polls.saturating_add(1);
            if target.is_complete(name).map_err(ExecError::Target)? {
                debug!(command = %name, polls, "Command complete");
                return Ok(());
            }
            self.check_bounds::<T::Error>(name, deadline)?;
            tokio::time::sleep(self.interval).await;
        }
    }

    fn launch<T>(&self, target: &T, name: &str, args: &[Value]) -> Result<Option<Instant>, ExecError<T::Error>>
    where
        T: AsyncCapable + ?Sized,
    {
        trace!(command = %name, args = args.len(), "Launching command");
        target.launch(name, args).map_err(ExecError::Target)?;
        Ok(self.deadline.and_then(|d| Instant::now().checked_add(d)))
    }

    fn check_bounds<E>(&self, name: &str, deadline: Option<Instant>) -> Result<(), ExecError<E>> {
        if self.cancel.as_ref().map_or(false, CancelFlag::is_cancelled) {
            warn!(command = %name, "Command wait cancelled");
            return Err(ExecError::Cancelled(name.to_string()));
        }
        if let (Some(at), Some(limit)) = (deadline, self.deadline) {
            if Instant::now() >= at {
                warn!(command = %name, ?limit, "Command timed out");
                return Err(ExecError::Timeout(name.to_string(), limit));
            }
        }
        Ok(())
    }
}

/// Launch `name` on `target` and block until it reports completion.
///
/// Completion is polled every [`DEFAULT_COMPLETION_INTERVAL`] with no deadline;
/// use a configured [`CommandExecutor`] to bound or cancel the wait.
pub fn exec_async<T>(target: &T, name: &str, args: &[Value]) -> Result<(), ExecError<T::Error>>
where
    T: AsyncCapable + ?Sized,
{
    CommandExecutor::new().execute(target, name, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Completes a command after a fixed number of polls
    struct ScriptedTarget {
        polls_needed: u32,
        polls: Cell<u32>,
        launched: RefCell<Vec<(String, Vec<Value>)>>,
        fail_launch: bool,
    }

    impl ScriptedTarget {
        fn new(polls_needed: u32) -> Self {
            Self {
                polls_needed,
                polls: Cell::new(0),
                launched: RefCell::new(Vec::new()),
                fail_launch: false,
            }
        }
    }

    impl AsyncCapable for ScriptedTarget {
        type Error = String;

        fn launch(&self, name: &str, args: &[Value]) -> Result<(), String> {
            if self.fail_launch {
                return Err(format!("cannot launch {}", name));
            }
            self.launched.borrow_mut().push((name.to_string(), args.to_vec()));
            Ok(())
        }

        fn is_complete(&self, _name: &str) -> Result<bool, String> {
            self.polls.set(self.polls.get() + 1);
            Ok(self.polls.get() >= self.polls_needed)
        }
    }

    #[test]
    fn test_exec_async_waits_for_completion() {
        let target = ScriptedTarget::new(2);
        let start = Instant::now();
        exec_async(&target, "update_ref_clock", &[Value::from("internal")]).unwrap();

        assert_eq!(target.polls.get(), 2);
        assert_eq!(
            target.launched.borrow().as_slice(),
            &[("update_ref_clock".to_string(), vec![Value::from("internal")])]
        );
        assert!(start.elapsed() >= DEFAULT_COMPLETION_INTERVAL);
    }

    #[test]
    fn test_completed_immediately_does_not_sleep() {
        let target = ScriptedTarget::new(1);
        let start = Instant::now();
        exec_async(&target, "noop", &[]).unwrap();
        assert!(start.elapsed() < DEFAULT_COMPLETION_INTERVAL);
    }

    #[test]
    fn test_launch_error_propagates_without_polling() {
        let mut target = ScriptedTarget::new(1);
        target.fail_launch = true;

        let err = exec_async(&target, "set_gain", &[Value::Float(3.5)]).unwrap_err();
        assert_eq!(err.into_target(), Some("cannot launch set_gain".to_string()));
        assert_eq!(target.polls.get(), 0);
    }

    #[test]
    fn test_deadline_times_out() {
        let target = ScriptedTarget::new(u32::MAX);
        let executor = CommandExecutor::new()
            .with_interval(Duration::from_millis(5))
            .with_deadline(Duration::from_millis(30));

        let err = executor.execute(&target, "tune", &[]).unwrap_err();
        assert!(matches!(err, ExecError::Timeout(ref name, d) if name == "tune" && d == Duration::from_millis(30)));
        assert!(target.polls.get() > 1);
    }

    #[test]
    fn test_zero_interval() {
        let target = ScriptedTarget::new(50_000);
        CommandExecutor::new()
            .with_interval(Duration::ZERO)
            .execute(&target, "load_image", &[])
            .unwrap();
        assert_eq!(target.polls.get(), 50_000);

        let hung = ScriptedTarget::new(u32::MAX);
        let err = CommandExecutor::from_config(&CommandConfig {
            interval_ms: 0,
            timeout_ms: 20,
        })
        .execute(&hung, "load_image", &[])
        .unwrap_err();
        assert!(matches!(err, ExecError::Timeout(_, _)));
        assert!(hung.polls.get() > 1);
    }

    #[test]
    fn test_cancel_flag_stops_wait() {
        let target = ScriptedTarget::new(u32::MAX);
        let flag = CancelFlag::new();
        flag.cancel();
        let executor = CommandExecutor::new().with_cancel_flag(flag);

        let err = executor.execute(&target, "tune", &[]).unwrap_err();
        assert!(matches!(err, ExecError::Cancelled(_)));
        assert_eq!(target.polls.get(), 1);
    }

    #[test]
    fn test_from_config() {
        let executor = CommandExecutor::from_config(&CommandConfig {
            interval_ms: 20,
            timeout_ms: 0,
        });
        assert_eq!(executor.interval(), Duration::from_millis(20));
        assert_eq!(executor.deadline(), None);

        let executor = CommandExecutor::from_config(&CommandConfig {
            interval_ms: 20,
            timeout_ms: 500,
        });
        assert_eq!(executor.deadline(), Some(Duration::from_millis(500)));
    }

    #[tokio::test]
    async fn test_execute_async() {
        let target = ScriptedTarget::new(3);
        CommandExecutor::new()
            .with_interval(Duration::from_millis(1))
            .execute_async(&target, "init", &[])
            .await
            .unwrap();
        assert_eq!(target.polls.get(), 3);
    }
}
