//! Bounded retry for contended system resources.
//!
//! The OS offers no way to wait for the clipboard lock to be released, so
//! writers poll: try, sleep a fixed delay, try again, give up after a fixed
//! number of attempts. Sleeping goes through [`Sleeper`] so tests can run the
//! loop without real delays.

use std::time::Duration;

/// Blocking delay, injectable for tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper: `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause between consecutive attempts (not after the last one).
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(50),
        }
    }
}

/// The loop gave up: attempts ran out or the error was not worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// Attempts actually made.
    pub attempts: u32,
    pub last_error: E,
}

/// Run `op` until it succeeds or the policy's attempts are used up.
pub fn retry<T, E>(
    policy: &RetryPolicy,
    sleeper: &impl Sleeper,
    op: impl FnMut() -> Result<T, E>,
) -> Result<T, RetryExhausted<E>> {
    retry_if(policy, sleeper, |_| true, op)
}

/// Like [`retry`], but stops at the first error `is_transient` rejects.
pub fn retry_if<T, E>(
    policy: &RetryPolicy,
    sleeper: &impl Sleeper,
    is_transient: impl Fn(&E) -> bool,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, RetryExhausted<E>> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(last_error) if attempt >= attempts || !is_transient(&last_error) => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error,
                });
            }
            Err(_) => {
                sleeper.sleep(policy.delay);
                attempt += 1;
            }
        }
    }
}

/// Recording sleeper for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;

    /// Records requested delays instead of sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub sleeps: RefCell<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn total(&self) -> Duration {
            self.sleeps.borrow().iter().sum()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }
}
