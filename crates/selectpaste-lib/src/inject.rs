//! Paste injection — borrow the system clipboard, send Ctrl+V, give it back.
//!
//! Sequence for one [`ClipboardInjector::inject`] call:
//!
//! 1. wait `focus_delay` so focus can return to the target window
//! 2. snapshot current clipboard text (best effort)
//! 3. write the text, retrying while another process holds the lock; if every
//!    attempt fails, or the failure is not contention, stop here: no keys
//!    sent, clipboard untouched
//! 4. send the Ctrl+V chord as one batch
//! 5. wait `settle_delay` for the target to read the clipboard
//! 6. restore the snapshot, once, if there was one
//!
//! Step 5 is a heuristic. A slow target can still read the clipboard after it
//! has been restored and paste the old contents. Other processes polling the
//! clipboard will see the injected text for the duration of the call.

use std::fmt;
use std::time::Duration;

use crate::clipboard::{ClipboardAccess, ClipboardError, ClipboardSnapshot};
use crate::input::{InputError, KeySender, paste_chord};
use crate::retry::{RetryPolicy, Sleeper, retry_if};

/// Timing and retry parameters for injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectConfig {
    /// Clipboard write retries.
    pub retry: RetryPolicy,
    /// Pause before touching the clipboard.
    pub focus_delay: Duration,
    /// Pause between the paste chord and clipboard restore.
    pub settle_delay: Duration,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            focus_delay: Duration::from_millis(50),
            settle_delay: Duration::from_millis(200),
        }
    }
}

/// What happened to the user's previous clipboard text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardRestore {
    Restored,
    /// The clipboard held no text before; it keeps the injected text.
    NothingToRestore,
    /// Restore was attempted once and failed.
    Failed(ClipboardError),
}

/// Result of one injection.
#[derive(Debug)]
pub enum InjectOutcome {
    /// Chord sent.
    Pasted { restore: ClipboardRestore },
    /// The clipboard could not be written; nothing was sent or changed.
    Dropped {
        attempts: u32,
        error: ClipboardError,
    },
    /// The clipboard was written but the chord submission failed.
    InputFailed {
        error: InputError,
        restore: ClipboardRestore,
    },
}

impl InjectOutcome {
    pub fn is_pasted(&self) -> bool {
        matches!(self, InjectOutcome::Pasted { .. })
    }
}

impl fmt::Display for InjectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let restore_text = |r: &ClipboardRestore| match r {
            ClipboardRestore::Restored => "clipboard restored".to_string(),
            ClipboardRestore::NothingToRestore => "clipboard had no text to restore".to_string(),
            ClipboardRestore::Failed(e) => format!("restore failed: {e}"),
        };
        match self {
            InjectOutcome::Pasted { restore } => write!(f, "pasted ({})", restore_text(restore)),
            InjectOutcome::Dropped { attempts, error } => {
                write!(f, "dropped after {attempts} attempt(s): {error}")
            }
            InjectOutcome::InputFailed { error, restore } => {
                write!(f, "{error} ({})", restore_text(restore))
            }
        }
    }
}

/// Performs clipboard-based paste injection with the given capabilities.
pub struct ClipboardInjector<C, K, S> {
    clipboard: C,
    keys: K,
    sleeper: S,
    config: InjectConfig,
}

impl<C: ClipboardAccess, K: KeySender, S: Sleeper> ClipboardInjector<C, K, S> {
    pub fn new(clipboard: C, keys: K, sleeper: S, config: InjectConfig) -> Self {
        Self {
            clipboard,
            keys,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &InjectConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: InjectConfig) {
        self.config = config;
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Paste `text` into the focused application. Blocks for the configured
    /// delays; never aborts once the clipboard has been written.
    pub fn inject(&self, text: &str) -> InjectOutcome {
        if !self.config.focus_delay.is_zero() {
            self.sleeper.sleep(self.config.focus_delay);
        }

        let snapshot = ClipboardSnapshot::capture(&self.clipboard);

        if let Err(exhausted) = retry_if(
            &self.config.retry,
            &self.sleeper,
            ClipboardError::is_transient,
            || self.clipboard.set_text(text),
        ) {
            return InjectOutcome::Dropped {
                attempts: exhausted.attempts,
                error: exhausted.last_error,
            };
        }

        let sent = self.keys.send(&paste_chord());

        self.sleeper.sleep(self.config.settle_delay);

        let restore = self.restore(snapshot);
        match sent {
            Ok(()) => InjectOutcome::Pasted { restore },
            Err(error) => InjectOutcome::InputFailed { error, restore },
        }
    }

    fn restore(&self, snapshot: ClipboardSnapshot) -> ClipboardRestore {
        let Some(previous) = snapshot.text else {
            return ClipboardRestore::NothingToRestore;
        };
        match self.clipboard.set_text(&previous) {
            Ok(()) => ClipboardRestore::Restored,
            Err(e) => ClipboardRestore::Failed(e),
        }
    }
}
