//! System clipboard access — trait + `arboard` backend.

use std::cell::RefCell;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// Another process holds the clipboard lock. Worth retrying.
    Busy(String),
    /// Any other clipboard failure.
    Unavailable(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Busy(e) => write!(f, "Clipboard busy: {e}"),
            ClipboardError::Unavailable(e) => write!(f, "Clipboard unavailable: {e}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

impl ClipboardError {
    /// Whether trying again shortly may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClipboardError::Busy(_))
    }
}

pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Text access to the shared system clipboard.
pub trait ClipboardAccess {
    /// Current text contents, or `None` if the clipboard holds no text.
    fn get_text(&self) -> Result<Option<String>>;
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Prior clipboard text, held for the duration of one injection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub text: Option<String>,
}

impl ClipboardSnapshot {
    /// Best-effort capture. Read failures count as "no text".
    pub fn capture(clipboard: &impl ClipboardAccess) -> Self {
        let text = match clipboard.get_text() {
            Ok(text) => text,
            Err(e) => {
                log::debug!("[clipboard] snapshot skipped: {e}");
                None
            }
        };
        Self { text }
    }

    pub fn had_text(&self) -> bool {
        self.text.is_some()
    }
}

// ── arboard implementation ──

/// Clipboard backed by `arboard`.
///
/// The handle is kept for the lifetime of the app: on X11, text we set is only
/// served while an `arboard::Clipboard` is alive.
pub struct ArboardClipboard {
    inner: RefCell<arboard::Clipboard>,
}

impl ArboardClipboard {
    pub fn new() -> crate::error::Result<Self> {
        let inner = arboard::Clipboard::new().map_err(|e| {
            crate::SelectPasteError::Platform(format!("Failed to open clipboard: {e}"))
        })?;
        Ok(Self {
            inner: RefCell::new(inner),
        })
    }
}

impl ArboardClipboard {
    /// Keep serving the current clipboard text until another program takes
    /// ownership (typically a clipboard manager) or `deadline` passes.
    ///
    /// Needed before exiting on Linux, where the owning process serves the
    /// clipboard. Returns immediately if the clipboard holds no text.
    #[cfg(target_os = "linux")]
    pub fn hand_off(&self, deadline: std::time::Instant) -> Result<()> {
        use arboard::SetExtLinux;

        let Some(text) = self.get_text()? else {
            return Ok(());
        };
        self.inner
            .borrow_mut()
            .set()
            .wait_until(deadline)
            .text(text)
            .map_err(classify)
    }
}

fn classify(e: arboard::Error) -> ClipboardError {
    let msg = e.to_string();
    match e {
        arboard::Error::ClipboardOccupied => ClipboardError::Busy(msg),
        _ => ClipboardError::Unavailable(msg),
    }
}

impl ClipboardAccess for ArboardClipboard {
    fn get_text(&self) -> Result<Option<String>> {
        match self.inner.borrow_mut().get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }

    fn set_text(&self, text: &str) -> Result<()> {
        self.inner
            .borrow_mut()
            .set_text(text.to_owned())
            .map_err(classify)
    }
}

/// In-memory clipboard for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    pub struct MockClipboard {
        pub contents: RefCell<Option<String>>,
        /// Every successful `set_text`, in order.
        pub writes: RefCell<Vec<String>>,
        /// Number of upcoming `set_text` calls that fail with `Busy`.
        pub busy_sets: Cell<u32>,
        /// If true, every `set_text` fails with `Busy`.
        pub always_busy: Cell<bool>,
        /// If true, `get_text` fails.
        pub fail_get: Cell<bool>,
        /// If true, every `set_text` fails with `Unavailable`.
        pub fail_set: Cell<bool>,
        pub set_attempts: Cell<u32>,
    }

    impl MockClipboard {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_text(text: &str) -> Self {
            let cb = Self::new();
            *cb.contents.borrow_mut() = Some(text.to_string());
            cb
        }

        pub fn text(&self) -> Option<String> {
            self.contents.borrow().clone()
        }
    }

    impl ClipboardAccess for MockClipboard {
        fn get_text(&self) -> Result<Option<String>> {
            if self.fail_get.get() {
                return Err(ClipboardError::Unavailable("mock: get failure injected".into()));
            }
            Ok(self.contents.borrow().clone())
        }

        fn set_text(&self, text: &str) -> Result<()> {
            self.set_attempts.set(self.set_attempts.get() + 1);
            if self.fail_set.get() {
                return Err(ClipboardError::Unavailable("mock: no clipboard owner".into()));
            }
            if self.always_busy.get() {
                return Err(ClipboardError::Busy("mock: clipboard locked".into()));
            }
            let busy = self.busy_sets.get();
            if busy > 0 {
                self.busy_sets.set(busy - 1);
                return Err(ClipboardError::Busy("mock: clipboard locked".into()));
            }
            *self.contents.borrow_mut() = Some(text.to_string());
            self.writes.borrow_mut().push(text.to_string());
            Ok(())
        }
    }
}
