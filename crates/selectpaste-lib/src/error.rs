//! Unified error type for the selectpaste-lib crate.
//!
//! [`SelectPasteError`] wraps the per-capability errors (`ParseError`,
//! `HotkeyRegistrationError`, `ClipboardError`, `InputError`) plus a string
//! kind for platform setup. `From` impls let `?` cross
//! module boundaries.

use std::fmt;

use crate::clipboard::ClipboardError;
use crate::hotkey::{HotkeyRegistrationError, ParseError};
use crate::input::InputError;

/// Unified error type for selectpaste-lib operations.
#[derive(Debug)]
pub enum SelectPasteError {
    /// Hotkey string could not be parsed.
    Parse(ParseError),
    /// The OS refused the hotkey binding.
    Registration(HotkeyRegistrationError),
    /// Clipboard read/write failure.
    Clipboard(ClipboardError),
    /// Synthetic input submission failure.
    Input(InputError),
    /// A platform capability could not be initialised.
    Platform(String),
}

impl fmt::Display for SelectPasteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectPasteError::Parse(e) => write!(f, "Invalid hotkey: {e}"),
            SelectPasteError::Registration(e) => write!(f, "{e}"),
            SelectPasteError::Clipboard(e) => write!(f, "{e}"),
            SelectPasteError::Input(e) => write!(f, "{e}"),
            SelectPasteError::Platform(e) => write!(f, "Platform error: {e}"),
        }
    }
}

impl std::error::Error for SelectPasteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectPasteError::Parse(e) => Some(e),
            SelectPasteError::Registration(e) => Some(e),
            SelectPasteError::Clipboard(e) => Some(e),
            SelectPasteError::Input(e) => Some(e),
            SelectPasteError::Platform(_) => None,
        }
    }
}

impl From<ParseError> for SelectPasteError {
    fn from(e: ParseError) -> Self {
        SelectPasteError::Parse(e)
    }
}

impl From<HotkeyRegistrationError> for SelectPasteError {
    fn from(e: HotkeyRegistrationError) -> Self {
        SelectPasteError::Registration(e)
    }
}

impl From<ClipboardError> for SelectPasteError {
    fn from(e: ClipboardError) -> Self {
        SelectPasteError::Clipboard(e)
    }
}

impl From<InputError> for SelectPasteError {
    fn from(e: InputError) -> Self {
        SelectPasteError::Input(e)
    }
}

/// Crate-level Result alias using [`SelectPasteError`].
pub type Result<T> = std::result::Result<T, SelectPasteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parse_error() {
        let e: SelectPasteError = ParseError::Empty.into();
        assert!(matches!(e, SelectPasteError::Parse(ParseError::Empty)));
    }

    #[test]
    fn from_clipboard_error() {
        let e: SelectPasteError = ClipboardError::Busy("locked".into()).into();
        assert!(matches!(e, SelectPasteError::Clipboard(ClipboardError::Busy(_))));
    }

    #[test]
    fn display_parse_error() {
        let e = SelectPasteError::Parse(ParseError::UnknownKey("pageup".into()));
        assert_eq!(e.to_string(), "Invalid hotkey: unrecognized key 'pageup'");
    }

    #[test]
    fn display_platform_error() {
        let e = SelectPasteError::Platform("no display".into());
        assert_eq!(e.to_string(), "Platform error: no display");
    }

    #[test]
    fn source_chains_registration_error() {
        let e = SelectPasteError::Registration(HotkeyRegistrationError {
            combination: "Ctrl+K".into(),
            code: Some(1409),
            reason: "taken".into(),
        });
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("1409"));
    }

    #[test]
    fn source_none_for_platform_error() {
        let e = SelectPasteError::Platform("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_parse_to_selectpaste() {
        fn outer() -> Result<()> {
            crate::hotkey::parse("Ctrl+Shift")?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, SelectPasteError::Parse(ParseError::MissingKey(_))));
    }
}
