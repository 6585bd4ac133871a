//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hotkey::{self, HotkeySpec, ParseError};
use crate::inject::InjectConfig;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Global shortcut that opens the picker. Default: "Shift + Alt + .".
    /// Format: modifiers and one key joined by "+", e.g. "Ctrl+Alt+V".
    #[serde(default = "default_hotkey")]
    pub hotkey: String,

    /// Shell command that shows the picker and prints the chosen text. Empty = disabled.
    #[serde(default)]
    pub picker_command: String,

    /// Seconds to wait for the picker before killing it.
    #[serde(default = "default_picker_timeout_secs")]
    pub picker_timeout_secs: u64,

    /// Attempts to write the clipboard before dropping a paste.
    #[serde(default = "default_clipboard_attempts")]
    pub clipboard_attempts: u32,

    /// Pause between clipboard write attempts (ms).
    #[serde(default = "default_clipboard_retry_ms")]
    pub clipboard_retry_ms: u64,

    /// Pause after the picker closes, before pasting (ms).
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,

    /// Pause between Ctrl+V and clipboard restore (ms).
    #[serde(default = "default_paste_settle_ms")]
    pub paste_settle_ms: u64,
}

fn default_hotkey() -> String {
    "Shift + Alt + .".into()
}
fn default_picker_timeout_secs() -> u64 {
    300
}
fn default_clipboard_attempts() -> u32 {
    5
}
fn default_clipboard_retry_ms() -> u64 {
    50
}
fn default_focus_delay_ms() -> u64 {
    50
}
fn default_paste_settle_ms() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hotkey: default_hotkey(),
            picker_command: String::new(),
            picker_timeout_secs: default_picker_timeout_secs(),
            clipboard_attempts: default_clipboard_attempts(),
            clipboard_retry_ms: default_clipboard_retry_ms(),
            focus_delay_ms: default_focus_delay_ms(),
            paste_settle_ms: default_paste_settle_ms(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The `hotkey` field does not parse.
    InvalidHotkey(ParseError),
    /// `clipboard_attempts` is zero.
    ZeroClipboardAttempts,
    /// `picker_timeout_secs` is zero.
    ZeroPickerTimeout,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidHotkey(e) => write!(f, "Invalid hotkey: {e}"),
            ValidationError::ZeroClipboardAttempts => {
                write!(f, "clipboard_attempts must be at least 1")
            }
            ValidationError::ZeroPickerTimeout => {
                write!(f, "picker_timeout_secs must be at least 1")
            }
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            dirs::config_dir().map(|p| p.join("SelectPaste"))
        }
        #[cfg(not(windows))]
        {
            dirs::config_dir().map(|p| p.join("selectpaste"))
        }
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Full path to the log file (tray app).
    pub fn log_path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("selectpaste.log"))
    }

    /// Load config from `path`, or the default location when `None`.
    ///
    /// Parse warnings and validation problems are logged; a missing or
    /// unreadable file yields defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let (config, warnings) = match path {
            Some(p) => Self::load_from(p),
            None => Self::load_with_warnings(),
        };
        for w in &warnings {
            log::warn!("[config] {w}");
        }
        if let Err(errs) = config.validate() {
            for e in &errs {
                log::warn!("[config] {e}");
            }
        }
        config
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Parsed form of the `hotkey` field.
    pub fn hotkey_spec(&self) -> Result<HotkeySpec, ParseError> {
        hotkey::parse(&self.hotkey)
    }

    /// Injection timings derived from this config.
    pub fn inject_config(&self) -> InjectConfig {
        InjectConfig {
            retry: RetryPolicy {
                attempts: self.clipboard_attempts.max(1),
                delay: Duration::from_millis(self.clipboard_retry_ms),
            },
            focus_delay: Duration::from_millis(self.focus_delay_ms),
            settle_delay: Duration::from_millis(self.paste_settle_ms),
        }
    }

    /// Validate the entire config, collecting all errors.
    ///
    /// An empty `picker_command` is allowed; the shortcut then does nothing
    /// but log a warning.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.hotkey_spec() {
            errors.push(ValidationError::InvalidHotkey(e));
        }
        if self.clipboard_attempts == 0 {
            errors.push(ValidationError::ZeroClipboardAttempts);
        }
        if self.picker_timeout_secs == 0 {
            errors.push(ValidationError::ZeroPickerTimeout);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Config defaults ──

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.hotkey, "Shift + Alt + .");
        assert!(c.picker_command.is_empty());
        assert_eq!(c.picker_timeout_secs, 300);
        assert_eq!(c.clipboard_attempts, 5);
        assert_eq!(c.clipboard_retry_ms, 50);
        assert_eq!(c.focus_delay_ms, 50);
        assert_eq!(c.paste_settle_ms, 200);
    }

    #[test]
    fn default_hotkey_parses() {
        let spec = Config::default().hotkey_spec().unwrap();
        assert_eq!(spec.key, hotkey::vk::PERIOD);
        assert_eq!(spec.canonical(), "Alt+Shift+.");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("hotkey = \"Ctrl+F9\"").unwrap();
        assert_eq!(c.hotkey, "Ctrl+F9");
        assert_eq!(c.clipboard_attempts, 5);
        assert_eq!(c.paste_settle_ms, 200);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn wrong_type_toml_is_error() {
        let result: std::result::Result<Config, _> =
            toml::from_str("clipboard_attempts = \"many\"");
        assert!(result.is_err());
    }

    #[test]
    fn config_path_ends_with_toml() {
        if let Some(path) = Config::path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }

    #[test]
    fn log_path_is_in_config_dir() {
        if let (Some(log), Some(dir)) = (Config::log_path(), Config::dir()) {
            assert_eq!(log.parent().unwrap(), dir);
            assert_eq!(log.file_name().unwrap(), "selectpaste.log");
        }
    }

    // ── derived settings ──

    #[test]
    fn inject_config_from_defaults_matches_injector_defaults() {
        assert_eq!(Config::default().inject_config(), InjectConfig::default());
    }

    #[test]
    fn inject_config_uses_custom_timings() {
        let c = Config {
            clipboard_attempts: 2,
            clipboard_retry_ms: 10,
            focus_delay_ms: 0,
            paste_settle_ms: 500,
            ..Config::default()
        };
        let ic = c.inject_config();
        assert_eq!(ic.retry.attempts, 2);
        assert_eq!(ic.retry.delay, Duration::from_millis(10));
        assert_eq!(ic.focus_delay, Duration::ZERO);
        assert_eq!(ic.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn inject_config_never_has_zero_attempts() {
        let c = Config {
            clipboard_attempts: 0,
            ..Config::default()
        };
        assert_eq!(c.inject_config().retry.attempts, 1);
    }

    // ── validate ──

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_modifier_only_hotkey() {
        let c = Config {
            hotkey: "Ctrl+Shift".into(),
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            ValidationError::InvalidHotkey(ParseError::MissingKey(_))
        ));
        assert!(errs[0].to_string().starts_with("Invalid hotkey"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let c = Config {
            hotkey: "".into(),
            clipboard_attempts: 0,
            picker_timeout_secs: 0,
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(
            errs,
            vec![
                ValidationError::InvalidHotkey(ParseError::Empty),
                ValidationError::ZeroClipboardAttempts,
                ValidationError::ZeroPickerTimeout,
            ]
        );
    }

    #[test]
    fn empty_picker_command_is_valid() {
        let c = Config {
            picker_command: "   ".into(),
            ..Config::default()
        };
        assert!(c.validate().is_ok());
    }

    // ── load_from / load ──

    #[test]
    fn load_from_reads_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "hotkey = \"Ctrl+Alt+V\"\n\
             picker_command = \"rofi -dmenu < ~/snippets.txt\"\n\
             picker_timeout_secs = 60\n\
             clipboard_attempts = 8\n\
             clipboard_retry_ms = 25\n\
             focus_delay_ms = 100\n\
             paste_settle_ms = 300\n",
        )
        .unwrap();

        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(
            loaded,
            Config {
                hotkey: "Ctrl+Alt+V".into(),
                picker_command: "rofi -dmenu < ~/snippets.txt".into(),
                picker_timeout_secs: 60,
                clipboard_attempts: 8,
                clipboard_retry_ms: 25,
                focus_delay_ms: 100,
                paste_settle_ms: 300,
            }
        );
    }

    #[test]
    fn load_with_custom_path_reads_that_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "hotkey = \"Ctrl+F9\"\n").unwrap();
        assert_eq!(Config::load(Some(&path)).hotkey, "Ctrl+F9");
    }

    #[test]
    fn load_keeps_invalid_values_for_the_caller_to_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "hotkey = \"Ctrl+Shift\"\n").unwrap();
        let config = Config::load(Some(&path));
        assert_eq!(config.hotkey, "Ctrl+Shift");
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_with_broken_custom_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "hotkey = [").unwrap();
        assert_eq!(Config::load(Some(&path)), Config::default());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = Config::load_from(&dir.path().join("nonexistent.toml"));
        assert!(warnings.is_empty());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();

        let (config, warnings) = Config::load_from(&path);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
        assert_eq!(config, Config::default());
    }
}
