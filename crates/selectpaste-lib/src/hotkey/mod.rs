//! Hotkey strings — parsing `"Shift + Alt + ."` into a modifier set and a
//! virtual key code, plus registration with the OS.
//!
//! Key codes follow the Win32 virtual-key table (`VK_*`), which is also what
//! the injection side speaks. Backends for other platforms translate from it.

mod backend;
mod listener;

pub use backend::{HotkeyBackend, HotkeyRegistrationError};
#[cfg(any(windows, target_os = "linux"))]
pub use backend::GlobalHotkeyBackend;
#[doc(hidden)]
pub use backend::mock;
pub use listener::GlobalHotkeyListener;

use std::fmt;
use std::ops::BitOr;

/// Virtual key codes used by the parser and the paste chord.
pub mod vk {
    pub const BACKSPACE: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const ENTER: u32 = 0x0D;
    pub const CONTROL: u32 = 0x11;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const DELETE: u32 = 0x2E;
    pub const V: u32 = 0x56;
    pub const F1: u32 = 0x70;
    pub const F12: u32 = 0x7B;
    pub const SEMICOLON: u32 = 0xBA;
    pub const COMMA: u32 = 0xBC;
    pub const PERIOD: u32 = 0xBE;
    pub const SLASH: u32 = 0xBF;
    pub const BRACKET_LEFT: u32 = 0xDB;
    pub const BRACKET_RIGHT: u32 = 0xDD;
}

/// Named keys and punctuation, in display order for [`key_name`].
const NAMED_KEYS: &[(&str, u32)] = &[
    (".", vk::PERIOD),
    (",", vk::COMMA),
    (";", vk::SEMICOLON),
    ("/", vk::SLASH),
    ("[", vk::BRACKET_LEFT),
    ("]", vk::BRACKET_RIGHT),
    ("enter", vk::ENTER),
    ("space", vk::SPACE),
    ("tab", vk::TAB),
    ("esc", vk::ESCAPE),
    ("escape", vk::ESCAPE),
    ("backspace", vk::BACKSPACE),
    ("delete", vk::DELETE),
];

// ── Modifiers ──

/// Set of qualifier keys held together with the hotkey.
///
/// Bit values match the Win32 `MOD_*` flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const ALT: Modifiers = Modifiers(0x0001);
    pub const CONTROL: Modifiers = Modifiers(0x0002);
    pub const SHIFT: Modifiers = Modifiers(0x0004);
    pub const WIN: Modifiers = Modifiers(0x0008);

    /// Canonical display order.
    const ORDERED: [(Modifiers, &'static str); 4] = [
        (Modifiers::CONTROL, "Ctrl"),
        (Modifiers::ALT, "Alt"),
        (Modifiers::SHIFT, "Shift"),
        (Modifiers::WIN, "Win"),
    ];

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    /// Display names of the set modifiers, e.g. `["Ctrl", "Alt"]`.
    pub fn names(self) -> Vec<&'static str> {
        Self::ORDERED
            .iter()
            .filter(|(m, _)| self.contains(*m))
            .map(|(_, name)| *name)
            .collect()
    }

    fn from_token(token: &str) -> Option<Modifiers> {
        match token {
            "ctrl" | "control" => Some(Modifiers::CONTROL),
            "alt" => Some(Modifiers::ALT),
            "shift" => Some(Modifiers::SHIFT),
            "win" | "windows" => Some(Modifiers::WIN),
            _ => None,
        }
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

// ── Parse errors ──

/// Why a hotkey string could not be turned into a [`HotkeySpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace and `+` separators.
    Empty,
    /// Only modifiers were given (e.g. `"Ctrl+Shift"`).
    MissingKey(String),
    /// The key token is not in the lookup table.
    UnknownKey(String),
    /// More than one non-modifier token.
    MultipleKeys(String, String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "hotkey is empty"),
            ParseError::MissingKey(source) => {
                write!(f, "hotkey '{source}' has modifiers but no key")
            }
            ParseError::UnknownKey(token) => write!(f, "unrecognized key '{token}'"),
            ParseError::MultipleKeys(first, second) => {
                write!(f, "hotkey has more than one key ('{first}' and '{second}')")
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ── HotkeySpec ──

/// A parsed global shortcut. Immutable; re-parse to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeySpec {
    pub modifiers: Modifiers,
    /// Virtual key code of the non-modifier key.
    pub key: u32,
    /// The string this spec was parsed from, verbatim.
    pub source_text: String,
}

impl HotkeySpec {
    /// Canonical form, e.g. `"Ctrl+Alt+."`. Independent of the source spelling.
    pub fn canonical(&self) -> String {
        let mut parts: Vec<String> = self
            .modifiers
            .names()
            .into_iter()
            .map(String::from)
            .collect();
        parts.push(key_name(self.key));
        parts.join("+")
    }
}

impl fmt::Display for HotkeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl std::str::FromStr for HotkeySpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a human-readable shortcut.
///
/// Tokens are separated by `+`, trimmed and compared case-insensitively.
/// Modifier order and repetition don't matter; exactly one key token is
/// required.
pub fn parse(text: &str) -> Result<HotkeySpec, ParseError> {
    let mut modifiers = Modifiers::NONE;
    let mut key: Option<(String, u32)> = None;

    for token in text.split('+').map(str::trim).filter(|t| !t.is_empty()) {
        let token = token.to_lowercase();
        if let Some(m) = Modifiers::from_token(&token) {
            modifiers.insert(m);
            continue;
        }
        let code = key_code(&token).ok_or_else(|| ParseError::UnknownKey(token.clone()))?;
        if let Some((previous, _)) = &key {
            return Err(ParseError::MultipleKeys(previous.clone(), token));
        }
        key = Some((token, code));
    }

    match key {
        Some((_, code)) => Ok(HotkeySpec {
            modifiers,
            key: code,
            source_text: text.to_string(),
        }),
        None if modifiers.is_empty() => Err(ParseError::Empty),
        None => Err(ParseError::MissingKey(text.trim().to_string())),
    }
}

/// Resolve a lowercased key token to its virtual key code.
fn key_code(token: &str) -> Option<u32> {
    if let Some(&(_, code)) = NAMED_KEYS.iter().find(|(name, _)| *name == token) {
        return Some(code);
    }
    if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<u32>().ok())
        && (1..=12).contains(&n)
    {
        return Some(vk::F1 + n - 1);
    }
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_uppercase().next().map(u32::from),
        _ => None,
    }
}

/// Display name for a virtual key code, the inverse of the parser's lookup.
pub fn key_name(code: u32) -> String {
    match code {
        vk::ENTER => "Enter".into(),
        vk::SPACE => "Space".into(),
        vk::TAB => "Tab".into(),
        vk::ESCAPE => "Esc".into(),
        vk::BACKSPACE => "Backspace".into(),
        vk::DELETE => "Delete".into(),
        vk::F1..=vk::F12 => format!("F{}", code - vk::F1 + 1),
        _ => {
            if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, c)| *c == code) {
                return (*name).to_string();
            }
            char::from_u32(code)
                .map(String::from)
                .unwrap_or_else(|| format!("0x{code:02X}"))
        }
    }
}
