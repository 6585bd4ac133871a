//! Synthetic keyboard input — trait + platform backends.
//!
//! Windows submits a whole chord through one `SendInput` call, so no real or
//! synthetic input can land between its events. Other platforms go through
//! `enigo`, one event at a time.

use std::fmt;

use crate::hotkey::vk;

#[derive(Debug)]
pub enum InputError {
    /// The input backend could not be created or rejected the request.
    Backend(String),
    /// The OS accepted fewer events than were submitted.
    Partial {
        sent: usize,
        expected: usize,
        os_code: Option<i32>,
    },
    /// The backend has no mapping for this virtual key.
    UnsupportedKey(u32),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Backend(e) => write!(f, "Input injection failed: {e}"),
            InputError::Partial {
                sent,
                expected,
                os_code,
            } => {
                write!(f, "Input injection incomplete: {sent}/{expected} events sent")?;
                if let Some(code) = os_code {
                    write!(f, " (error {code})")?;
                }
                Ok(())
            }
            InputError::UnsupportedKey(key) => {
                write!(f, "Input injection failed: no mapping for key 0x{key:02X}")
            }
        }
    }
}

impl std::error::Error for InputError {}

pub type Result<T> = std::result::Result<T, InputError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// One synthetic key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Virtual key code.
    pub key: u32,
    pub direction: KeyDirection,
}

impl KeyEvent {
    pub fn down(key: u32) -> Self {
        Self {
            key,
            direction: KeyDirection::Down,
        }
    }

    pub fn up(key: u32) -> Self {
        Self {
            key,
            direction: KeyDirection::Up,
        }
    }
}

/// Ctrl+V as four events. The modifier must wrap the key on both sides;
/// releasing it early pastes a bare "v" in most targets.
pub fn paste_chord() -> [KeyEvent; 4] {
    [
        KeyEvent::down(vk::CONTROL),
        KeyEvent::down(vk::V),
        KeyEvent::up(vk::V),
        KeyEvent::up(vk::CONTROL),
    ]
}

/// Submits synthetic keyboard events to whatever window has focus.
pub trait KeySender {
    /// Submit `events` in order, as one batch where the platform allows it.
    fn send(&self, events: &[KeyEvent]) -> Result<()>;
}

// ── Windows: SendInput ──

#[cfg(windows)]
mod sendinput {
    use super::*;

    use windows::Win32::UI::Input::KeyboardAndMouse::{
        INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
        SendInput, VIRTUAL_KEY,
    };

    /// Batches events into a single `SendInput` call.
    pub struct SendInputSender;

    impl SendInputSender {
        pub fn new() -> crate::error::Result<Self> {
            Ok(Self)
        }
    }

    fn to_input(event: &KeyEvent) -> INPUT {
        let flags = match event.direction {
            KeyDirection::Down => KEYBD_EVENT_FLAGS(0),
            KeyDirection::Up => KEYEVENTF_KEYUP,
        };
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(event.key as u16),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    impl KeySender for SendInputSender {
        fn send(&self, events: &[KeyEvent]) -> Result<()> {
            let inputs: Vec<INPUT> = events.iter().map(to_input).collect();
            let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) } as usize;
            if sent == inputs.len() {
                Ok(())
            } else {
                Err(InputError::Partial {
                    sent,
                    expected: inputs.len(),
                    os_code: std::io::Error::last_os_error().raw_os_error(),
                })
            }
        }
    }
}

#[cfg(windows)]
pub use sendinput::SendInputSender;

#[cfg(windows)]
pub type PlatformKeySender = SendInputSender;

// ── Everything else: enigo ──

#[cfg(not(windows))]
mod enigo_backend {
    use std::cell::RefCell;

    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    use super::*;

    /// Sends events one by one through `enigo`.
    pub struct EnigoSender {
        enigo: RefCell<Enigo>,
    }

    impl EnigoSender {
        pub fn new() -> crate::error::Result<Self> {
            let enigo = Enigo::new(&Settings::default()).map_err(|e| {
                crate::SelectPasteError::Platform(format!("Failed to init input backend: {e}"))
            })?;
            Ok(Self {
                enigo: RefCell::new(enigo),
            })
        }
    }

    fn to_key(key: u32) -> Option<Key> {
        match key {
            vk::CONTROL => Some(Key::Control),
            0x41..=0x5A => char::from_u32(key + 0x20).map(Key::Unicode),
            0x30..=0x39 => char::from_u32(key).map(Key::Unicode),
            _ => None,
        }
    }

    impl KeySender for EnigoSender {
        fn send(&self, events: &[KeyEvent]) -> Result<()> {
            let keys = events
                .iter()
                .map(|e| to_key(e.key).ok_or(InputError::UnsupportedKey(e.key)))
                .collect::<Result<Vec<_>>>()?;

            let mut enigo = self.enigo.borrow_mut();
            for (i, (event, key)) in events.iter().zip(&keys).enumerate() {
                let direction = match event.direction {
                    KeyDirection::Down => Direction::Press,
                    KeyDirection::Up => Direction::Release,
                };
                if let Err(e) = enigo.key(*key, direction) {
                    // Don't leave anything we pressed held down.
                    for (held, hk) in events[..i].iter().zip(&keys).rev() {
                        if held.direction == KeyDirection::Down {
                            let _ = enigo.key(*hk, Direction::Release);
                        }
                    }
                    return Err(InputError::Backend(e.to_string()));
                }
            }
            Ok(())
        }
    }
}

#[cfg(not(windows))]
pub use enigo_backend::EnigoSender;

#[cfg(not(windows))]
pub type PlatformKeySender = EnigoSender;

/// Recording key sender for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    pub struct MockKeySender {
        /// Every successfully submitted batch, in order.
        pub batches: RefCell<Vec<Vec<KeyEvent>>>,
        /// If true, `send` fails without recording.
        pub fail: Cell<bool>,
    }

    impl MockKeySender {
        pub fn new() -> Self {
            Self::default()
        }

        /// All events across all batches.
        pub fn events(&self) -> Vec<KeyEvent> {
            self.batches.borrow().iter().flatten().copied().collect()
        }
    }

    impl KeySender for MockKeySender {
        fn send(&self, events: &[KeyEvent]) -> Result<()> {
            if self.fail.get() {
                return Err(InputError::Partial {
                    sent: 0,
                    expected: events.len(),
                    os_code: Some(5),
                });
            }
            self.batches.borrow_mut().push(events.to_vec());
            Ok(())
        }
    }
}
