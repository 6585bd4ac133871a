//! OS hotkey capability — trait + `global-hotkey` backend.

use std::fmt;

use super::HotkeySpec;

/// The OS refused a hotkey binding (already owned by another process,
/// unsupported key, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyRegistrationError {
    /// Canonical form of the combination that was rejected.
    pub combination: String,
    /// OS error code, when the platform reports one.
    pub code: Option<i32>,
    pub reason: String,
}

impl HotkeyRegistrationError {
    pub fn new(spec: &HotkeySpec, code: Option<i32>, reason: impl Into<String>) -> Self {
        Self {
            combination: spec.canonical(),
            code,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HotkeyRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(
                f,
                "Could not register hotkey '{}' (error {code}): {}",
                self.combination, self.reason
            ),
            None => write!(
                f,
                "Could not register hotkey '{}': {}",
                self.combination, self.reason
            ),
        }
    }
}

impl std::error::Error for HotkeyRegistrationError {}

/// Platform capability for global key bindings.
///
/// Implementations are bound to the thread that created them: registration,
/// unregistration and activation polling must all happen there.
pub trait HotkeyBackend {
    /// Bind the combination. Returns the id activations will carry.
    fn register(&self, spec: &HotkeySpec) -> Result<u32, HotkeyRegistrationError>;
    fn unregister(&self, id: u32) -> Result<(), HotkeyRegistrationError>;
    /// Next pending activation id, without blocking.
    fn next_activation(&self) -> Option<u32>;
    /// Hand presses the OS has queued for this thread to the activation
    /// queue, so `next_activation` sees them.
    fn flush_os_queue(&self) {}
}

impl<T: HotkeyBackend + ?Sized> HotkeyBackend for &T {
    fn register(&self, spec: &HotkeySpec) -> Result<u32, HotkeyRegistrationError> {
        (**self).register(spec)
    }

    fn unregister(&self, id: u32) -> Result<(), HotkeyRegistrationError> {
        (**self).unregister(id)
    }

    fn next_activation(&self) -> Option<u32> {
        (**self).next_activation()
    }

    fn flush_os_queue(&self) {
        (**self).flush_os_queue()
    }
}

// ── global-hotkey implementation ──

#[cfg(any(windows, target_os = "linux"))]
mod global {
    use std::cell::RefCell;

    use global_hotkey::hotkey::{Code, HotKey, Modifiers as GhModifiers};
    use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

    use super::*;
    use crate::hotkey::{Modifiers, vk};

    const DIGITS: [Code; 10] = [
        Code::Digit0,
        Code::Digit1,
        Code::Digit2,
        Code::Digit3,
        Code::Digit4,
        Code::Digit5,
        Code::Digit6,
        Code::Digit7,
        Code::Digit8,
        Code::Digit9,
    ];

    const LETTERS: [Code; 26] = [
        Code::KeyA,
        Code::KeyB,
        Code::KeyC,
        Code::KeyD,
        Code::KeyE,
        Code::KeyF,
        Code::KeyG,
        Code::KeyH,
        Code::KeyI,
        Code::KeyJ,
        Code::KeyK,
        Code::KeyL,
        Code::KeyM,
        Code::KeyN,
        Code::KeyO,
        Code::KeyP,
        Code::KeyQ,
        Code::KeyR,
        Code::KeyS,
        Code::KeyT,
        Code::KeyU,
        Code::KeyV,
        Code::KeyW,
        Code::KeyX,
        Code::KeyY,
        Code::KeyZ,
    ];

    const FUNCTION_KEYS: [Code; 12] = [
        Code::F1,
        Code::F2,
        Code::F3,
        Code::F4,
        Code::F5,
        Code::F6,
        Code::F7,
        Code::F8,
        Code::F9,
        Code::F10,
        Code::F11,
        Code::F12,
    ];

    /// Translate a virtual key code to the physical key code `global-hotkey` expects.
    pub(super) fn code_for(key: u32) -> Option<Code> {
        let code = match key {
            vk::PERIOD => Code::Period,
            vk::COMMA => Code::Comma,
            vk::SEMICOLON => Code::Semicolon,
            vk::SLASH => Code::Slash,
            vk::BRACKET_LEFT => Code::BracketLeft,
            vk::BRACKET_RIGHT => Code::BracketRight,
            vk::ENTER => Code::Enter,
            vk::SPACE => Code::Space,
            vk::TAB => Code::Tab,
            vk::ESCAPE => Code::Escape,
            vk::BACKSPACE => Code::Backspace,
            vk::DELETE => Code::Delete,
            vk::F1..=vk::F12 => FUNCTION_KEYS[(key - vk::F1) as usize],
            0x30..=0x39 => DIGITS[(key - 0x30) as usize],
            0x41..=0x5A => LETTERS[(key - 0x41) as usize],
            _ => return None,
        };
        Some(code)
    }

    fn modifiers_for(mods: Modifiers) -> Option<GhModifiers> {
        if mods.is_empty() {
            return None;
        }
        let mut out = GhModifiers::empty();
        if mods.contains(Modifiers::CONTROL) {
            out |= GhModifiers::CONTROL;
        }
        if mods.contains(Modifiers::ALT) {
            out |= GhModifiers::ALT;
        }
        if mods.contains(Modifiers::SHIFT) {
            out |= GhModifiers::SHIFT;
        }
        if mods.contains(Modifiers::WIN) {
            out |= GhModifiers::SUPER;
        }
        Some(out)
    }

    fn os_error_code(err: &global_hotkey::Error) -> Option<i32> {
        match err {
            global_hotkey::Error::OsError(e) => e.raw_os_error(),
            // RegisterHotKey failures surface as AlreadyRegistered / FailedToRegister;
            // the thread's last error still holds the Win32 code.
            #[cfg(windows)]
            _ => std::io::Error::last_os_error()
                .raw_os_error()
                .filter(|&c| c != 0),
            #[cfg(not(windows))]
            _ => None,
        }
    }

    /// Hotkey backend on top of `global-hotkey`.
    ///
    /// On Windows the manager owns a hidden message window on the creating
    /// thread, so that thread must pump Win32 messages for activations to
    /// arrive.
    pub struct GlobalHotkeyBackend {
        manager: GlobalHotKeyManager,
        /// Live bindings with the canonical text they were registered from.
        registered: RefCell<Vec<(HotKey, String)>>,
    }

    impl GlobalHotkeyBackend {
        pub fn new() -> crate::error::Result<Self> {
            let manager = GlobalHotKeyManager::new().map_err(|e| {
                crate::SelectPasteError::Platform(format!("Failed to init hotkey manager: {e}"))
            })?;
            Ok(Self {
                manager,
                registered: RefCell::new(Vec::new()),
            })
        }
    }

    impl HotkeyBackend for GlobalHotkeyBackend {
        fn register(&self, spec: &HotkeySpec) -> Result<u32, HotkeyRegistrationError> {
            let code = code_for(spec.key).ok_or_else(|| {
                HotkeyRegistrationError::new(
                    spec,
                    None,
                    format!("key code 0x{:02X} is not supported by this platform", spec.key),
                )
            })?;
            let hotkey = HotKey::new(modifiers_for(spec.modifiers), code);
            self.manager.register(hotkey).map_err(|e| {
                HotkeyRegistrationError::new(spec, os_error_code(&e), e.to_string())
            })?;
            self.registered.borrow_mut().push((hotkey, spec.canonical()));
            Ok(hotkey.id())
        }

        fn unregister(&self, id: u32) -> Result<(), HotkeyRegistrationError> {
            let mut registered = self.registered.borrow_mut();
            let Some(pos) = registered.iter().position(|(h, _)| h.id() == id) else {
                return Ok(());
            };
            let (hotkey, combination) = registered.remove(pos);
            self.manager
                .unregister(hotkey)
                .map_err(|e| HotkeyRegistrationError {
                    combination,
                    code: os_error_code(&e),
                    reason: e.to_string(),
                })
        }

        fn next_activation(&self) -> Option<u32> {
            while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
                if event.state == HotKeyState::Pressed {
                    return Some(event.id);
                }
            }
            None
        }

        /// WM_HOTKEY only becomes an event once dispatched to the manager's
        /// window. Dispatch those still waiting in this thread's queue and
        /// leave every other message for the app loop.
        #[cfg(windows)]
        fn flush_os_queue(&self) {
            use windows::Win32::UI::WindowsAndMessaging::{
                DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, WM_HOTKEY,
            };

            unsafe {
                let mut msg: MSG = std::mem::zeroed();
                while PeekMessageW(&mut msg, None, WM_HOTKEY, WM_HOTKEY, PM_REMOVE).as_bool() {
                    DispatchMessageW(&msg);
                }
            }
        }
    }
}

#[cfg(any(windows, target_os = "linux"))]
pub use global::GlobalHotkeyBackend;

/// In-memory hotkey table for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Records registrations and lets tests queue activations.
    #[derive(Default)]
    pub struct MockHotkeyBackend {
        /// Live registrations: (id, spec).
        pub registered: RefCell<Vec<(u32, HotkeySpec)>>,
        /// Activation ids waiting to be polled.
        pub pending: RefCell<VecDeque<u32>>,
        /// Presses the OS has seen but not yet handed over; moved to
        /// `pending` by `flush_os_queue`.
        pub os_queue: RefCell<VecDeque<u32>>,
        pub flush_calls: Cell<u32>,
        /// If set, `register` fails with this OS code (simulates a binding
        /// owned by another process).
        pub reject_with: Cell<Option<i32>>,
        pub register_calls: Cell<u32>,
        pub unregister_calls: Cell<u32>,
        next_id: Cell<u32>,
    }

    impl MockHotkeyBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate the user pressing the combination bound to `id`.
        pub fn press(&self, id: u32) {
            self.pending.borrow_mut().push_back(id);
        }

        /// Simulate a press that stays in the OS queue until the next flush,
        /// like WM_HOTKEY waiting for a message pump.
        pub fn press_in_os_queue(&self, id: u32) {
            self.os_queue.borrow_mut().push_back(id);
        }

        /// Id of the most recent live registration, if any.
        pub fn current_id(&self) -> Option<u32> {
            self.registered.borrow().last().map(|(id, _)| *id)
        }
    }

    impl HotkeyBackend for MockHotkeyBackend {
        fn register(&self, spec: &HotkeySpec) -> Result<u32, HotkeyRegistrationError> {
            self.register_calls.set(self.register_calls.get() + 1);
            if let Some(code) = self.reject_with.get() {
                return Err(HotkeyRegistrationError::new(
                    spec,
                    Some(code),
                    "hotkey already registered",
                ));
            }
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            self.registered.borrow_mut().push((id, spec.clone()));
            Ok(id)
        }

        fn unregister(&self, id: u32) -> Result<(), HotkeyRegistrationError> {
            self.unregister_calls.set(self.unregister_calls.get() + 1);
            self.registered.borrow_mut().retain(|(rid, _)| *rid != id);
            Ok(())
        }

        fn next_activation(&self) -> Option<u32> {
            self.pending.borrow_mut().pop_front()
        }

        fn flush_os_queue(&self) {
            self.flush_calls.set(self.flush_calls.get() + 1);
            let queued: Vec<u32> = self.os_queue.borrow_mut().drain(..).collect();
            self.pending.borrow_mut().extend(queued);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::parse;

    #[test]
    fn registration_error_display_with_code() {
        let spec = parse("Shift + Alt + .").unwrap();
        let e = HotkeyRegistrationError::new(&spec, Some(1409), "hotkey already registered");
        assert_eq!(
            e.to_string(),
            "Could not register hotkey 'Alt+Shift+.' (error 1409): hotkey already registered"
        );
    }

    #[test]
    fn registration_error_display_without_code() {
        let spec = parse("F5").unwrap();
        let e = HotkeyRegistrationError::new(&spec, None, "unsupported");
        assert_eq!(e.to_string(), "Could not register hotkey 'F5': unsupported");
    }

    #[cfg(any(windows, target_os = "linux"))]
    #[test]
    fn every_parsable_named_key_maps_to_a_code() {
        for text in [
            ".", ",", ";", "/", "[", "]", "enter", "space", "tab", "esc", "backspace", "delete",
            "f1", "f12", "a", "z", "0", "9",
        ] {
            let spec = parse(text).unwrap();
            assert!(
                global::code_for(spec.key).is_some(),
                "no global-hotkey code for '{text}'"
            );
        }
    }

    #[cfg(any(windows, target_os = "linux"))]
    #[test]
    fn unmapped_characters_have_no_code() {
        let spec = parse("Ctrl+-").unwrap();
        assert!(global::code_for(spec.key).is_none());
    }
}
