//! Owner of the single global hotkey registration.

use std::marker::PhantomData;

use super::{HotkeyBackend, HotkeyRegistrationError, HotkeySpec};

struct Registration {
    id: u32,
    spec: HotkeySpec,
}

/// Holds at most one hotkey binding and delivers its activations.
///
/// States: unregistered → registered → unregistered. `register` on an already
/// registered listener unregisters first, so there is a short window with no
/// shortcut active.
///
/// The listener is `!Send`: the OS binds hotkeys to the thread that created
/// the backend, and activations must be pumped from that same thread.
pub struct GlobalHotkeyListener<B: HotkeyBackend> {
    backend: B,
    active: Option<Registration>,
    _thread_bound: PhantomData<*const ()>,
}

impl<B: HotkeyBackend> GlobalHotkeyListener<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: None,
            _thread_bound: PhantomData,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_registered(&self) -> bool {
        self.active.is_some()
    }

    /// The currently bound combination.
    pub fn spec(&self) -> Option<&HotkeySpec> {
        self.active.as_ref().map(|r| &r.spec)
    }

    /// Bind `spec`, replacing any existing binding.
    ///
    /// On failure the listener is left unregistered.
    pub fn register(&mut self, spec: HotkeySpec) -> Result<(), HotkeyRegistrationError> {
        self.unregister();
        let id = self.backend.register(&spec)?;
        log::info!("[hotkey] registered {spec}");
        self.active = Some(Registration { id, spec });
        Ok(())
    }

    /// Parse `text` and bind the result.
    pub fn register_from_spec_string(&mut self, text: &str) -> crate::error::Result<()> {
        let spec = super::parse(text)?;
        self.register(spec)?;
        Ok(())
    }

    /// Release the binding. Safe to call any number of times.
    pub fn unregister(&mut self) {
        let Some(reg) = self.active.take() else {
            return;
        };
        match self.backend.unregister(reg.id) {
            Ok(()) => log::info!("[hotkey] unregistered {}", reg.spec),
            Err(e) => log::warn!("[hotkey] {e}"),
        }
    }

    /// Deliver pending activations to `on_activated`, synchronously.
    ///
    /// Activations that arrive while the callback is running are discarded
    /// rather than replayed, so a second press while the picker is open does
    /// nothing. Returns the number of times the callback ran.
    pub fn pump(&mut self, mut on_activated: impl FnMut(&HotkeySpec)) -> usize {
        let mut delivered = 0;
        while let Some(id) = self.backend.next_activation() {
            let Some(reg) = self.active.as_ref().filter(|r| r.id == id) else {
                log::debug!("[hotkey] ignoring activation for stale id {id}");
                continue;
            };
            on_activated(&reg.spec);
            delivered += 1;
            self.discard_pending();
        }
        delivered
    }

    /// Drop every activation received so far, including presses the OS is
    /// still holding for this thread. Call after any blocking work on the
    /// owning thread. Returns the number dropped.
    pub fn discard_pending(&self) -> usize {
        self.backend.flush_os_queue();
        let mut skipped = 0;
        while self.backend.next_activation().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            log::debug!("[hotkey] dropped {skipped} activation(s) received while busy");
        }
        skipped
    }
}

impl<B: HotkeyBackend> Drop for GlobalHotkeyListener<B> {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SelectPasteError;
    use crate::hotkey::mock::MockHotkeyBackend;
    use crate::hotkey::{Modifiers, parse, vk};

    fn listener() -> GlobalHotkeyListener<MockHotkeyBackend> {
        GlobalHotkeyListener::new(MockHotkeyBackend::new())
    }

    #[test]
    fn starts_unregistered() {
        let l = listener();
        assert!(!l.is_registered());
        assert!(l.spec().is_none());
    }

    #[test]
    fn register_binds_spec() {
        let mut l = listener();
        l.register(parse("Shift + Alt + .").unwrap()).unwrap();
        assert!(l.is_registered());
        let spec = l.spec().unwrap();
        assert_eq!(spec.modifiers, Modifiers::SHIFT | Modifiers::ALT);
        assert_eq!(spec.key, vk::PERIOD);
        assert_eq!(l.backend().registered.borrow().len(), 1);
    }

    #[test]
    fn unregister_twice_is_harmless() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        l.unregister();
        l.unregister();
        assert!(!l.is_registered());
        assert!(l.backend().registered.borrow().is_empty());
        assert_eq!(l.backend().unregister_calls.get(), 1);
    }

    #[test]
    fn unregister_on_fresh_listener_is_noop() {
        let mut l = listener();
        l.unregister();
        assert_eq!(l.backend().unregister_calls.get(), 0);
    }

    #[test]
    fn reregister_releases_previous_binding_first() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        l.register(parse("Alt+F5").unwrap()).unwrap();
        let registered = l.backend().registered.borrow();
        assert_eq!(registered.len(), 1, "at most one live registration");
        assert_eq!(registered[0].1.key, 0x74);
        drop(registered);
        assert_eq!(l.backend().unregister_calls.get(), 1);
    }

    #[test]
    fn rejected_registration_leaves_listener_unregistered() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        l.backend().reject_with.set(Some(1409));
        let err = l.register(parse("Ctrl+J").unwrap()).unwrap_err();
        assert_eq!(err.code, Some(1409));
        assert_eq!(err.combination, "Ctrl+J");
        assert!(!l.is_registered());
        assert!(l.backend().registered.borrow().is_empty());
    }

    #[test]
    fn register_from_spec_string_surfaces_parse_errors() {
        let mut l = listener();
        let err = l.register_from_spec_string("Ctrl+Shift").unwrap_err();
        assert!(matches!(err, SelectPasteError::Parse(_)));
        assert_eq!(l.backend().register_calls.get(), 0);
    }

    #[test]
    fn register_from_spec_string_surfaces_registration_errors() {
        let mut l = listener();
        l.backend().reject_with.set(Some(1409));
        let err = l.register_from_spec_string("Ctrl+K").unwrap_err();
        assert!(matches!(err, SelectPasteError::Registration(_)));
    }

    #[test]
    fn pump_invokes_callback_for_own_id() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        let id = l.backend().current_id().unwrap();
        l.backend().press(id);

        let mut seen = Vec::new();
        let n = l.pump(|spec| seen.push(spec.canonical()));
        assert_eq!(n, 1);
        assert_eq!(seen, vec!["Ctrl+K".to_string()]);
    }

    #[test]
    fn pump_without_activations_does_nothing() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        let n = l.pump(|_| panic!("no activation expected"));
        assert_eq!(n, 0);
    }

    #[test]
    fn activations_queued_during_callback_are_dropped() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        let id = l.backend().current_id().unwrap();
        for _ in 0..3 {
            l.backend().press(id);
        }
        let mut calls = 0;
        let n = l.pump(|_| calls += 1);
        assert_eq!(n, 1);
        assert_eq!(calls, 1);
        assert!(l.backend().pending.borrow().is_empty());
    }

    #[test]
    fn stale_ids_are_ignored() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        let old = l.backend().current_id().unwrap();
        l.register(parse("Ctrl+J").unwrap()).unwrap();
        l.backend().press(old);
        assert_eq!(l.pump(|_| panic!("stale activation delivered")), 0);
    }

    #[test]
    fn unregistered_listener_ignores_activations() {
        let mut l = listener();
        l.backend().press(7);
        assert_eq!(l.pump(|_| panic!("unexpected")), 0);
    }

    #[test]
    fn presses_still_in_os_queue_are_dropped_after_callback() {
        let backend = MockHotkeyBackend::new();
        let mut l = GlobalHotkeyListener::new(&backend);
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        let id = backend.current_id().unwrap();
        backend.press(id);

        let n = l.pump(|_| backend.press_in_os_queue(id));
        assert_eq!(n, 1);
        assert!(backend.os_queue.borrow().is_empty());
        assert!(backend.pending.borrow().is_empty());
        assert_eq!(l.pump(|_| panic!("press made while busy was replayed")), 0);
    }

    #[test]
    fn discard_pending_flushes_then_drains() {
        let mut l = listener();
        l.register(parse("Ctrl+K").unwrap()).unwrap();
        let id = l.backend().current_id().unwrap();
        l.backend().press(id);
        l.backend().press_in_os_queue(id);

        assert_eq!(l.discard_pending(), 2);
        assert_eq!(l.backend().flush_calls.get(), 1);
        assert_eq!(l.pump(|_| panic!("nothing should be left")), 0);
    }
}
