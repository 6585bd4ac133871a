//! Application context — the config, the hotkey listener and the injector,
//! owned together and driven from the UI thread.
//!
//! Flow for one activation: the listener reports the shortcut, the picker
//! blocks until the user chooses, the injector pastes the choice. Injection
//! outcomes are logged and otherwise discarded.

use crate::clipboard::ClipboardAccess;
use crate::config::Config;
use crate::hotkey::{GlobalHotkeyListener, HotkeyBackend, HotkeySpec};
use crate::inject::{ClipboardInjector, InjectOutcome};
use crate::input::KeySender;
use crate::picker::Picker;
use crate::retry::Sleeper;

pub struct AppContext<B: HotkeyBackend, C, K, S> {
    config: Config,
    listener: GlobalHotkeyListener<B>,
    injector: ClipboardInjector<C, K, S>,
}

impl<B, C, K, S> AppContext<B, C, K, S>
where
    B: HotkeyBackend,
    C: ClipboardAccess,
    K: KeySender,
    S: Sleeper,
{
    pub fn new(config: Config, backend: B, clipboard: C, keys: K, sleeper: S) -> Self {
        let injector = ClipboardInjector::new(clipboard, keys, sleeper, config.inject_config());
        Self {
            config,
            listener: GlobalHotkeyListener::new(backend),
            injector,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn listener(&self) -> &GlobalHotkeyListener<B> {
        &self.listener
    }

    pub fn injector(&self) -> &ClipboardInjector<C, K, S> {
        &self.injector
    }

    /// Bind the shortcut from the current config.
    pub fn register_configured_hotkey(&mut self) -> crate::error::Result<()> {
        self.listener.register_from_spec_string(&self.config.hotkey)
    }

    /// Switch to `new`. The shortcut is re-registered only if the combination
    /// changed; an unparseable shortcut rejects the whole config before
    /// anything is applied or unbound. Returns whether the binding changed.
    ///
    /// If the new combination can't be bound, the previous one is restored
    /// when possible and the registration error is returned.
    pub fn apply_config(&mut self, new: Config) -> crate::error::Result<bool> {
        let spec = new.hotkey_spec()?;
        self.injector.set_config(new.inject_config());
        self.config = new;

        let previous = self.listener.spec().cloned();
        if let Some(current) = &previous
            && same_combination(current, &spec)
        {
            return Ok(false);
        }

        match self.listener.register(spec) {
            Ok(()) => Ok(true),
            Err(e) => {
                if let Some(old) = previous
                    && let Err(restore) = self.listener.register(old)
                {
                    log::warn!("[context] previous shortcut not restored: {restore}");
                }
                Err(e.into())
            }
        }
    }

    /// Handle pending shortcut activations. Returns the number handled.
    pub fn pump(&mut self, picker: &mut impl Picker) -> usize {
        let Self {
            listener, injector, ..
        } = self;
        listener.pump(|spec| {
            log::debug!("[context] {spec} pressed");
            paste_with(injector, &mut *picker);
        })
    }

    /// Show the picker and paste the result, as if the shortcut was pressed.
    ///
    /// Shortcut presses made meanwhile are dropped, as they are during
    /// [`pump`](Self::pump).
    pub fn paste_from_picker(&self, picker: &mut impl Picker) -> Option<InjectOutcome> {
        let outcome = paste_with(&self.injector, picker);
        self.listener.discard_pending();
        outcome
    }

    /// Release the shortcut. The context stays usable for manual pastes.
    pub fn shutdown(&mut self) {
        self.listener.unregister();
    }
}

fn same_combination(a: &HotkeySpec, b: &HotkeySpec) -> bool {
    a.modifiers == b.modifiers && a.key == b.key
}

fn paste_with<C, K, S>(
    injector: &ClipboardInjector<C, K, S>,
    picker: &mut impl Picker,
) -> Option<InjectOutcome>
where
    C: ClipboardAccess,
    K: KeySender,
    S: Sleeper,
{
    let text = picker.pick().filter(|t| !t.is_empty())?;
    let outcome = injector.inject(&text);
    if outcome.is_pasted() {
        log::info!("[inject] {outcome}");
    } else {
        log::warn!("[inject] {outcome}");
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::mock::MockClipboard;
    use crate::hotkey::mock::MockHotkeyBackend;
    use crate::input::mock::MockKeySender;
    use crate::picker::mock::ScriptedPicker;
    use crate::retry::mock::RecordingSleeper;

    type MockContext = AppContext<MockHotkeyBackend, MockClipboard, MockKeySender, RecordingSleeper>;

    fn context(config: Config) -> MockContext {
        AppContext::new(
            config,
            MockHotkeyBackend::new(),
            MockClipboard::with_text("A"),
            MockKeySender::new(),
            RecordingSleeper::new(),
        )
    }

    #[test]
    fn registers_default_shortcut() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();
        assert!(ctx.listener().is_registered());
        assert_eq!(ctx.listener().spec().unwrap().canonical(), "Alt+Shift+.");
    }

    #[test]
    fn activation_pastes_picked_text() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();
        let id = ctx.listener().backend().current_id().unwrap();
        ctx.listener().backend().press(id);

        let mut picker = ScriptedPicker::new([Some("hello")]);
        assert_eq!(ctx.pump(&mut picker), 1);
        assert_eq!(picker.calls, 1);
        assert_eq!(*ctx.injector().clipboard().writes.borrow(), vec!["hello", "A"]);
        assert_eq!(ctx.injector().keys().events().len(), 4);
    }

    #[test]
    fn cancelled_picker_injects_nothing() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();
        let id = ctx.listener().backend().current_id().unwrap();
        ctx.listener().backend().press(id);

        let mut picker = ScriptedPicker::new([None::<String>]);
        assert_eq!(ctx.pump(&mut picker), 1);
        assert!(ctx.injector().keys().events().is_empty());
        assert!(ctx.injector().sleeper().sleeps.borrow().is_empty());
    }

    #[test]
    fn empty_selection_injects_nothing() {
        let ctx = context(Config::default());
        let mut picker = ScriptedPicker::new([Some("")]);
        assert!(ctx.paste_from_picker(&mut picker).is_none());
        assert!(ctx.injector().clipboard().writes.borrow().is_empty());
    }

    #[test]
    fn manual_paste_works_without_registration() {
        let ctx = context(Config::default());
        let mut picker = ScriptedPicker::new([Some("x")]);
        let outcome = ctx.paste_from_picker(&mut picker).unwrap();
        assert!(outcome.is_pasted());
    }

    #[test]
    fn apply_config_same_combination_keeps_registration() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();

        let changed = ctx
            .apply_config(Config {
                hotkey: "alt+shift+.".into(),
                paste_settle_ms: 400,
                ..Config::default()
            })
            .unwrap();
        assert!(!changed);
        assert_eq!(ctx.listener().backend().register_calls.get(), 1);
        assert_eq!(
            ctx.injector().config().settle_delay,
            std::time::Duration::from_millis(400)
        );
    }

    #[test]
    fn apply_config_new_combination_reregisters() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();

        let changed = ctx
            .apply_config(Config {
                hotkey: "Ctrl+F9".into(),
                ..Config::default()
            })
            .unwrap();
        assert!(changed);
        assert_eq!(ctx.config().hotkey, "Ctrl+F9");
        let registered = ctx.listener().backend().registered.borrow();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].1.canonical(), "Ctrl+F9");
    }

    #[test]
    fn apply_config_invalid_shortcut_keeps_everything() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();

        let err = ctx
            .apply_config(Config {
                hotkey: "Ctrl+Shift".into(),
                ..Config::default()
            })
            .unwrap_err();
        assert!(matches!(err, crate::SelectPasteError::Parse(_)));
        assert_eq!(ctx.config().hotkey, "Shift + Alt + .");
        assert!(ctx.listener().is_registered());
        assert_eq!(ctx.listener().backend().unregister_calls.get(), 0);
    }

    #[test]
    fn apply_config_rejected_shortcut_restores_previous() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();
        ctx.listener().backend().reject_with.set(Some(1409));

        let err = ctx
            .apply_config(Config {
                hotkey: "Ctrl+F9".into(),
                ..Config::default()
            })
            .unwrap_err();
        assert!(matches!(err, crate::SelectPasteError::Registration(_)));

        // Restoring also fails while the backend rejects everything.
        assert!(!ctx.listener().is_registered());

        ctx.listener().backend().reject_with.set(None);
        ctx.register_configured_hotkey().unwrap();
        assert_eq!(ctx.listener().spec().unwrap().canonical(), "Ctrl+F9");
    }

    #[test]
    fn shutdown_unregisters() {
        let mut ctx = context(Config::default());
        ctx.register_configured_hotkey().unwrap();
        ctx.shutdown();
        ctx.shutdown();
        assert!(!ctx.listener().is_registered());
        assert!(ctx.listener().backend().registered.borrow().is_empty());
        assert_eq!(ctx.listener().backend().unregister_calls.get(), 1);
    }

    struct PressingPicker<'a> {
        backend: &'a MockHotkeyBackend,
        in_os_queue: bool,
    }

    impl Picker for PressingPicker<'_> {
        fn pick(&mut self) -> Option<String> {
            let id = self.backend.current_id()?;
            if self.in_os_queue {
                self.backend.press_in_os_queue(id);
            } else {
                self.backend.press(id);
            }
            Some("picked".into())
        }
    }

    fn borrowed_context(
        backend: &MockHotkeyBackend,
    ) -> AppContext<&MockHotkeyBackend, MockClipboard, MockKeySender, RecordingSleeper> {
        let mut ctx = AppContext::new(
            Config::default(),
            backend,
            MockClipboard::with_text("A"),
            MockKeySender::new(),
            RecordingSleeper::new(),
        );
        ctx.register_configured_hotkey().unwrap();
        ctx
    }

    #[test]
    fn press_during_manual_paste_is_not_replayed() {
        let backend = MockHotkeyBackend::new();
        let mut ctx = borrowed_context(&backend);
        let mut picker = PressingPicker {
            backend: &backend,
            in_os_queue: false,
        };

        assert!(ctx.paste_from_picker(&mut picker).unwrap().is_pasted());
        assert!(backend.pending.borrow().is_empty());
        assert_eq!(ctx.pump(&mut picker), 0);
        assert_eq!(ctx.injector().keys().batches.borrow().len(), 1);
    }

    #[test]
    fn press_held_by_os_during_manual_paste_is_not_replayed() {
        let backend = MockHotkeyBackend::new();
        let mut ctx = borrowed_context(&backend);
        let mut picker = PressingPicker {
            backend: &backend,
            in_os_queue: true,
        };

        ctx.paste_from_picker(&mut picker);
        // The app loop pumps OS messages before the next hotkey poll.
        backend.flush_os_queue();
        assert_eq!(ctx.pump(&mut picker), 0);
        assert_eq!(ctx.injector().keys().batches.borrow().len(), 1);
    }
}
