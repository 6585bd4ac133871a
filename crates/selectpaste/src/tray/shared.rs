//! Shared tray event loop. Platform-specific behavior is injected via the
//! [`PlatformAdapter`] trait.

use std::sync::atomic::Ordering;

use muda::MenuEvent;

use selectpaste_lib::clipboard::{ArboardClipboard, ClipboardAccess};
use selectpaste_lib::config::Config;
use selectpaste_lib::context::AppContext;
use selectpaste_lib::hotkey::{GlobalHotkeyBackend, HotkeyBackend};
use selectpaste_lib::input::{KeySender, PlatformKeySender};
use selectpaste_lib::picker::CommandPicker;
use selectpaste_lib::retry::{Sleeper, ThreadSleeper};

use super::dialogs;
use super::menu::{self, MenuAction, TrayMenu};
use crate::RUNNING;

type TrayContext = AppContext<GlobalHotkeyBackend, ArboardClipboard, PlatformKeySender, ThreadSleeper>;

/// Platform-specific hooks that differ between Windows and Linux.
pub trait PlatformAdapter {
    /// One-time platform init (GTK, ...). Called before anything else.
    fn platform_init() -> selectpaste_lib::error::Result<()>;

    /// Pump platform-specific events (Win32 messages, GTK iterations).
    fn pump_events();

    /// Block until the next platform event or a reasonable timeout.
    fn wait_for_events();
}

/// Canonical text of the bound shortcut, if any.
fn active_hotkey(ctx: &TrayContext) -> Option<String> {
    ctx.listener().spec().map(|s| s.canonical())
}

fn refresh_hotkey_ui(ctx: &TrayContext, tray: &tray_icon::TrayIcon, tray_menu: &TrayMenu) {
    let hotkey = active_hotkey(ctx);
    tray.set_tooltip(Some(menu::tooltip(hotkey.as_deref()))).ok();
    tray_menu.set_hotkey_label(hotkey.as_deref());
}

/// Apply a reloaded config. The returned picker follows the config the
/// context actually kept, so a rejected reload changes nothing.
fn reload_config<B, C, K, S>(
    ctx: &mut AppContext<B, C, K, S>,
    new: Config,
) -> (CommandPicker, selectpaste_lib::error::Result<bool>)
where
    B: HotkeyBackend,
    C: ClipboardAccess,
    K: KeySender,
    S: Sleeper,
{
    let result = ctx.apply_config(new);
    (CommandPicker::from_config(ctx.config()), result)
}

/// Shared tray event loop.
pub fn run_core<P: PlatformAdapter>() -> selectpaste_lib::error::Result<()> {
    P::platform_init()?;

    let config = Config::load(None);
    let mut picker = CommandPicker::from_config(&config);
    if picker.command().is_empty() {
        log::warn!("[config] picker_command is empty; the shortcut will do nothing");
    }

    let mut ctx: TrayContext = AppContext::new(
        config,
        GlobalHotkeyBackend::new()?,
        ArboardClipboard::new()?,
        PlatformKeySender::new()?,
        ThreadSleeper,
    );

    // Registration failure is shown once; the app keeps running without a shortcut.
    if let Err(e) = ctx.register_configured_hotkey() {
        dialogs::show_hotkey_error(&e);
    }

    let hotkey = active_hotkey(&ctx);
    let (tray_menu_root, tray_menu) = menu::build_tray_menu(hotkey.as_deref());
    let tray = menu::build_tray_icon(hotkey.as_deref(), tray_menu_root)?;

    let menu_rx = MenuEvent::receiver();

    while RUNNING.load(Ordering::SeqCst) {
        // 1. Platform event pump
        P::pump_events();

        // 2. Hotkey activations (blocks while the picker is open)
        ctx.pump(&mut picker);

        // 3. Menu events
        while let Ok(event) = menu_rx.try_recv() {
            match tray_menu.action_for(&event) {
                Some(MenuAction::Paste) => {
                    ctx.paste_from_picker(&mut picker);
                }
                Some(MenuAction::ReloadConfig) => {
                    let (next, result) = reload_config(&mut ctx, Config::load(None));
                    picker = next;
                    match result {
                        Ok(true) => log::info!("[config] shortcut changed"),
                        Ok(false) => log::info!("[config] reloaded"),
                        Err(e) => dialogs::show_hotkey_error(&e),
                    }
                    refresh_hotkey_ui(&ctx, &tray, &tray_menu);
                }
                Some(MenuAction::OpenConfigFolder) => menu::open_config_folder(),
                Some(MenuAction::Quit) => {
                    RUNNING.store(false, Ordering::SeqCst);
                    break;
                }
                None => {}
            }
        }

        // 4. Wait for events (platform-specific sleep/block)
        if RUNNING.load(Ordering::SeqCst) {
            P::wait_for_events();
        }
    }

    ctx.shutdown();
    drop(tray);
    Ok(())
}
