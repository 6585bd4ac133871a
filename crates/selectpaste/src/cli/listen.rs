//! `listen` subcommand — register the configured hotkey and report presses.

use std::path::Path;

use super::Result;

#[cfg(any(windows, target_os = "linux"))]
pub(super) fn cmd_listen(custom_path: Option<&Path>) -> Result<()> {
    use std::sync::atomic::Ordering;

    use selectpaste_lib::hotkey::{GlobalHotkeyBackend, GlobalHotkeyListener};

    use super::RUNNING;

    let config = super::Config::load(custom_path);
    let mut listener = GlobalHotkeyListener::new(GlobalHotkeyBackend::new()?);
    listener.register_from_spec_string(&config.hotkey)?;
    if let Some(spec) = listener.spec() {
        println!("[hotkey] listening for {spec} (Ctrl+C to stop)");
    }

    let mut presses = 0u64;
    while RUNNING.load(Ordering::SeqCst) {
        pump_messages();
        listener.pump(|spec| {
            presses += 1;
            println!("[hotkey] #{presses} {spec}");
        });
        wait_for_events();
    }

    listener.unregister();
    println!("[hotkey] {presses} activation(s)");
    Ok(())
}

#[cfg(not(any(windows, target_os = "linux")))]
pub(super) fn cmd_listen(_custom_path: Option<&Path>) -> Result<()> {
    Err(selectpaste_lib::SelectPasteError::Platform(
        "Global hotkeys are only supported on Windows and Linux".into(),
    ))
}

/// Hotkey messages are posted to the registering thread's queue on Windows.
#[cfg(windows)]
fn pump_messages() {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
    };

    unsafe {
        let mut msg: MSG = std::mem::zeroed();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(windows)]
fn wait_for_events() {
    use windows::Win32::UI::WindowsAndMessaging::{MsgWaitForMultipleObjects, QS_ALLINPUT};

    unsafe {
        MsgWaitForMultipleObjects(None, false, 50, QS_ALLINPUT);
    }
}

// X11 events are handled on global-hotkey's own thread.
#[cfg(target_os = "linux")]
fn pump_messages() {}

#[cfg(target_os = "linux")]
fn wait_for_events() {
    std::thread::sleep(std::time::Duration::from_millis(50));
}
