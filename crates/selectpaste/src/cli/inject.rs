//! `inject` subcommand — paste text into whatever window has focus.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use selectpaste_lib::clipboard::ArboardClipboard;
use selectpaste_lib::inject::{ClipboardInjector, InjectOutcome};
use selectpaste_lib::input::PlatformKeySender;
use selectpaste_lib::retry::ThreadSleeper;

use super::{RUNNING, Result};

const TICK: Duration = Duration::from_millis(100);

pub(super) fn cmd_inject(
    text: &str,
    delay_ms: u64,
    hold_ms: u64,
    custom_path: Option<&Path>,
) -> Result<()> {
    let config = super::Config::load(custom_path);
    let injector = ClipboardInjector::new(
        ArboardClipboard::new()?,
        PlatformKeySender::new()?,
        ThreadSleeper,
        config.inject_config(),
    );

    if delay_ms > 0 {
        println!("Pasting in {:.1}s, focus the target window...", delay_ms as f64 / 1000.0);
        let mut remaining = Duration::from_millis(delay_ms);
        while !remaining.is_zero() {
            if !RUNNING.load(Ordering::SeqCst) {
                println!("Cancelled.");
                return Ok(());
            }
            let step = remaining.min(TICK);
            std::thread::sleep(step);
            remaining -= step;
        }
    }

    let outcome = injector.inject(text);
    println!("{outcome}");
    // A dropped paste never wrote the clipboard, so someone else still owns it.
    if !matches!(outcome, InjectOutcome::Dropped { .. }) {
        hand_off(injector.clipboard(), hold_ms);
    }
    match outcome {
        InjectOutcome::Pasted { .. } => Ok(()),
        InjectOutcome::Dropped { error, .. } => Err(error.into()),
        InjectOutcome::InputFailed { error, .. } => Err(error.into()),
    }
}

/// Keep the clipboard alive after we exit. X11 and Wayland clipboards are
/// served by their owner, and that is this process until something takes over.
#[cfg(target_os = "linux")]
fn hand_off(clipboard: &ArboardClipboard, hold_ms: u64) {
    if hold_ms == 0 {
        return;
    }
    let deadline = std::time::Instant::now() + Duration::from_millis(hold_ms);
    if let Err(e) = clipboard.hand_off(deadline) {
        log::warn!("[clipboard] hand-off failed: {e}");
    }
}

#[cfg(not(target_os = "linux"))]
fn hand_off(_clipboard: &ArboardClipboard, _hold_ms: u64) {}
