//! System tray — single-instance guard, platform event loops, menu and dialogs.

pub(crate) mod dialogs;
mod icon;
mod menu;
mod shared;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(windows)]
mod windows;

use selectpaste_lib::instance::{SINGLE_INSTANCE_TIMEOUT, SysinfoProcessTable, ensure_single_instance};
use selectpaste_lib::retry::ThreadSleeper;

pub fn run() -> selectpaste_lib::error::Result<()> {
    // The newest instance takes over the shortcut; older ones are terminated.
    match ensure_single_instance(&SysinfoProcessTable::new(), &ThreadSleeper, SINGLE_INSTANCE_TIMEOUT)
    {
        Ok(report) if !report.terminated.is_empty() => {
            log::info!("[instance] replaced previous instance(s): {:?}", report.terminated);
        }
        Ok(_) => {}
        Err(e) => log::warn!("[instance] single-instance check skipped: {e}"),
    }

    #[cfg(windows)]
    {
        windows::run()
    }

    #[cfg(target_os = "linux")]
    {
        linux::run()
    }
}
