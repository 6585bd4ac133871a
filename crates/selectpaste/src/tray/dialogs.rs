//! Blocking message dialogs.

use selectpaste_lib::SelectPasteError;
use selectpaste_lib::config::Config;

const TITLE: &str = "SelectPaste";

/// Text for a hotkey setup failure: what failed, and where to change it.
pub fn hotkey_error_message(error: &SelectPasteError) -> String {
    let config_hint = match Config::path() {
        Some(p) => format!("Change the \"hotkey\" setting in {} and choose Reload Config.", p.display()),
        None => "Change the \"hotkey\" setting in the config file and choose Reload Config.".into(),
    };
    format!("{error}\n\nThe shortcut is inactive until this is fixed.\n{config_hint}")
}

/// Tell the user the shortcut is not active. The app keeps running.
pub fn show_hotkey_error(error: &SelectPasteError) {
    log::error!("[hotkey] {error}");
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(TITLE)
        .set_description(hotkey_error_message(error))
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

/// Show a fatal error. The tray binary has no console on Windows, so this
/// is the only place the user sees it.
pub fn show_fatal_error(msg: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(TITLE)
        .set_description(msg)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
