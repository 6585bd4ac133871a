//! Tray menu construction and menu event dispatch.

use muda::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};

use selectpaste_lib::config::Config;

use super::icon;

/// All menu items the tray uses, returned from `build_tray_menu`.
pub struct TrayMenu {
    pub paste_item: MenuItem,
    pub reload_item: MenuItem,
    pub folder_item: MenuItem,
    pub quit_item: MenuItem,
}

/// What the event loop should do in response to a menu click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Paste,
    ReloadConfig,
    OpenConfigFolder,
    Quit,
}

impl TrayMenu {
    /// Map a menu event to an action. Events from other menus yield `None`.
    pub fn action_for(&self, event: &MenuEvent) -> Option<MenuAction> {
        let id = event.id();
        if id == self.paste_item.id() {
            Some(MenuAction::Paste)
        } else if id == self.reload_item.id() {
            Some(MenuAction::ReloadConfig)
        } else if id == self.folder_item.id() {
            Some(MenuAction::OpenConfigFolder)
        } else if id == self.quit_item.id() {
            Some(MenuAction::Quit)
        } else {
            None
        }
    }

    /// Show the active shortcut next to "Paste…".
    pub fn set_hotkey_label(&self, hotkey: Option<&str>) {
        self.paste_item.set_text(paste_label(hotkey));
    }
}

fn paste_label(hotkey: Option<&str>) -> String {
    match hotkey {
        Some(h) => format!("Paste…\t{h}"),
        None => "Paste…".to_string(),
    }
}

/// Tooltip text: app name plus the active shortcut.
pub fn tooltip(hotkey: Option<&str>) -> String {
    match hotkey {
        Some(h) => format!("SelectPaste ({h})"),
        None => "SelectPaste (no shortcut)".to_string(),
    }
}

/// Build the tray context menu.
pub fn build_tray_menu(hotkey: Option<&str>) -> (Menu, TrayMenu) {
    let menu = Menu::new();
    let paste_item = MenuItem::new(paste_label(hotkey), true, None);
    let reload_item = MenuItem::new("Reload Config", true, None);
    let folder_item = MenuItem::new("Open Config Folder", true, None);
    let quit_item = MenuItem::new("Quit", true, None);

    let _ = menu.append(&paste_item);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&reload_item);
    let _ = menu.append(&folder_item);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&quit_item);

    (
        menu,
        TrayMenu {
            paste_item,
            reload_item,
            folder_item,
            quit_item,
        },
    )
}

/// Build the tray icon.
pub fn build_tray_icon(
    hotkey: Option<&str>,
    menu: Menu,
) -> selectpaste_lib::error::Result<tray_icon::TrayIcon> {
    tray_icon::TrayIconBuilder::new()
        .with_tooltip(tooltip(hotkey))
        .with_icon(icon::app_icon()?)
        .with_menu(Box::new(menu))
        .build()
        .map_err(|e| {
            selectpaste_lib::SelectPasteError::Platform(format!("Failed to create tray icon: {e}"))
        })
}

/// Open the config directory in the platform file manager, creating it first.
pub fn open_config_folder() {
    let Some(dir) = Config::dir() else {
        log::warn!("[tray] no config directory on this system");
        return;
    };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        log::warn!("[tray] cannot create {}: {e}", dir.display());
        return;
    }
    let opener = if cfg!(windows) { "explorer" } else { "xdg-open" };
    if let Err(e) = std::process::Command::new(opener).arg(&dir).spawn() {
        log::warn!("[tray] {opener} failed: {e}");
    }
}
