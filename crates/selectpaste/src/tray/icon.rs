//! Tray icon: a clipboard on a rounded blue tile, embedded as PNG.

use tray_icon::Icon;

const ICON_PNG: &[u8] = include_bytes!("../../assets/icon.png");

/// Decoded icon pixels.
struct IconImage {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

fn decode(png: &[u8]) -> Result<IconImage, image::ImageError> {
    let img = image::load_from_memory(png)?.into_rgba8();
    let (width, height) = img.dimensions();
    Ok(IconImage {
        rgba: img.into_raw(),
        width,
        height,
    })
}

pub fn app_icon() -> selectpaste_lib::error::Result<Icon> {
    let platform_err =
        |e: String| selectpaste_lib::SelectPasteError::Platform(format!("Failed to build tray icon: {e}"));
    let img = decode(ICON_PNG).map_err(|e| platform_err(e.to_string()))?;
    Icon::from_rgba(img.rgba, img.width, img.height).map_err(|e| platform_err(e.to_string()))
}
