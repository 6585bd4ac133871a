//! `config` subcommand — show current configuration and file paths.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_indent, kv_width, print_json};

pub(super) fn cmd_config(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let config = super::Config::load(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errs) => errs.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            log_file: Config::log_path().map(|p| p.display().to_string()),
            settings: config,
            problems,
        };
        return print_json(&output);
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:", "Log file:"],
        &[
            "hotkey:",
            "picker_command:",
            "picker_timeout_secs:",
            "clipboard_attempts:",
            "clipboard_retry_ms:",
            "focus_delay_ms:",
            "paste_settle_ms:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    match Config::log_path() {
        Some(p) => kv("Log file:", p.display(), w),
        None => kv("Log file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    let hotkey_display = match config.hotkey_spec() {
        Ok(spec) => format!("{} -> {}", config.hotkey, spec.canonical()),
        Err(_) => format!("{} (invalid)", config.hotkey),
    };
    kv_indent("hotkey:", &hotkey_display, w);
    let picker = if config.picker_command.trim().is_empty() {
        "(not set)"
    } else {
        config.picker_command.as_str()
    };
    kv_indent("picker_command:", picker, w);
    kv_indent("picker_timeout_secs:", config.picker_timeout_secs, w);
    kv_indent("clipboard_attempts:", config.clipboard_attempts, w);
    kv_indent("clipboard_retry_ms:", config.clipboard_retry_ms, w);
    kv_indent("focus_delay_ms:", config.focus_delay_ms, w);
    kv_indent("paste_settle_ms:", config.paste_settle_ms, w);

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}
