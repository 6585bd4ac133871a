//! CLI subcommands — hotkey parsing, config, paste injection, instances.

mod config_cmd;
mod inject;
mod instances;
mod listen;
mod parse;

use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use selectpaste_lib::config::Config;
pub(super) use selectpaste_lib::error::Result;

const PADDING: usize = 2;

/// Options shared by every subcommand.
pub struct GlobalOpts {
    pub json: bool,
    pub config: Option<PathBuf>,
}

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Serialize `value` as pretty JSON to stdout.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        selectpaste_lib::SelectPasteError::Platform(format!("JSON encoding failed: {e}"))
    })?;
    println!("{text}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ParseOutput {
    pub input: String,
    pub canonical: String,
    pub modifiers: Vec<&'static str>,
    pub modifier_bits: u32,
    pub key: String,
    pub key_code: u32,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub log_file: Option<String>,
    pub settings: Config,
    pub problems: Vec<String>,
}

#[derive(Serialize)]
pub(super) struct InstancesOutput {
    pub name: String,
    pub pids: Vec<u32>,
    pub terminated: Option<Vec<u32>>,
    pub survivors: Option<Vec<u32>>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a hotkey string and show its modifiers and virtual key code
    Parse {
        /// Hotkey, e.g. "Shift + Alt + ."
        hotkey: String,
    },

    /// Show current configuration and file paths
    Config,

    /// Paste text into the focused window using the clipboard
    ///
    /// On Linux the clipboard text is served by the process that set it. After
    /// restoring your clipboard this command keeps serving it for --hold-ms, or
    /// until a clipboard manager takes it over. Without a clipboard manager the
    /// restored text is lost when the command exits.
    Inject {
        /// Text to paste
        text: String,
        /// Wait before pasting so you can focus the target window (ms)
        #[arg(long, default_value_t = 3000)]
        delay_ms: u64,
        /// Linux only: keep serving the restored clipboard this long (ms)
        #[arg(long, default_value_t = 2000)]
        hold_ms: u64,
    },

    /// List running tray instances
    Instances {
        /// Terminate every running instance
        #[arg(long)]
        kill: bool,
        /// Process name to look for (default: the tray executable)
        #[arg(long)]
        name: Option<String>,
    },

    /// Register the configured hotkey and print activations until Ctrl+C
    Listen,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, opts: &GlobalOpts) -> Result<()> {
    let custom = opts.config.as_deref();
    match cmd {
        Command::Parse { hotkey } => parse::cmd_parse(&hotkey, opts.json),
        Command::Config => config_cmd::cmd_config(opts.json, custom),
        Command::Inject {
            text,
            delay_ms,
            hold_ms,
        } => {
            if opts.json {
                warn_json_unsupported("inject");
            }
            inject::cmd_inject(&text, delay_ms, hold_ms, custom)
        }
        Command::Instances { kill, name } => instances::cmd_instances(kill, name, opts.json),
        Command::Listen => {
            if opts.json {
                warn_json_unsupported("listen");
            }
            listen::cmd_listen(custom)
        }
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        let w = kv_width(&["A:"], &["Very long indent key:"]);
        // "Very long indent key:" = 21 + PADDING + 2 = 25
        assert_eq!(w, 25);
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }

    #[test]
    fn values_align_across_levels() {
        let w = kv_width(&["Config file:"], &["hotkey:"]);
        let top = format_kv("Config file:", "V", w);
        let indent = format!("  {:<width$}{}", "hotkey:", "V", width = w - 2);
        assert_eq!(top.find('V'), indent.find('V'));
    }

    #[test]
    fn format_kv_longer_than_width_has_no_padding() {
        assert_eq!(format_kv("ExactWidth:", "val", 10), "ExactWidth:val");
    }
}
