//! `parse` subcommand — show how a hotkey string is understood.

use selectpaste_lib::hotkey;

use super::{ParseOutput, Result, kv, kv_width, print_json};

pub(super) fn parse_output(text: &str) -> Result<ParseOutput> {
    let spec = hotkey::parse(text)?;
    Ok(ParseOutput {
        input: text.to_string(),
        canonical: spec.canonical(),
        modifiers: spec.modifiers.names(),
        modifier_bits: spec.modifiers.bits(),
        key: hotkey::key_name(spec.key),
        key_code: spec.key,
    })
}

pub(super) fn cmd_parse(text: &str, json: bool) -> Result<()> {
    let output = parse_output(text)?;
    if json {
        return print_json(&output);
    }

    let w = kv_width(&["Canonical:", "Modifiers:", "Key:"], &[]);
    kv("Canonical:", &output.canonical, w);
    let modifiers = if output.modifiers.is_empty() {
        "(none)".to_string()
    } else {
        output.modifiers.join(", ")
    };
    kv(
        "Modifiers:",
        format_args!("{modifiers} (0x{:X})", output.modifier_bits),
        w,
    );
    kv(
        "Key:",
        format_args!("{} (0x{:02X})", output.key, output.key_code),
        w,
    );
    Ok(())
}
