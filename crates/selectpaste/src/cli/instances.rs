//! `instances` subcommand — list or terminate running tray instances.

use selectpaste_lib::instance::{
    ProcessTable, SINGLE_INSTANCE_TIMEOUT, SysinfoProcessTable, terminate_all,
};
use selectpaste_lib::retry::ThreadSleeper;

use super::{InstancesOutput, Result, kv, kv_width, print_json};

/// Executable name of the tray app on this platform.
pub(super) fn tray_process_name() -> &'static str {
    if cfg!(windows) {
        "selectpaste.exe"
    } else {
        "selectpaste"
    }
}

pub(super) fn cmd_instances(kill: bool, name: Option<String>, json: bool) -> Result<()> {
    let name = name.unwrap_or_else(|| tray_process_name().to_string());
    let table = SysinfoProcessTable::new();
    let own = table.current_pid();
    let pids: Vec<u32> = table
        .pids_named(&name)
        .into_iter()
        .filter(|&p| Some(p) != own)
        .collect();

    let report = kill.then(|| terminate_all(&table, &ThreadSleeper, &name, own, SINGLE_INSTANCE_TIMEOUT));

    if json {
        let output = InstancesOutput {
            name,
            pids,
            terminated: report.as_ref().map(|r| r.terminated.clone()),
            survivors: report.as_ref().map(|r| r.survivors.clone()),
        };
        return print_json(&output);
    }

    let w = kv_width(&["Process:", "Running:", "Terminated:", "Still running:"], &[]);
    kv("Process:", &name, w);
    kv("Running:", format_pids(&pids), w);
    if let Some(r) = &report {
        kv("Terminated:", format_pids(&r.terminated), w);
        if !r.survivors.is_empty() {
            kv("Still running:", format_pids(&r.survivors), w);
        }
    }
    Ok(())
}

fn format_pids(pids: &[u32]) -> String {
    if pids.is_empty() {
        "(none)".to_string()
    } else {
        pids.iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
