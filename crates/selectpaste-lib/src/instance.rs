//! Single-instance guard.
//!
//! Only one process may own the global shortcut. On startup the newest
//! instance wins: every other process with the same executable name is
//! force-terminated and waited on for a bounded time. Whatever state the old
//! instance had is lost.

use std::time::Duration;

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

use crate::retry::Sleeper;

/// How long to wait for terminated siblings to exit.
pub const SINGLE_INSTANCE_TIMEOUT: Duration = Duration::from_secs(3);

/// Poll interval while waiting for terminated processes to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Process enumeration and termination.
pub trait ProcessTable {
    fn current_pid(&self) -> Option<u32>;
    fn process_name(&self, pid: u32) -> Option<String>;
    /// Live processes whose executable name matches `name`.
    fn pids_named(&self, name: &str) -> Vec<u32>;
    /// Request forced termination. Returns false if the request was refused.
    fn terminate(&self, pid: u32) -> bool;
    fn is_running(&self, pid: u32) -> bool;
}

/// Outcome of a guard run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardReport {
    /// Pids that were terminated and have exited.
    pub terminated: Vec<u32>,
    /// Pids still running after the wait (refused or slow to die).
    pub survivors: Vec<u32>,
}

impl GuardReport {
    pub fn is_clean(&self) -> bool {
        self.survivors.is_empty()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    if cfg!(windows) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Terminate every process named `name` except `exclude`, then wait up to
/// `timeout` for them to exit. Proceeds regardless of survivors.
pub fn terminate_all(
    table: &impl ProcessTable,
    sleeper: &impl Sleeper,
    name: &str,
    exclude: Option<u32>,
    timeout: Duration,
) -> GuardReport {
    let targets: Vec<u32> = table
        .pids_named(name)
        .into_iter()
        .filter(|&pid| Some(pid) != exclude)
        .collect();
    if targets.is_empty() {
        return GuardReport::default();
    }

    for &pid in &targets {
        if table.terminate(pid) {
            log::info!("[instance] terminating previous instance (pid {pid})");
        } else {
            log::warn!("[instance] could not terminate pid {pid}");
        }
    }

    let max_polls = (timeout.as_millis() / POLL_INTERVAL.as_millis()).max(1);
    for _ in 0..max_polls {
        if targets.iter().all(|&pid| !table.is_running(pid)) {
            break;
        }
        sleeper.sleep(POLL_INTERVAL);
    }

    let (survivors, terminated): (Vec<u32>, Vec<u32>) =
        targets.into_iter().partition(|&pid| table.is_running(pid));
    if !survivors.is_empty() {
        log::warn!("[instance] still running after {timeout:?}: {survivors:?}");
    }
    GuardReport {
        terminated,
        survivors,
    }
}

/// Make the calling process the only one of its name.
pub fn ensure_single_instance(
    table: &impl ProcessTable,
    sleeper: &impl Sleeper,
    timeout: Duration,
) -> crate::error::Result<GuardReport> {
    let pid = table.current_pid().ok_or_else(|| {
        crate::SelectPasteError::Platform("Cannot determine current process id".into())
    })?;
    let name = table.process_name(pid).ok_or_else(|| {
        crate::SelectPasteError::Platform(format!("Cannot determine name of process {pid}"))
    })?;
    Ok(terminate_all(table, sleeper, &name, Some(pid), timeout))
}

// ── sysinfo implementation ──

/// Process table backed by `sysinfo`. Every query refreshes the snapshot.
pub struct SysinfoProcessTable {
    system: std::cell::RefCell<System>,
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        Self {
            system: std::cell::RefCell::new(System::new()),
        }
    }

    fn refresh(&self) -> std::cell::Ref<'_, System> {
        self.system
            .borrow_mut()
            .refresh_processes(ProcessesToUpdate::All, true);
        self.system.borrow()
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn current_pid(&self) -> Option<u32> {
        sysinfo::get_current_pid().ok().map(|p| p.as_u32())
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let system = self.refresh();
        system
            .process(Pid::from_u32(pid))
            .map(|p| p.name().to_string_lossy().into_owned())
    }

    fn pids_named(&self, name: &str) -> Vec<u32> {
        let system = self.refresh();
        let mut pids: Vec<u32> = system
            .processes()
            .iter()
            .filter(|(_, p)| p.status() != ProcessStatus::Zombie)
            .filter(|(_, p)| same_name(&p.name().to_string_lossy(), name))
            .map(|(pid, _)| pid.as_u32())
            .collect();
        pids.sort_unstable();
        pids
    }

    fn terminate(&self, pid: u32) -> bool {
        let system = self.refresh();
        system
            .process(Pid::from_u32(pid))
            .is_some_and(|p| p.kill())
    }

    fn is_running(&self, pid: u32) -> bool {
        let system = self.refresh();
        // A killed child of ours stays a zombie until reaped; it is gone for our purposes.
        system
            .process(Pid::from_u32(pid))
            .is_some_and(|p| p.status() != ProcessStatus::Zombie)
    }
}

/// In-memory process table for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};

    pub struct MockProcessTable {
        /// Live processes: (pid, name).
        pub processes: RefCell<Vec<(u32, String)>>,
        pub current: u32,
        /// Pids that ignore termination.
        pub unkillable: RefCell<Vec<u32>>,
        /// Liveness checks a terminated process survives before exiting.
        pub exit_after_polls: Cell<u32>,
        pub terminated: RefCell<Vec<u32>>,
        dying: RefCell<Vec<(u32, u32)>>,
    }

    impl MockProcessTable {
        pub fn new(current: u32, processes: &[(u32, &str)]) -> Self {
            Self {
                processes: RefCell::new(
                    processes
                        .iter()
                        .map(|(pid, name)| (*pid, name.to_string()))
                        .collect(),
                ),
                current,
                unkillable: RefCell::new(Vec::new()),
                exit_after_polls: Cell::new(0),
                terminated: RefCell::new(Vec::new()),
                dying: RefCell::new(Vec::new()),
            }
        }

        pub fn pids(&self) -> Vec<u32> {
            self.processes.borrow().iter().map(|(p, _)| *p).collect()
        }

        fn advance(&self) {
            let mut finished = Vec::new();
            for (pid, left) in self.dying.borrow_mut().iter_mut() {
                if *left == 0 {
                    finished.push(*pid);
                } else {
                    *left -= 1;
                }
            }
            self.dying
                .borrow_mut()
                .retain(|(pid, _)| !finished.contains(pid));
            self.processes
                .borrow_mut()
                .retain(|(pid, _)| !finished.contains(pid));
        }
    }

    impl ProcessTable for MockProcessTable {
        fn current_pid(&self) -> Option<u32> {
            Some(self.current)
        }

        fn process_name(&self, pid: u32) -> Option<String> {
            self.processes
                .borrow()
                .iter()
                .find(|(p, _)| *p == pid)
                .map(|(_, n)| n.clone())
        }

        fn pids_named(&self, name: &str) -> Vec<u32> {
            self.processes
                .borrow()
                .iter()
                .filter(|(_, n)| n == name)
                .map(|(p, _)| *p)
                .collect()
        }

        fn terminate(&self, pid: u32) -> bool {
            self.terminated.borrow_mut().push(pid);
            if self.unkillable.borrow().contains(&pid) {
                return false;
            }
            self.dying
                .borrow_mut()
                .push((pid, self.exit_after_polls.get()));
            true
        }

        fn is_running(&self, pid: u32) -> bool {
            self.advance();
            self.processes.borrow().iter().any(|(p, _)| *p == pid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockProcessTable;
    use super::*;
    use crate::retry::mock::RecordingSleeper;

    #[test]
    fn leaves_exactly_one_instance() {
        let table = MockProcessTable::new(
            20,
            &[(10, "selectpaste"), (20, "selectpaste"), (30, "selectpaste"), (40, "editor")],
        );
        let sleeper = RecordingSleeper::new();
        let report = ensure_single_instance(&table, &sleeper, SINGLE_INSTANCE_TIMEOUT).unwrap();

        assert_eq!(report.terminated, vec![10, 30]);
        assert!(report.is_clean());
        assert_eq!(table.pids_named("selectpaste"), vec![20]);
        assert_eq!(table.pids(), vec![20, 40]);
    }

    #[test]
    fn never_terminates_caller() {
        let table = MockProcessTable::new(7, &[(7, "selectpaste")]);
        let sleeper = RecordingSleeper::new();
        let report = ensure_single_instance(&table, &sleeper, SINGLE_INSTANCE_TIMEOUT).unwrap();
        assert_eq!(report, GuardReport::default());
        assert!(table.terminated.borrow().is_empty());
        assert!(sleeper.sleeps.borrow().is_empty());
    }

    #[test]
    fn unkillable_sibling_is_reported_after_timeout() {
        let table = MockProcessTable::new(2, &[(1, "selectpaste"), (2, "selectpaste")]);
        table.unkillable.borrow_mut().push(1);
        let sleeper = RecordingSleeper::new();

        let report = ensure_single_instance(&table, &sleeper, SINGLE_INSTANCE_TIMEOUT).unwrap();
        assert!(report.terminated.is_empty());
        assert_eq!(report.survivors, vec![1]);
        assert!(!report.is_clean());
        // Waited the full bound, then proceeded.
        assert_eq!(sleeper.total(), SINGLE_INSTANCE_TIMEOUT);
    }

    #[test]
    fn slow_exit_is_waited_for() {
        let table = MockProcessTable::new(2, &[(1, "selectpaste"), (2, "selectpaste")]);
        table.exit_after_polls.set(3);
        let sleeper = RecordingSleeper::new();

        let report = ensure_single_instance(&table, &sleeper, SINGLE_INSTANCE_TIMEOUT).unwrap();
        assert_eq!(report.terminated, vec![1]);
        assert!(report.is_clean());
        assert_eq!(sleeper.sleeps.borrow().len(), 3);
    }

    #[test]
    fn terminate_all_by_name_without_exclusion() {
        let table = MockProcessTable::new(99, &[(1, "selectpaste"), (2, "selectpaste")]);
        let sleeper = RecordingSleeper::new();
        let report = terminate_all(&table, &sleeper, "selectpaste", None, SINGLE_INSTANCE_TIMEOUT);
        assert_eq!(report.terminated, vec![1, 2]);
        assert!(table.pids().is_empty());
    }

    #[test]
    fn unknown_current_process_is_platform_error() {
        let table = MockProcessTable::new(5, &[]);
        let err = ensure_single_instance(&table, &RecordingSleeper::new(), SINGLE_INSTANCE_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, crate::SelectPasteError::Platform(_)));
    }

    #[test]
    fn sysinfo_sees_current_process() {
        let table = SysinfoProcessTable::new();
        let pid = table.current_pid().unwrap();
        assert!(table.is_running(pid));
        let name = table.process_name(pid).unwrap();
        assert!(table.pids_named(&name).contains(&pid));
    }
}
