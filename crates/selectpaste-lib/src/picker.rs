//! Text pickers: whatever the user chooses becomes the text to paste.
//!
//! The default picker runs a user-configured shell command and takes its
//! stdout. Any dmenu-style tool fits (`rofi -dmenu < snippets.txt`,
//! `fzf`, a PowerShell `Out-GridView` one-liner, ...).

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use crate::config::Config;

/// Poll interval when waiting for the picker process to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shows a selection UI and blocks until the user picks or cancels.
pub trait Picker {
    /// The chosen text, or `None` when nothing was chosen.
    fn pick(&mut self) -> Option<String>;
}

/// Runs a shell command; its stdout is the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPicker {
    command: String,
    timeout: Duration,
}

impl CommandPicker {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.picker_command.trim(),
            Duration::from_secs(config.picker_timeout_secs),
        )
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Picker for CommandPicker {
    fn pick(&mut self) -> Option<String> {
        if self.command.is_empty() {
            log::warn!("[picker] no picker_command configured");
            return None;
        }
        match run_with_timeout(&self.command, self.timeout) {
            Ok((status, _)) if !status.success() => {
                log::info!("[picker] command exited with {status}, nothing selected");
                None
            }
            Ok((_, output)) => selection_from_output(&output),
            Err(e) => {
                log::warn!("[picker] command failed: {e}: {}", self.command);
                None
            }
        }
    }
}

/// Strip one trailing line ending; blank output means "no selection".
fn selection_from_output(output: &str) -> Option<String> {
    let text = output
        .strip_suffix("\r\n")
        .or_else(|| output.strip_suffix('\n'))
        .unwrap_or(output);
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run a shell command capturing stdout. Kills the process if it exceeds the deadline.
fn run_with_timeout(command: &str, timeout: Duration) -> io::Result<(ExitStatus, String)> {
    let mut child = shell(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()?;

    // Drain stdout on a separate thread so a chatty picker can't fill the pipe
    // and deadlock against try_wait.
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("picker stdout not captured"))?;
    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    });

    let max_polls = (timeout.as_millis() / POLL_INTERVAL.as_millis()).max(1) as u64;
    let mut status = None;
    for _ in 0..max_polls {
        match child.try_wait()? {
            Some(s) => {
                status = Some(s);
                break;
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    }

    let Some(status) = status else {
        log::warn!("[picker] command timed out after {timeout:?}, killing: {command}");
        let _ = child.kill();
        let status = child.wait()?; // reap zombie
        // A grandchild may still hold the pipe open; leave the reader detached.
        return Ok((status, String::new()));
    };

    let output = reader
        .join()
        .map_err(|_| io::Error::other("picker output reader panicked"))?;
    Ok((status, output))
}

/// Scripted picker for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct ScriptedPicker {
        /// Answers handed out in order; `None` once exhausted.
        pub answers: VecDeque<Option<String>>,
        pub calls: u32,
    }

    impl ScriptedPicker {
        pub fn new<I, S>(answers: I) -> Self
        where
            I: IntoIterator<Item = Option<S>>,
            S: Into<String>,
        {
            Self {
                answers: answers.into_iter().map(|a| a.map(Into::into)).collect(),
                calls: 0,
            }
        }
    }

    impl Picker for ScriptedPicker {
        fn pick(&mut self) -> Option<String> {
            self.calls += 1;
            self.answers.pop_front().flatten()
        }
    }
}
