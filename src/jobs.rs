use anyhow::Result;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::process::Child;

/// Live background children, in launch order.
///
/// Membership is the source of truth for "a background process is
/// outstanding": a child is inserted on successful background launch and
/// removed only when its termination has been observed, either by the
/// per-iteration sweep or by [`JobRegistry::shutdown`].
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<Child>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Track a freshly launched background child.
    pub fn insert(&mut self, child: Child) {
        self.jobs.push(child);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Non-blocking sweep over every tracked child.
    ///
    /// Children that have terminated are forgotten and announced on `out`
    /// with their exit code or terminating signal. Safe to call any number
    /// of times, including on an empty registry.
    pub fn reap_finished(&mut self, out: &mut dyn Write) -> Result<()> {
        let mut live = Vec::with_capacity(self.jobs.len());
        for mut child in self.jobs.drain(..) {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let pid = child.id();
                    match status.code() {
                        Some(code) => {
                            writeln!(out, "background pid {} is done: exit value {}", pid, code)?
                        }
                        None => writeln!(
                            out,
                            "background pid {} is done: terminated by signal {}",
                            pid,
                            status.signal().unwrap_or(-1)
                        )?,
                    }
                }
                Ok(None) => live.push(child),
                // Already collected somewhere else; nothing left to report.
                Err(_) => {}
            }
        }
        self.jobs = live;
        Ok(())
    }

    /// Terminate and collect every tracked child.
    ///
    /// Runs before the shell exits so no orphan keeps running. Each child is
    /// sent SIGTERM and then waited on; the registry is empty afterwards.
    pub fn shutdown(&mut self) {
        for mut child in self.jobs.drain(..) {
            let _ = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM);
            let _ = child.wait();
        }
    }
}
