use crate::command::LastStatus;
use crate::jobs::JobRegistry;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable session state threaded through every executed command.
///
/// The environment contains:
/// - `shell_pid`: the shell's own pid, used by `$$` expansion.
/// - `current_dir`: cached copy of the working directory; `cd` performs the
///   real directory change and refreshes this field.
/// - `should_exit`: a flag the REPL loop checks to know when to terminate.
/// - `last_status`: how the most recent foreground command ended.
/// - `jobs`: the live background children.
pub struct Environment {
    /// The shell's own process id.
    pub shell_pid: u32,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
    /// Outcome of the last foreground command, as reported by `status`.
    pub last_status: LastStatus,
    /// Background children that have not been reaped yet.
    pub jobs: JobRegistry,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            shell_pid: std::process::id(),
            current_dir,
            should_exit: false,
            last_status: LastStatus::default(),
            jobs: JobRegistry::new(),
        }
    }

    /// The directory a bare `cd` changes to.
    pub fn home_dir(&self) -> Option<PathBuf> {
        stdenv::var_os("HOME").map(PathBuf::from)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_environment() {
        let env = Environment::new();
        assert_eq!(env.shell_pid, std::process::id());
        assert_eq!(env.last_status, LastStatus::Exited(0));
        assert!(!env.should_exit);
        assert!(env.jobs.is_empty());
    }

    #[test]
    fn test_home_dir_reads_process_env() {
        // HOME is set in any sane test environment.
        let env = Environment::new();
        assert_eq!(env.home_dir(), stdenv::var_os("HOME").map(PathBuf::from));
    }
}
