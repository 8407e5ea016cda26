use crate::env::Environment;
use anyhow::Result;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

/// One fully resolved input line.
///
/// Redirect targets and the background flag come from trailing tokens only;
/// the parser strips them from `args` exactly once per line. The `background`
/// field records what the user *asked for* — whether it is honored is decided
/// at launch time against the current foreground-only mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Program name and arguments; element 0 is the program name.
    pub args: Vec<String>,
    /// File to bind to the child's standard input, if any.
    pub stdin_redirect: Option<PathBuf>,
    /// File to bind to the child's standard output, if any.
    pub stdout_redirect: Option<PathBuf>,
    /// Whether the line ended with `&`.
    pub background: bool,
}

impl Command {
    /// The program name. The parser never yields an empty argv.
    pub fn name(&self) -> &str {
        &self.args[0]
    }
}

/// How the last foreground command ended.
///
/// Read by the `status` builtin and overwritten by every completed foreground
/// command; background completions never touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastStatus {
    /// Normal exit with the given code.
    Exited(i32),
    /// Killed by the given signal number.
    Signaled(i32),
}

impl Default for LastStatus {
    /// Before any foreground command has run, `status` reports exit value 0.
    fn default() -> Self {
        LastStatus::Exited(0)
    }
}

impl fmt::Display for LastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastStatus::Exited(code) => write!(f, "exit value {}", code),
            LastStatus::Signaled(sig) => write!(f, "terminated by signal {}", sig),
        }
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by the external
/// process launcher.
pub trait ExecutableCommand {
    /// Executes the command, writing user-visible notifications to `stdout`.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<()>;
}

/// Factory that tries to claim a parsed command.
///
/// Returns `None` when the factory doesn't recognize the program name. The
/// external-command factory claims everything, so it goes last in the chain.
pub trait CommandFactory {
    /// Attempt to create an executable instance for the parsed command.
    fn try_create(&self, command: &Command) -> Option<Box<dyn ExecutableCommand>>;
}
