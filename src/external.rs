use crate::command::{Command, CommandFactory, ExecutableCommand, LastStatus};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::signals;
use anyhow::{Context, Result};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::Stdio;

/// Command that is not a builtin: launched as a child process.
///
/// Foreground launches block until the child ends and record its outcome in
/// the environment; background launches are announced, inserted into the job
/// registry, and left to the per-iteration reap.
pub struct ExternalCommand {
    command: Command,
}

impl CommandFactory for Factory<ExternalCommand> {
    /// The launcher is the fallback: it claims every command, letting the
    /// program-resolution failure surface from the spawn itself.
    fn try_create(&self, command: &Command) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand {
            command: command.clone(),
        }))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, out: &mut dyn Write, env: &mut Environment) -> Result<()> {
        let command = self.command;
        // The mode is sampled here, at launch time, not at parse time: a
        // SIGTSTP arriving between prompt-read and launch still applies.
        let background = command.background && !signals::foreground_only();

        let stdin = match input_stdio(command.stdin_redirect.as_deref(), background) {
            Ok(stdio) => stdio,
            Err((path, e)) => {
                eprintln!("cannot open {} for input: {}", path.display(), e);
                env.last_status = LastStatus::Exited(1);
                return Ok(());
            }
        };
        let stdout = match output_stdio(command.stdout_redirect.as_deref(), background) {
            Ok(stdio) => stdio,
            Err((path, e)) => {
                eprintln!("cannot open {} for output: {}", path.display(), e);
                env.last_status = LastStatus::Exited(1);
                return Ok(());
            }
        };

        let mut launch = std::process::Command::new(command.name());
        launch
            .args(&command.args[1..])
            .current_dir(&env.current_dir)
            .stdin(stdin)
            .stdout(stdout);
        unsafe {
            launch.pre_exec(move || set_child_dispositions(background));
        }

        let mut child = match launch.spawn() {
            Ok(child) => child,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
                // Unresolvable program: report per-program, shell continues.
                eprintln!("{}: {}", command.name(), e);
                if !background {
                    env.last_status = LastStatus::Exited(1);
                }
                return Ok(());
            }
            // Losing the ability to create children at all is fatal.
            Err(e) => {
                return Err(e).with_context(|| format!("failed to launch {}", command.name()));
            }
        };

        if background {
            writeln!(out, "background pid is {}", child.id())?;
            env.jobs.insert(child);
            return Ok(());
        }

        let status = child.wait()?;
        env.last_status = match status.code() {
            Some(code) => LastStatus::Exited(code),
            None => {
                let sig = status.signal().unwrap_or(-1);
                if sig == Signal::SIGINT as i32 {
                    writeln!(out, "terminated by signal {}", sig)?;
                }
                LastStatus::Signaled(sig)
            }
        };
        Ok(())
    }
}

type OpenError<'a> = (&'a Path, io::Error);

/// Resolve the child's standard input: an explicit file, the null device for
/// unattended background jobs, or the inherited terminal.
fn input_stdio(redirect: Option<&Path>, background: bool) -> Result<Stdio, OpenError<'_>> {
    match redirect {
        Some(path) => match File::open(path) {
            Ok(file) => Ok(Stdio::from(file)),
            Err(e) => Err((path, e)),
        },
        None if background => Ok(Stdio::null()),
        None => Ok(Stdio::inherit()),
    }
}

/// Resolve the child's standard output; explicit targets are created or
/// truncated, write-only.
fn output_stdio(redirect: Option<&Path>, background: bool) -> Result<Stdio, OpenError<'_>> {
    match redirect {
        Some(path) => match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
        {
            Ok(file) => Ok(Stdio::from(file)),
            Err(e) => Err((path, e)),
        },
        None if background => Ok(Stdio::null()),
        None => Ok(Stdio::inherit()),
    }
}

/// Runs in the child between fork and exec, so only async-signal-safe calls.
/// A foreground child must die from the interrupt; a background child must
/// ignore it. Both ignore the stop signal.
fn set_child_dispositions(background: bool) -> io::Result<()> {
    let interrupt = if background {
        SigHandler::SigIgn
    } else {
        SigHandler::SigDfl
    };
    let interrupt = SigAction::new(interrupt, SaFlags::empty(), SigSet::empty());
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe {
        sigaction(Signal::SIGINT, &interrupt).map_err(to_io_error)?;
        sigaction(Signal::SIGTSTP, &ignore).map_err(to_io_error)?;
    }
    Ok(())
}

fn to_io_error(e: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(e as i32)
}
