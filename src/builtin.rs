use crate::command::{Command, CommandFactory, ExecutableCommand};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process. None of them touch
/// the last-status record; only external foreground commands do that.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "status".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<()>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<()> {
        match T::execute(*self, stdout, env) {
            Ok(()) => Ok(()),
            Err(e) => {
                writeln!(stdout, "{}", e)?;
                Ok(())
            }
        }
    }
}

struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<()> {
        stdout.write_all(self.output.as_bytes())?;
        Ok(())
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, command: &Command) -> Option<Box<dyn ExecutableCommand>> {
        if command.name() != T::name() {
            return None;
        }
        let args: Vec<&str> = command.args[1..].iter().map(String::as_str).collect();
        Some(match T::from_args(&[T::name()], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
        })
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME
/// environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory.
    /// Defaults to $HOME when omitted; words after the first are ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<()> {
        let target = match self.args.first() {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.home_dir() {
                Some(home) => home,
                None => return Ok(()),
            },
        };

        // A failed change is tolerated silently: the directory stays put.
        // The real chdir matters because children and redirect opens resolve
        // relative paths against it.
        if env::set_current_dir(&target).is_ok() {
            if let Ok(dir) = env::current_dir() {
                env.current_dir = dir;
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Report how the last foreground command ended: its exit value, or the
/// signal that terminated it.
pub struct Status {}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<()> {
        writeln!(stdout, "{}", env.last_status)?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Terminate the shell, ending any outstanding background jobs first.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; the shell always exits successfully.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<()> {
        // The session loop performs the shutdown reap once this is set, so
        // the same path also covers end-of-input.
        env.should_exit = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::LastStatus;
    use serial_test::serial;

    fn command(args: &[&str]) -> Command {
        Command {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin_redirect: None,
            stdout_redirect: None,
            background: false,
        }
    }

    fn run(args: &[&str], env: &mut Environment) -> String {
        let factories: Vec<Box<dyn CommandFactory>> = vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Status>::default()),
            Box::new(Factory::<Exit>::default()),
        ];
        let cmd = command(args);
        let mut out = Vec::new();
        let exec = factories
            .iter()
            .find_map(|f| f.try_create(&cmd))
            .expect("builtin should be claimed by a factory");
        exec.execute(&mut out, env).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_factory_declines_other_names() {
        let factory = Factory::<Status>::default();
        assert!(factory.try_create(&command(&["ls"])).is_none());
        assert!(factory.try_create(&command(&["status"])).is_some());
    }

    #[test]
    fn test_status_reports_initial_exit_zero() {
        let mut env = Environment::new();
        assert_eq!(run(&["status"], &mut env), "exit value 0\n");
    }

    #[test]
    fn test_status_reports_last_outcome_without_mutating_it() {
        let mut env = Environment::new();
        env.last_status = LastStatus::Signaled(2);
        assert_eq!(run(&["status"], &mut env), "terminated by signal 2\n");
        assert_eq!(env.last_status, LastStatus::Signaled(2));
    }

    #[test]
    fn test_exit_flags_the_session() {
        let mut env = Environment::new();
        run(&["exit"], &mut env);
        assert!(env.should_exit);
    }

    #[test]
    #[serial]
    fn test_cd_changes_directory() {
        let saved = env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        run(&["cd", dir.path().to_str().unwrap()], &mut env);
        assert_eq!(env.current_dir, dir.path().canonicalize().unwrap());
        env::set_current_dir(saved).unwrap();
    }

    #[test]
    #[serial]
    fn test_cd_ignores_words_after_the_target() {
        let saved = env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        let out = run(&["cd", dir.path().to_str().unwrap(), "extra", "words"], &mut env);
        assert!(out.is_empty());
        assert_eq!(env.current_dir, dir.path().canonicalize().unwrap());
        env::set_current_dir(saved).unwrap();
    }

    #[test]
    #[serial]
    fn test_cd_failure_is_silent_and_changes_nothing() {
        let mut env = Environment::new();
        let before = env.current_dir.clone();
        let out = run(&["cd", "/definitely/not/a/real/path"], &mut env);
        assert!(out.is_empty());
        assert_eq!(env.current_dir, before);
    }

    #[test]
    #[serial]
    fn test_bare_cd_goes_home() {
        let saved = env::current_dir().unwrap();
        let mut env = Environment::new();
        run(&["cd"], &mut env);
        if let Some(home) = env.home_dir() {
            assert_eq!(env.current_dir, home.canonicalize().unwrap());
        }
        env::set_current_dir(saved).unwrap();
    }
}
