use crate::builtin::{Cd, Exit, Status};
use crate::command::CommandFactory;
use crate::env::Environment;
use crate::external::ExternalCommand;
use crate::parser;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate — the builtins and
/// ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive session: prompt, parse, dispatch, reap.
///
/// The interpreter owns the [`Environment`] and a chain of
/// [`CommandFactory`] objects queried in order for every parsed line. See
/// [`Default`] for the chain included out of the box.
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter with a custom factory chain.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
        }
    }

    /// Process one already-read input line: `$$` expansion, parse, dispatch.
    ///
    /// Blank and comment lines are a successful no-op. User-visible
    /// notifications go to `out`.
    pub fn run_line(&mut self, line: &str, out: &mut dyn Write) -> Result<()> {
        let expanded = parser::expand_pid(line, self.env.shell_pid);
        let Some(command) = parser::parse_line(&expanded) else {
            return Ok(());
        };
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&command) {
                return cmd.execute(out, &mut self.env);
            }
        }
        Ok(())
    }

    /// The Read-Eval-Print Loop.
    ///
    /// Every iteration first sweeps finished background jobs, then prompts.
    /// Ctrl-C only discards the current line — the shell itself never dies
    /// from the interrupt. End of input behaves like `exit`; either way the
    /// remaining background jobs are terminated and collected before
    /// returning.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut out = std::io::stdout();

        while !self.env.should_exit {
            self.env.jobs.reap_finished(&mut out)?;
            match rl.readline(": ") {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    self.run_line(&line, &mut out)?;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
            out.flush()?;
        }

        self.env.jobs.shutdown();
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default chain: the `cd`, `status`, and
    /// `exit` builtins, then the external launcher as the fallback.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Status>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::LastStatus;
    use serial_test::serial;

    fn run(interp: &mut Interpreter, line: &str) -> String {
        let mut out = Vec::new();
        interp.run_line(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_blank_and_comment_lines_do_nothing() {
        let mut interp = Interpreter::default();
        assert!(run(&mut interp, "").is_empty());
        assert!(run(&mut interp, "   ").is_empty());
        assert!(run(&mut interp, "# nothing to see").is_empty());
        assert_eq!(interp.env_mut().last_status, LastStatus::Exited(0));
    }

    #[test]
    fn test_status_before_any_command() {
        let mut interp = Interpreter::default();
        assert_eq!(run(&mut interp, "status"), "exit value 0\n");
    }

    #[test]
    #[serial]
    fn test_foreground_command_updates_status() {
        let mut interp = Interpreter::default();
        run(&mut interp, "false");
        assert_eq!(run(&mut interp, "status"), "exit value 1\n");
        run(&mut interp, "true");
        assert_eq!(run(&mut interp, "status"), "exit value 0\n");
    }

    #[test]
    #[serial]
    fn test_pid_expansion_reaches_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("pid.txt");
        let mut interp = Interpreter::default();
        let line = format!("echo $$ > {}", target.display());
        run(&mut interp, &line);
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            format!("{}\n", std::process::id())
        );
    }

    #[test]
    #[serial]
    fn test_background_line_is_registered() {
        let mut interp = Interpreter::default();
        let out = run(&mut interp, "sleep 30 &");
        assert!(out.starts_with("background pid is "));
        assert_eq!(interp.env_mut().jobs.len(), 1);
        interp.env_mut().jobs.shutdown();
    }

    #[test]
    fn test_exit_marks_the_session_finished() {
        let mut interp = Interpreter::default();
        run(&mut interp, "exit");
        assert!(interp.env_mut().should_exit);
    }
}
