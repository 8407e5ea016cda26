//! A small interactive shell with single-job control.
//!
//! This crate implements a restricted command interpreter: whitespace-split
//! commands with optional trailing I/O redirection and backgrounding, a
//! `$$` pid substitution, three builtins (`cd`, `status`, `exit`), a
//! registry of background children reaped once per prompt, and a SIGTSTP
//! driven foreground-only mode. It is intentionally small and easy to read,
//! suitable for experiments with process management and signal handling.
//!
//! The main entry point is [`Interpreter`], which runs the interactive loop.
//! The public modules expose the pieces individually: the [`parser`] grammar,
//! the [`jobs`] registry, and the [`signals`] mode controller.

mod builtin;
pub mod command;
pub mod env;
mod external;
mod interpreter;
pub mod jobs;
pub mod parser;
pub mod signals;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
