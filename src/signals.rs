//! The shell's own signal dispositions and the foreground-only mode flag.
//!
//! SIGINT never kills the shell; SIGTSTP toggles foreground-only mode. The
//! toggle handler runs asynchronously with respect to the REPL loop, so it
//! touches nothing but one atomic flag and a raw `write(2)` — both safe at
//! any point of the main loop's execution. Everyone else polls the flag.

use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::sync::atomic::{AtomicBool, Ordering};

/// Sole writer is the SIGTSTP handler; a relaxed boolean is enough since no
/// compound invariant spans it.
static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

const ENTER_MSG: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n";
const LEAVE_MSG: &[u8] = b"\nExiting foreground-only mode\n";

/// Whether background requests are currently overridden to foreground.
///
/// May flip between any two reads; callers sample it once at launch time.
pub fn foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::Relaxed)
}

extern "C" fn handle_sigtstp(_sig: libc::c_int) {
    let was_on = FOREGROUND_ONLY.fetch_xor(true, Ordering::Relaxed);
    let msg: &[u8] = if was_on { LEAVE_MSG } else { ENTER_MSG };
    // Reentrant-safe notification path; stdio buffering is off limits here.
    unsafe {
        let _ = libc::write(libc::STDOUT_FILENO, msg.as_ptr().cast(), msg.len());
    }
}

/// Install the shell's dispositions: SIGINT ignored outright, SIGTSTP routed
/// to the mode toggle. Called once at startup, before the first prompt.
pub fn install() -> nix::Result<()> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    let toggle = SigAction::new(
        SigHandler::Handler(handle_sigtstp),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );
    unsafe {
        sigaction(Signal::SIGINT, &ignore)?;
        sigaction(Signal::SIGTSTP, &toggle)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn set_foreground_only(on: bool) {
    FOREGROUND_ONLY.store(on, Ordering::Relaxed);
}
