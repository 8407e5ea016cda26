//! Turns one raw input line into a [`Command`].
//!
//! The grammar is deliberately tiny: whitespace-separated words, with special
//! meaning given only to the *tail* of the line — an optional trailing `&`,
//! then up to two trailing `< file` / `> file` pairs in either order. A `<`,
//! `>`, or `&` anywhere else is an ordinary argument. `$$` expansion happens
//! on the raw text, before tokenization.

use crate::command::Command;
use std::path::PathBuf;

/// Replace every `$$` in `line` with the decimal form of `pid`.
///
/// Purely textual and order-preserving: a lone `$` passes through verbatim,
/// and each pair is consumed exactly once left to right, so `$$$` becomes
/// the pid followed by a single `$`.
pub fn expand_pid(line: &str, pid: u32) -> String {
    let pid = pid.to_string();
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'$') {
            chars.next();
            out.push_str(&pid);
        } else {
            out.push(c);
        }
    }
    out
}

/// Resolve a line into a [`Command`], or `None` for blank and comment lines.
///
/// Trailing-token rules, applied in order:
/// 1. an `&` as the very last token is stripped and recorded as a background
///    request (honoring it is decided at launch time, since foreground-only
///    mode can flip between parse and launch);
/// 2. at most two operator/operand pairs are peeled off the new tail; when
///    the same operator appears in both pairs, the pair consumed second —
///    the leftmost one — wins;
/// 3. whatever remains is argv. A line that reduces to an empty argv yields
///    no command.
pub fn parse_line(line: &str) -> Option<Command> {
    let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    match tokens.first() {
        None => return None,
        Some(first) if first.starts_with('#') => return None,
        Some(_) => {}
    }

    let mut background = false;
    if tokens.last().map(String::as_str) == Some("&") {
        tokens.pop();
        background = true;
    }

    let mut stdin_redirect = None;
    let mut stdout_redirect = None;
    for _ in 0..2 {
        if tokens.len() < 2 {
            break;
        }
        let redirect = match tokens[tokens.len() - 2].as_str() {
            "<" => &mut stdin_redirect,
            ">" => &mut stdout_redirect,
            _ => break,
        };
        if let (Some(target), Some(_op)) = (tokens.pop(), tokens.pop()) {
            *redirect = Some(PathBuf::from(target));
        }
    }

    if tokens.is_empty() {
        return None;
    }

    Some(Command {
        args: tokens,
        stdin_redirect,
        stdout_redirect,
        background,
    })
}
