//! Console output
//!
//! Progress for the operator goes to stdout; diagnostics go through tracing.

mod formatter;

pub use formatter::{LineFormatter, LineKind};

use std::io::IsTerminal;

fn formatter() -> LineFormatter {
    LineFormatter::new(std::io::stdout().is_terminal())
}

pub fn print_success(message: &str) {
    println!("{}", formatter().line(LineKind::Success, message));
}

/// Report a failed check without stopping
pub fn complain(message: &str) {
    println!("{}", formatter().line(LineKind::Failure, message));
}

pub fn print_info(message: &str) {
    println!("{}", formatter().line(LineKind::Info, message));
}

pub fn print_step(number: u8, name: &str) {
    println!("{}", formatter().step(number, name));
}

pub fn print_failure_summary(kind: &str, docs: Option<&str>, message: &str) {
    println!("{}", formatter().failure_summary(kind, docs, message));
}
