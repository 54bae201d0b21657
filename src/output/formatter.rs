//! Console line formatting
//!
//! Every user-facing line starts with a short status prefix. Colour is only
//! applied to the prefix and only when the formatter is told to colorize.

use std::fmt::Write;

/// Kind of console line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Success,
    Failure,
    Info,
}

impl LineKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            LineKind::Success => "OK:",
            LineKind::Failure => "ERROR:",
            LineKind::Info => "INFO:",
        }
    }

    fn color(&self) -> Option<&'static str> {
        match self {
            LineKind::Success => Some("\x1b[32m"),
            LineKind::Failure => Some("\x1b[31m"),
            LineKind::Info => None,
        }
    }
}

/// Formats status lines, step banners and the failure summary
#[derive(Clone, Copy, Debug)]
pub struct LineFormatter {
    colorize: bool,
}

impl LineFormatter {
    pub fn new(colorize: bool) -> Self {
        Self { colorize }
    }

    pub fn line(&self, kind: LineKind, message: &str) -> String {
        match (self.colorize, kind.color()) {
            (true, Some(color)) => format!("{color}{}\x1b[0m {message}", kind.prefix()),
            _ => format!("{} {message}", kind.prefix()),
        }
    }

    pub fn step(&self, number: u8, name: &str) -> String {
        let banner = format!("Step {number} - {name}");
        if self.colorize {
            format!("\n\x1b[1m{banner}\x1b[0m")
        } else {
            format!("\n{banner}")
        }
    }

    /// Summary printed when the run stops on a fatal error
    pub fn failure_summary(&self, kind: &str, docs: Option<&str>, message: &str) -> String {
        let mut out = String::new();
        let heading = "Tests could not be completed";
        if self.colorize {
            let _ = writeln!(out, "\x1b[31m{heading}\x1b[0m");
        } else {
            let _ = writeln!(out, "{heading}");
        }
        let _ = writeln!(out, "Please check the error details below.");
        let _ = writeln!(out, "Kind: {kind}");
        if let Some(docs) = docs {
            let _ = writeln!(out, "Documentation: {docs}");
        }
        let _ = write!(out, "Error: {message}");
        out
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}
