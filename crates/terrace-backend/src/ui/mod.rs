//! Reporting sink
//!
//! Operations report to an optional [`Cli`]. When none is attached they run
//! silently and callers inspect the running operation instead.

mod colorize;
mod format;

pub use colorize::Colorize;
pub use format::format_plan;

use parking_lot::Mutex;
use std::fmt::Debug;
use std::path::Path;

/// Where human-facing messages go
pub trait Cli: Send + Sync + Debug {
    /// Regular output
    fn output(&self, message: &str);

    /// Error output
    fn error(&self, message: &str);
}

/// Writes to stdout and stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StdCli;

impl Cli for StdCli {
    fn output(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct BufferCli {
    output: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl BufferCli {
    /// Empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Regular output so far, one entry per call
    #[must_use]
    pub fn output_lines(&self) -> Vec<String> {
        self.output.lock().clone()
    }

    /// All regular output joined with newlines
    #[must_use]
    pub fn output_text(&self) -> String {
        self.output.lock().join("\n")
    }

    /// Error output so far
    #[must_use]
    pub fn error_lines(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Cli for BufferCli {
    fn output(&self, message: &str) {
        self.output.lock().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

/// Printed when a plan changes nothing
pub const NO_CHANGES: &str = "No changes. Infrastructure is up-to-date. This means that Terrace\n\
could not detect any differences between your configuration and\n\
the real physical resources that exist. As a result, Terrace\n\
doesn't need to do anything.";

const PLAN_HEADER_INTRO: &str = "The Terrace execution plan has been generated and is shown below.\n\
Resources are shown in alphabetical order for quick scanning. Green resources\n\
will be created (or destroyed and then created if an existing resource\n\
exists), yellow resources are being changed in-place, and red resources\n\
will be destroyed. Cyan entries are data sources to be read.";

/// Header printed above a plan, depending on whether it was saved
#[must_use]
pub fn plan_header(saved_to: Option<&Path>) -> String {
    match saved_to {
        None => format!(
            "{PLAN_HEADER_INTRO}\n\n\
             Note: You didn't specify an \"-out\" parameter to save this plan, so when\n\
             \"apply\" is called, Terrace can't guarantee this is what will execute.\n"
        ),
        Some(path) => format!(
            "{PLAN_HEADER_INTRO}\n\n\
             Your plan was also saved to the path below. Call the \"apply\" subcommand\n\
             with this plan file and Terrace will exactly execute this execution\n\
             plan.\n\n\
             Path: {}\n",
            path.display()
        ),
    }
}

/// One-line plan summary
#[must_use]
pub fn plan_summary(add: usize, change: usize, destroy: usize) -> String {
    format!("[reset][bold]Plan:[reset] {add} to add, {change} to change, {destroy} to destroy.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_saved_path() {
        let saved = plan_header(Some(Path::new("out.plan")));
        assert!(saved.ends_with("Path: out.plan\n"));
        assert!(!saved.contains("-out"));

        let unsaved = plan_header(None);
        assert!(unsaved.contains("You didn't specify an \"-out\" parameter"));
        assert!(unsaved.starts_with("The Terrace execution plan has been generated"));
    }

    #[test]
    fn summary_strips_cleanly() {
        let line = Colorize::plain().color(&plan_summary(3, 1, 2));
        assert_eq!(line, "Plan: 3 to add, 1 to change, 2 to destroy.");
    }
}
