//! Inline color codes
//!
//! Messages are written with bracketed codes such as `[bold]` or `[green]`.
//! [`Colorize`] turns them into ANSI escapes, or strips them when colors are
//! disabled. Unknown bracketed words are left as they are.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([a-z_]+)\]").unwrap());

const RESET: &str = "\x1b[0m";

fn ansi(name: &str) -> Option<&'static str> {
    Some(match name {
        "reset" => RESET,
        "bold" => "\x1b[1m",
        "dim" => "\x1b[2m",
        "underline" => "\x1b[4m",
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "cyan" => "\x1b[36m",
        _ => return None,
    })
}

/// Color code translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colorize {
    /// Strip codes instead of translating them
    pub disable: bool,
    /// Append a reset after any colored message
    pub reset: bool,
}

impl Default for Colorize {
    fn default() -> Self {
        Self {
            disable: false,
            reset: true,
        }
    }
}

impl Colorize {
    /// Translator that only strips codes
    #[must_use]
    pub fn plain() -> Self {
        Self {
            disable: true,
            reset: false,
        }
    }

    /// Translate or strip the codes in `message`
    #[must_use]
    pub fn color(&self, message: &str) -> String {
        let mut colored = false;
        let out = CODE.replace_all(message, |caps: &Captures<'_>| match ansi(&caps[1]) {
            Some(_) if self.disable => String::new(),
            Some(code) => {
                colored = true;
                code.to_string()
            }
            None => caps[0].to_string(),
        });

        let mut out = out.into_owned();
        if colored && self.reset {
            out.push_str(RESET);
        }
        out
    }
}
