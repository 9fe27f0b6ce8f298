//! Cargo-style status lines on stderr.

use std::fmt;
use std::sync::OnceLock;

use crossterm::style::{Color, Stylize};

static VERBOSE_OUTPUT: OnceLock<()> = OnceLock::new();

pub fn enable_verbose_output() {
    let _ = VERBOSE_OUTPUT.set(());
}

pub fn is_verbose_output_enabled() -> bool {
    VERBOSE_OUTPUT.get().is_some()
}

static COLOR_OUTPUT: OnceLock<()> = OnceLock::new();

pub fn enable_color_output() {
    let _ = COLOR_OUTPUT.set(());
}

pub fn is_color_output_enabled() -> bool {
    COLOR_OUTPUT.get().is_some()
}

/// Width the status titles are right-aligned to.
const TITLE_WIDTH: usize = 12;

pub fn print_status(title: &'static str, args: fmt::Arguments) {
    eprintln!("{} {args}", Title(title, Color::DarkGreen));
}

pub fn print_error(args: fmt::Arguments) {
    eprintln!("{}: {args}", Label("error", Color::DarkRed));
}

macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log::print_error(format_args!($($arg)*))
    };
}

macro_rules! building {
    ($($arg:tt)*) => {
        $crate::log::print_status("Building", format_args!($($arg)*))
    };
}

macro_rules! optimized {
    ($($arg:tt)*) => {
        $crate::log::print_status("Optimized", format_args!($($arg)*))
    };
}

macro_rules! finished {
    ($($arg:tt)*) => {
        $crate::log::print_status("Finished", format_args!($($arg)*))
    };
}

macro_rules! creating {
    ($($arg:tt)*) => {
        $crate::log::print_status("Creating", format_args!($($arg)*))
    };
}

macro_rules! starting {
    ($($arg:tt)*) => {
        $crate::log::print_status("Starting", format_args!($($arg)*))
    };
}

macro_rules! watching {
    ($($arg:tt)*) => {
        $crate::log::print_status("Watching", format_args!($($arg)*))
    };
}

macro_rules! info {
    ($($arg:tt)*) => {
        if $crate::log::is_verbose_output_enabled() {
            $crate::log::print_status("Info", format_args!($($arg)*))
        }
    };
}

pub(crate) use {building, creating, error, finished, info, optimized, starting, watching};

/// Right-aligned status title.
struct Title(&'static str, Color);

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("{:>TITLE_WIDTH$}", self.0);

        Label(&title, self.1).fmt(f)
    }
}

struct Label<'a>(&'a str, Color);

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_color_output_enabled() {
            write!(f, "{}", self.0.with(self.1).bold())
        } else {
            f.write_str(self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_align() {
        assert_eq!(Title("Building", Color::DarkGreen).to_string(), "    Building");
        assert_eq!(Title("Info", Color::DarkGreen).to_string(), "        Info");
        assert_eq!(Title("Optimized", Color::DarkGreen).to_string(), "   Optimized");
    }
}
