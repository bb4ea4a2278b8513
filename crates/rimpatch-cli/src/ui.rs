// Console output helpers shared by the commands.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);
static COLOR: AtomicBool = AtomicBool::new(false);

pub fn init(quiet: bool, color: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    COLOR.store(color, Ordering::Relaxed);
}

pub fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn color() -> bool {
    COLOR.load(Ordering::Relaxed)
}

fn icons() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_ICONS").is_none()
}

#[derive(Debug, Clone, Copy)]
pub enum Level {
    Ok,
    Info,
    Warn,
    Err,
}

/// Icon (possibly colored) followed by a space, or nothing when icons are off.
pub fn prefix(level: Level) -> String {
    if !icons() {
        return String::new();
    }
    let icon = match level {
        Level::Ok => "✔",
        Level::Info => "ℹ",
        Level::Warn => "⚠",
        Level::Err => "✖",
    };
    if !color() {
        return format!("{icon} ");
    }
    match level {
        Level::Ok => format!("{} ", icon.green()),
        Level::Info => format!("{} ", icon.cyan()),
        Level::Warn => format!("{} ", icon.yellow()),
        Level::Err => format!("{} ", icon.red()),
    }
}

#[macro_export]
macro_rules! ui_ok {
    ($($arg:tt)*) => {{
        if !$crate::ui::quiet() {
            println!("{}{}", $crate::ui::prefix($crate::ui::Level::Ok), format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! ui_info {
    ($($arg:tt)*) => {{
        if !$crate::ui::quiet() {
            eprintln!("{}{}", $crate::ui::prefix($crate::ui::Level::Info), format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! ui_warn {
    ($($arg:tt)*) => {{
        eprintln!("{}{}", $crate::ui::prefix($crate::ui::Level::Warn), format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! ui_err {
    ($($arg:tt)*) => {{
        eprintln!("{}{}", $crate::ui::prefix($crate::ui::Level::Err), format_args!($($arg)*));
    }};
}
