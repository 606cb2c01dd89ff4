//! Shared helpers for stderr reporting with colored severity prefixes.
//!
//! Honors the `NO_COLOR` convention. All build progress and warnings go to
//! stderr so stdout stays clean for the rendered report.

use owo_colors::OwoColorize;

pub fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors() {
        "✖ error:".red().bold().to_string()
    } else {
        "✖ error:".to_string()
    }
}

pub fn warn_prefix() -> String {
    if use_colors() {
        "▲ warning:".yellow().bold().to_string()
    } else {
        "▲ warning:".to_string()
    }
}

pub fn info_prefix() -> String {
    if use_colors() {
        "◆ info:".blue().bold().to_string()
    } else {
        "◆ info:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors() {
        "● note:".bright_black().to_string()
    } else {
        "● note:".to_string()
    }
}

/// Print a progress line to stderr.
pub fn report_info(msg: &str) {
    eprintln!("{} {}", info_prefix(), msg);
}

/// Print a warning to stderr, tagged with the location it concerns
/// (a block title or file path).
pub fn report_warning(msg: &str, location: &str) {
    if location.is_empty() {
        eprintln!("{} {}", warn_prefix(), msg);
    } else {
        eprintln!("{} {} ❲{}❳", warn_prefix(), msg, location);
    }
}
