//! Colored status messages for command output.
//!
//! These helpers print user-facing status lines, distinct from the `tracing`
//! diagnostics used inside the library: queue reports, updatedb sections,
//! and error banners all go through this module so colors stay consistent.

use colored::Colorize;

/// What: Print a success message in green to stdout.
pub fn ok(msg: &str) {
    println!("{}", msg.green());
}

/// What: Print a labeled success line (green label, plain message).
///
/// Inputs:
/// - `label`: Short tag such as `[U]` or `[ U]`.
/// - `msg`: Remainder of the line, already formatted.
pub fn ok_label(label: &str, msg: &str) {
    println!("{}{msg}", label.green());
}

/// What: Print an informational message in yellow to stdout.
pub fn info(msg: &str) {
    println!("{}", msg.yellow());
}

/// What: Print a labeled informational line (yellow label, plain message).
pub fn info_label(label: &str, msg: &str) {
    println!("{}{msg}", label.yellow());
}

/// What: Print a warning in magenta to stderr.
pub fn warn(msg: &str) {
    eprintln!("{}", msg.magenta());
}

/// What: Print an error in red to stderr.
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// What: Print a labeled error line (red label, plain message) to stderr.
pub fn error_label(label: &str, msg: &str) {
    eprintln!("{}{msg}", label.red());
}

/// What: Print a labeled warning line (magenta label, plain message).
pub fn warn_label(label: &str, msg: &str) {
    println!("{}{msg}", label.magenta());
}
