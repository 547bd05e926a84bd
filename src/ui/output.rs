//! Status lines for the CLI
//!
//! Decorative lines go through these helpers so `CARPOOL_QUIET=1` can silence
//! them. Errors are always printed.

use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("CARPOOL_QUIET")
            .map(|v| quiet_value(&v))
            .unwrap_or(false)
    })
}

fn quiet_value(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CAR, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    if is_quiet() {
        return;
    }
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value.style(theme().value.clone())
    );
}

/// Printed when a query matches nothing
pub fn empty(what: &str) {
    if is_quiet() {
        return;
    }
    println!("{} No {} found.", Icons::EMPTY, what);
}

pub fn summary_row(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("  {} {}", label.style(theme().dim.clone()), value.style(theme().value.clone()));
}
