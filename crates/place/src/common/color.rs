//! Terminal color helpers.

use std::io::IsTerminal;
use std::sync::OnceLock;

static NO_COLOR: OnceLock<bool> = OnceLock::new();

/// `no_color_flag` already reflects `NO_COLOR`; clap reads it into `--no-color`.
pub fn init(no_color_flag: bool) {
    let _ = NO_COLOR.set(no_color_flag || !std::io::stdout().is_terminal());
}

pub fn is_disabled() -> bool {
    *NO_COLOR.get().unwrap_or(&false)
}

mod codes {
    pub const RESET: &str = "\x1b[0m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const DIM: &str = "\x1b[90m";
    pub const BOLD: &str = "\x1b[1m";
}

pub struct Colors;

fn wrap_with_ansi(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + text.len() + codes::RESET.len());
    out.push_str(prefix);
    out.push_str(text);
    out.push_str(codes::RESET);
    out
}

fn paint(text: &str, prefix: &str) -> String {
    if is_disabled() {
        text.to_string()
    } else {
        wrap_with_ansi(text, prefix)
    }
}

impl Colors {
    pub fn success(text: &str) -> String {
        paint(text, codes::GREEN)
    }

    pub fn error(text: &str) -> String {
        paint(text, codes::RED)
    }

    pub fn warning(text: &str) -> String {
        paint(text, codes::YELLOW)
    }

    pub fn dim(text: &str) -> String {
        paint(text, codes::DIM)
    }

    pub fn bold(text: &str) -> String {
        paint(text, codes::BOLD)
    }
}
