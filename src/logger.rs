//! Terminal diagnostics with colored module prefixes.
//!
//! Every stage reports through the `log!` macro, which writes one line to
//! standard output:
//!
//! ```ignore
//! log!("sitemap"; "wrote {} documents", count);
//! // [sitemap] wrote 3 documents
//! ```
//!
//! Single-line messages are truncated to the terminal width; multi-line
//! messages (error chains) are printed in full.

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Fallback width when the terminal size is unknown (pipes, CI).
const FALLBACK_WIDTH: u16 = 120;

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Total prefix length for a module name: `[`, `]` and the trailing space.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    let message = if message.contains('\n') {
        message
    } else {
        truncate_str(message, width.saturating_sub(calc_prefix_len(module.len())))
    };

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" | "gate" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" | "seo" => prefix.bright_magenta().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
