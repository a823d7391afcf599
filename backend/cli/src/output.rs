//! Terminal output helpers: ANSI colouring that respects `NO_COLOR`.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Wrap `text` in `style` when the terminal supports it.
pub fn paint(style: &str, text: impl AsRef<str>) -> String {
    if supports_color() {
        format!("{style}{}{RESET}", text.as_ref())
    } else {
        text.as_ref().to_string()
    }
}
