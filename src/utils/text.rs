//! Text helpers for values read from pseudo-files and external tools.

/// Maximum stored command-line length, ellipsis included
pub const COMMAND_DISPLAY_WIDTH: usize = 60;

const ELLIPSIS: char = '…';

/// Cap `cmd` at `max` characters, replacing the tail with `…` when cut
pub fn truncate_command(cmd: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if cmd.chars().count() <= max {
        return cmd.to_string();
    }
    let mut out: String = cmd.chars().take(max - 1).collect();
    out.push(ELLIPSIS);
    out
}

/// Lenient float parse: surrounding whitespace and a trailing `%` are ignored,
/// anything unreadable becomes 0
pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix('%')
        .unwrap_or(trimmed)
        .trim()
        .parse()
        .unwrap_or(0.0)
}
