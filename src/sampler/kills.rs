//! OOM-killer events recovered from the earlyoom service journal.

use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::command::run_with_timeout;
use super::model::KillEvent;

/// Default number of journal lines fetched per request
pub const KILL_LOG_LINES: usize = 50;

/// Default deadline for the journal fetch
pub const KILL_LOG_TIMEOUT: Duration = Duration::from_secs(2);

const KILL_LOG_UNIT: &str = "earlyoom";

/// Width of the syslog-style `Mmm dd HH:MM:SS` prefix
const TIMESTAMP_PREFIX_WIDTH: usize = 15;

static KILL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Kill process (\d+) \(([^)]+)\).*?: (.+)").expect("kill line pattern is valid")
});

/// Fetch and parse the most recent kill events, newest first.
///
/// A missing journal, a missing unit or a fetch timeout all yield an empty list.
pub async fn fetch_kill_events(lines: usize, timeout: Duration) -> Vec<KillEvent> {
    let count = lines.to_string();
    let args = ["-u", KILL_LOG_UNIT, "-n", count.as_str(), "--no-pager"];
    match run_with_timeout("journalctl", &args, timeout).await {
        Ok(out) => parse_kill_events(&out, Local::now().year()),
        Err(e) => {
            log::debug!("kill log unavailable: {}", e);
            Vec::new()
        }
    }
}

/// Parse every `Kill process <pid> (<comm>) ...: <reason>` line in `log`.
///
/// Timestamps are read from the fixed-width line prefix and given `year`;
/// a prefix that is not a date leaves the timestamp unset. The result is
/// sorted newest first with unset timestamps last.
pub fn parse_kill_events(log: &str, year: i32) -> Vec<KillEvent> {
    let mut events: Vec<KillEvent> = log
        .lines()
        .filter_map(|line| parse_kill_line(line, year))
        .collect();
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

pub fn parse_kill_line(line: &str, year: i32) -> Option<KillEvent> {
    let caps = KILL_LINE.captures(line)?;
    let pid = caps[1].parse().ok()?;

    Some(KillEvent {
        timestamp: parse_log_timestamp(line, year),
        pid,
        command: caps[2].to_string(),
        reason: caps[3].trim().to_string(),
    })
}

/// `Nov 23 19:12:39` (day may be space padded) at the start of `line`
pub fn parse_log_timestamp(line: &str, year: i32) -> Option<NaiveDateTime> {
    let prefix = line.get(..TIMESTAMP_PREFIX_WIDTH)?;
    let stamp = prefix.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&format!("{} {}", year, stamp), "%Y %b %d %H:%M:%S").ok()
}
