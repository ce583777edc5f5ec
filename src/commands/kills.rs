//! Kill-event listing command.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use crate::sampler::kills::{fetch_kill_events, KILL_LOG_LINES, KILL_LOG_TIMEOUT};
use crate::sampler::KillEvent;
use crate::ui::formatters::format_event_time;

/// Execute the kills command
pub async fn execute(matches: &ArgMatches) -> Result<()> {
    let lines = matches
        .get_one::<usize>("lines")
        .copied()
        .unwrap_or(KILL_LOG_LINES);
    let json_output = matches.get_flag("json");

    let events = fetch_kill_events(lines, KILL_LOG_TIMEOUT).await;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&events).context("Failed to encode kill events")?
        );
        return Ok(());
    }

    print_events(&events);
    Ok(())
}

fn print_events(events: &[KillEvent]) {
    if events.is_empty() {
        println!("{}", "No OOM kill events found.".dimmed());
        return;
    }

    println!(
        "{}",
        format!("{:<19}  {:>8}  {:<16}  REASON", "TIME", "PID", "COMMAND").bold()
    );
    for event in events {
        println!(
            "{:<19}  {:>8}  {:<16}  {}",
            format_event_time(event.timestamp.as_ref()),
            event.pid,
            event.command.red(),
            event.reason
        );
    }
}
