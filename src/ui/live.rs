//! Plain terminal view of the latest sample.

use std::io::{self, Write};

use colored::*;
use crossterm::{cursor, execute, terminal};
use regex::Regex;

use super::formatters::{format_clock, format_size, usage_bar};
use crate::config::SortKey;
use crate::sampler::{ProcessEntry, Sample};

const BAR_WIDTH: usize = 30;
const VISIBLE_PROCESSES: usize = 20;
const VISIBLE_CGROUPS: usize = 8;

/// Consumer-side process selection: regex filter plus sort column
#[derive(Debug, Clone, Default)]
pub struct ProcessView {
    pub filter: Option<Regex>,
    pub sort: SortKey,
}

impl ProcessView {
    pub fn new(filter: Option<&str>, sort: SortKey) -> Result<Self, regex::Error> {
        Ok(Self {
            filter: filter.map(Regex::new).transpose()?,
            sort,
        })
    }

    /// Entries of `processes` that pass the filter, in display order
    pub fn select<'a>(&self, processes: &'a [ProcessEntry]) -> Vec<&'a ProcessEntry> {
        let mut selected: Vec<&ProcessEntry> = processes
            .iter()
            .filter(|p| self.filter.as_ref().map_or(true, |re| re.is_match(&p.command)))
            .collect();
        if self.sort == SortKey::Mem {
            selected.sort_by(|a, b| b.memory_percent.total_cmp(&a.memory_percent));
        }
        selected
    }
}

/// Render one screen worth of text for `sample`
pub fn render(sample: &Sample, view: &ProcessView) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}  every {:?}\n\n",
        "sysmoni".bold().bright_cyan(),
        format_clock(&sample.timestamp).dimmed(),
        sample.interval
    ));

    let cpu = &sample.cpu;
    out.push_str(&format!(
        "{:<6} {} {:>5.1}%  load {:.2} {:.2} {:.2}\n",
        "CPU".bold(),
        usage_bar(cpu.total, BAR_WIDTH),
        cpu.total,
        cpu.load1,
        cpu.load5,
        cpu.load15
    ));
    for (i, core) in cpu.per_core.iter().enumerate() {
        out.push_str(&format!("  core{:<3} {:>5.1}%\n", i, core));
    }

    let mem = &sample.memory;
    out.push_str(&format!(
        "{:<6} {} {:>5.1}%  {} / {}  swap {} / {}\n",
        "MEM".bold(),
        usage_bar(mem.used_percent(), BAR_WIDTH),
        mem.used_percent(),
        format_size(mem.used_bytes),
        format_size(mem.total_bytes),
        format_size(mem.swap_used_bytes),
        format_size(mem.swap_total_bytes)
    ));

    let io = &sample.io;
    out.push_str(&format!(
        "{:<6} disk r {:.2} MiB/s w {:.2} MiB/s  net rx {:.2} Mb/s tx {:.2} Mb/s\n",
        "IO".bold(),
        io.disk_read_mbs,
        io.disk_write_mbs,
        io.net_rx_mbps,
        io.net_tx_mbps
    ));

    for gpu in &sample.gpus {
        out.push_str(&format!(
            "{:<6} {} {:>5.1}%  {:.0}/{:.0} MB  {:.0}°C\n",
            "GPU".bold(),
            gpu.name,
            gpu.utilization_percent,
            gpu.memory_used_mb,
            gpu.memory_total_mb,
            gpu.temperature_celsius
        ));
    }
    if let Some(battery) = &sample.battery {
        out.push_str(&format!(
            "{:<6} {:.0}% {}\n",
            "BATT".bold(),
            battery.percent,
            battery.state
        ));
    }
    if !sample.temps.is_empty() {
        let temps: Vec<String> = sample
            .temps
            .iter()
            .map(|t| format!("{} {:.1}°C", t.zone, t.celsius))
            .collect();
        out.push_str(&format!("{:<6} {}\n", "TEMP".bold(), temps.join("  ")));
    }
    let inotify = &sample.inotify;
    out.push_str(&format!(
        "{:<6} watches {} / {}  instances max {}\n",
        "INOTFY".bold(),
        inotify.nr_watches,
        inotify.max_user_watches,
        inotify.max_user_instances
    ));

    out.push_str(&format!(
        "\n{}\n",
        format!("{:>8} {:>4} {:>6} {:>6}  COMMAND", "PID", "NI", "CPU%", "MEM%").bold()
    ));
    for p in view.select(&sample.top).into_iter().take(VISIBLE_PROCESSES) {
        let line = format!(
            "{:>8} {:>4} {:>6.1} {:>6.1}  {}",
            p.pid, p.nice, p.cpu_percent, p.memory_percent, p.command
        );
        if p.nice > 0 {
            out.push_str(&format!("{}\n", line.yellow()));
        } else {
            out.push_str(&format!("{}\n", line));
        }
    }

    if !sample.cgroups.is_empty() {
        out.push_str(&format!("\n{}\n", "CGROUPS".bold()));
        for cg in sample.cgroups.iter().take(VISIBLE_CGROUPS) {
            out.push_str(&format!("  {:>6.1}%  {}\n", cg.cpu_percent, cg.name));
        }
    }

    out
}

/// Clear the terminal and draw `sample`
pub fn draw(sample: &Sample, view: &ProcessView) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(
        stdout,
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    )?;
    write!(stdout, "{}", render(sample, view))?;
    stdout.flush()
}
