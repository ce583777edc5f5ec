//! Raw host reads: cumulative CPU time, memory, load, disk and network
//! counters and the process table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use procfs::{CpuTime, FromReadSI, KernelStats};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, ThreadKind, UpdateKind};

use super::history::{CoreTimes, CpuTimes, DiskCounters, NetCounters};
use super::model::MemorySummary;
use crate::error::Result;

/// Bytes per sector as reported by /proc/diskstats, regardless of hardware
const DISKSTAT_SECTOR_SIZE: u64 = 512;

const PROC_STAT: &str = "/proc/stat";

/// Aggregate and per-core cumulative CPU time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuTimesSnapshot {
    pub aggregate: CpuTimes,
    /// Online cores in /proc/stat order
    pub per_core: Vec<CoreTimes>,
}

/// One live process as enumerated this tick, before ranking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProcess {
    pub pid: u32,
    pub name: String,
    /// Space-joined argv, empty for kernel threads
    pub cmdline: String,
    pub nice: i32,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// Source of the per-tick OS readings.
///
/// `refresh` is called once at the start of every tick; the other methods are
/// then called at most once each, in order, within that tick.
pub trait HostSource: Send {
    fn refresh(&mut self) {}

    fn cpu_times(&mut self) -> Result<CpuTimesSnapshot>;

    fn memory(&mut self) -> Result<MemorySummary>;

    /// 1, 5 and 15 minute load averages
    fn load_average(&mut self) -> Result<(f64, f64, f64)>;

    fn disk_counters(&mut self) -> Result<HashMap<String, DiskCounters>>;

    fn net_counters(&mut self) -> Result<HashMap<String, NetCounters>>;

    /// Processes that could be read this tick; unreadable ones are left out
    fn processes(&mut self) -> Vec<RawProcess>;
}

/// Linux host source backed by procfs and sysinfo
pub struct ProcHost {
    system: System,
}

impl ProcHost {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for ProcHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSource for ProcHost {
    fn refresh(&mut self) {
        self.system.refresh_memory();
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );
    }

    fn cpu_times(&mut self) -> Result<CpuTimesSnapshot> {
        read_cpu_times(Path::new(PROC_STAT))
    }

    fn memory(&mut self) -> Result<MemorySummary> {
        Ok(MemorySummary {
            used_bytes: self.system.used_memory(),
            total_bytes: self.system.total_memory(),
            swap_used_bytes: self.system.used_swap(),
            swap_total_bytes: self.system.total_swap(),
        })
    }

    fn load_average(&mut self) -> Result<(f64, f64, f64)> {
        let load = System::load_average();
        Ok((load.one, load.five, load.fifteen))
    }

    fn disk_counters(&mut self) -> Result<HashMap<String, DiskCounters>> {
        Ok(procfs::diskstats()?
            .into_iter()
            .map(|d| {
                let counters = DiskCounters {
                    read_bytes: d.sectors_read as u64 * DISKSTAT_SECTOR_SIZE,
                    write_bytes: d.sectors_written as u64 * DISKSTAT_SECTOR_SIZE,
                };
                (d.name, counters)
            })
            .collect())
    }

    fn net_counters(&mut self) -> Result<HashMap<String, NetCounters>> {
        Ok(procfs::net::dev_status()?
            .into_iter()
            .map(|(name, dev)| {
                let counters = NetCounters {
                    rx_bytes: dev.recv_bytes,
                    tx_bytes: dev.sent_bytes,
                };
                (name, counters)
            })
            .collect())
    }

    fn processes(&mut self) -> Vec<RawProcess> {
        let total_memory = self.system.total_memory();

        self.system
            .processes()
            .values()
            // Userland tasks are threads of a listed process
            .filter(|proc| proc.thread_kind() != Some(ThreadKind::Userland))
            .filter_map(|proc| {
                let pid = proc.pid().as_u32();
                let nice = match read_nice(pid) {
                    Ok(nice) => nice,
                    Err(e) => {
                        log::trace!("skipping pid {}: {}", pid, e);
                        return None;
                    }
                };
                let cmdline = proc
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ");

                Some(RawProcess {
                    pid,
                    name: proc.name().to_string_lossy().to_string(),
                    cmdline,
                    nice,
                    cpu_percent: proc.cpu_usage() as f64,
                    memory_percent: if total_memory > 0 {
                        proc.memory() as f64 / total_memory as f64 * 100.0
                    } else {
                        0.0
                    },
                })
            })
            .collect()
    }
}

/// Read and parse a /proc/stat style file
pub fn read_cpu_times(path: &Path) -> Result<CpuTimesSnapshot> {
    let content = fs::read_to_string(path)?;
    parse_cpu_times(&content)
}

/// Parse a /proc/stat dump into aggregate and per-core times.
///
/// `KernelStats` keeps `cpuN` lines in file order without their index, so the
/// indexes are taken from the same text to stay aligned with an offline core gap.
pub fn parse_cpu_times(content: &str) -> Result<CpuTimesSnapshot> {
    let stats = KernelStats::from_read(content.as_bytes(), procfs::current_system_info())?;
    let per_core = core_ids(content)
        .into_iter()
        .zip(stats.cpu_time.iter())
        .map(|(id, t)| CoreTimes {
            id,
            times: cpu_times_from(t),
        })
        .collect();

    Ok(CpuTimesSnapshot {
        aggregate: cpu_times_from(&stats.total),
        per_core,
    })
}

/// Kernel indexes of the `cpuN` lines, in file order
fn core_ids(content: &str) -> Vec<usize> {
    content
        .lines()
        .filter_map(|line| {
            let label = line.split_whitespace().next()?;
            label.strip_prefix("cpu")?.parse().ok()
        })
        .collect()
}

fn read_nice(pid: u32) -> Result<i32> {
    let stat = procfs::process::Process::new(pid as i32)?.stat()?;
    Ok(stat.nice as i32)
}

/// Busy + idle buckets, guest time excluded since user time already carries it
fn cpu_times_from(t: &CpuTime) -> CpuTimes {
    let iowait = t.iowait.unwrap_or(0);
    let total = t.user
        + t.nice
        + t.system
        + t.idle
        + iowait
        + t.irq.unwrap_or(0)
        + t.softirq.unwrap_or(0)
        + t.steal.unwrap_or(0);

    CpuTimes {
        total: total as f64,
        idle: (t.idle + iowait) as f64,
    }
}
