//! Per-tick snapshot assembly.
//!
//! The assembler owns the counter history and the cgroup cache and reads the
//! GPU slot published by the poller. It never fails: every source that cannot
//! be read contributes a zero or empty value for that tick only.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};

use super::cgroup::CgroupCache;
use super::gpu::{GpuSlot, GPU_POLL_INTERVAL, GPU_QUERY_TIMEOUT};
use super::history::CounterHistory;
use super::host::{HostSource, ProcHost, RawProcess};
use super::model::*;
use super::sysfs::SysfsReader;
use crate::error::{Result, SysmoniError};
use crate::utils::{truncate_command, COMMAND_DISPLAY_WIDTH};

pub const TOP_PROCESS_LIMIT: usize = 64;
pub const THROTTLED_PROCESS_LIMIT: usize = 32;
pub const CGROUP_LIMIT: usize = 16;

/// Engine settings
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub interval: Duration,
    pub enable_gpu: bool,
    pub enable_battery: bool,
    pub gpu_interval: Duration,
    pub gpu_timeout: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            enable_gpu: true,
            enable_battery: true,
            gpu_interval: GPU_POLL_INTERVAL,
            gpu_timeout: GPU_QUERY_TIMEOUT,
        }
    }
}

impl SamplerConfig {
    /// Both periods drive tokio intervals and must be non-zero
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(SysmoniError::config("sampling interval must be greater than zero"));
        }
        if self.enable_gpu && self.gpu_interval.is_zero() {
            return Err(SysmoniError::config("GPU poll interval must be greater than zero"));
        }
        Ok(())
    }
}

/// Builds one [`Sample`] per tick
pub struct Sampler<H = ProcHost> {
    config: SamplerConfig,
    host: H,
    history: CounterHistory,
    cgroups: CgroupCache,
    sysfs: SysfsReader,
    gpu: GpuSlot,
}

impl Sampler<ProcHost> {
    /// Sampler reading the live host
    pub fn new(config: SamplerConfig) -> Self {
        Self::with_sources(config, ProcHost::new(), CgroupCache::new(), SysfsReader::new())
    }
}

impl<H: HostSource> Sampler<H> {
    pub fn with_sources(
        config: SamplerConfig,
        host: H,
        cgroups: CgroupCache,
        sysfs: SysfsReader,
    ) -> Self {
        Self {
            config,
            host,
            history: CounterHistory::new(),
            cgroups,
            sysfs,
            gpu: GpuSlot::new(),
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Slot the GPU poller publishes into
    pub fn gpu_slot(&self) -> GpuSlot {
        self.gpu.clone()
    }

    /// Capture one snapshot, updating counter history and the cgroup cache
    pub fn sample(&mut self, now: DateTime<Local>) -> Sample {
        let interval = self.config.interval;
        self.host.refresh();

        let cpu = self.cpu_summary();
        let memory = self.host.memory().unwrap_or_else(|e| {
            log::debug!("memory read failed: {}", e);
            MemorySummary::default()
        });
        let io = self.io_rates(interval);

        self.cgroups.tick();
        let processes = self.host.processes();
        let (top, throttled, cgroups) = self.rank_processes(processes);

        let gpus = if self.config.enable_gpu {
            self.gpu.latest()
        } else {
            Vec::new()
        };
        let battery = if self.config.enable_battery {
            self.sysfs.battery()
        } else {
            None
        };

        Sample {
            timestamp: now,
            interval,
            cpu,
            memory,
            io,
            gpus,
            battery,
            top,
            throttled,
            cgroups,
            inotify: self.sysfs.inotify(),
            temps: self.sysfs.thermal_zones(),
        }
    }

    fn cpu_summary(&mut self) -> CpuSummary {
        let (total, per_core) = match self.host.cpu_times() {
            Ok(times) => self
                .history
                .observe_cpu(Some(times.aggregate), &times.per_core),
            Err(e) => {
                log::debug!("cpu times read failed: {}", e);
                self.history.observe_cpu(None, &[])
            }
        };
        let (load1, load5, load15) = self.host.load_average().unwrap_or_else(|e| {
            log::debug!("load average read failed: {}", e);
            (0.0, 0.0, 0.0)
        });

        CpuSummary {
            total,
            per_core,
            load1,
            load5,
            load15,
        }
    }

    fn io_rates(&mut self, interval: Duration) -> IoRates {
        let mut io = IoRates::default();

        match self.host.disk_counters() {
            Ok(disks) => {
                (io.disk_read_mbs, io.disk_write_mbs) = self.history.observe_disks(&disks, interval);
            }
            Err(e) => log::debug!("disk counters read failed: {}", e),
        }

        match self.host.net_counters() {
            Ok(nets) => {
                (io.net_rx_mbps, io.net_tx_mbps) = self.history.observe_net(&nets, interval);
            }
            Err(e) => log::debug!("network counters read failed: {}", e),
        }

        io
    }

    fn rank_processes(
        &mut self,
        processes: Vec<RawProcess>,
    ) -> (Vec<ProcessEntry>, Vec<ProcessEntry>, Vec<CgroupAggregate>) {
        let mut cgroup_cpu: HashMap<String, f64> = HashMap::new();
        let mut top = Vec::with_capacity(processes.len());

        for proc in processes {
            if proc.name.is_empty() {
                continue;
            }
            if let Some(leaf) = self.cgroups.lookup(proc.pid) {
                *cgroup_cpu.entry(leaf).or_insert(0.0) += proc.cpu_percent;
            }
            let cmd = if proc.cmdline.is_empty() {
                &proc.name
            } else {
                &proc.cmdline
            };
            top.push(ProcessEntry {
                pid: proc.pid,
                nice: proc.nice,
                cpu_percent: proc.cpu_percent,
                memory_percent: proc.memory_percent,
                command: truncate_command(cmd, COMMAND_DISPLAY_WIDTH),
            });
        }

        let throttled = top_by_cpu(
            top.iter().filter(|p| p.nice > 0).cloned().collect(),
            THROTTLED_PROCESS_LIMIT,
        );
        let top = top_by_cpu(top, TOP_PROCESS_LIMIT);

        let mut cgroups: Vec<CgroupAggregate> = cgroup_cpu
            .into_iter()
            .map(|(name, cpu_percent)| CgroupAggregate { name, cpu_percent })
            .collect();
        cgroups.sort_by(|a, b| {
            b.cpu_percent
                .total_cmp(&a.cpu_percent)
                .then_with(|| a.name.cmp(&b.name))
        });
        cgroups.truncate(CGROUP_LIMIT);

        (top, throttled, cgroups)
    }
}

/// Sort descending by CPU% (pid breaks ties) and keep the first `limit`
pub fn top_by_cpu(mut entries: Vec<ProcessEntry>, limit: usize) -> Vec<ProcessEntry> {
    entries.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then_with(|| a.pid.cmp(&b.pid))
    });
    entries.truncate(limit);
    entries
}
