use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete point-in-time snapshot produced once per tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub interval: Duration,
    pub cpu: CpuSummary,
    pub memory: MemorySummary,
    pub io: IoRates,
    pub gpus: Vec<GpuReading>,
    pub battery: Option<BatteryReading>,
    pub top: Vec<ProcessEntry>,
    pub throttled: Vec<ProcessEntry>,
    pub cgroups: Vec<CgroupAggregate>,
    pub inotify: InotifyLimits,
    pub temps: Vec<ThermalReading>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSummary {
    /// Aggregate utilization, 0-100
    pub total: f64,
    /// Utilization per core, ordered by core index
    pub per_core: Vec<f64>,
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySummary {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_total_bytes: u64,
}

impl MemorySummary {
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Disk throughput in MiB/s and network throughput in Mbit/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IoRates {
    pub disk_read_mbs: f64,
    pub disk_write_mbs: f64,
    pub net_rx_mbps: f64,
    pub net_tx_mbps: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuReading {
    pub name: String,
    pub utilization_percent: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    pub temperature_celsius: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    pub percent: f64,
    /// Charge state as reported by the kernel (Charging, Discharging, Full, ...)
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub nice: i32,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// Display-safe command line, capped in length
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CgroupAggregate {
    pub name: String,
    pub cpu_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InotifyLimits {
    pub max_user_watches: u64,
    pub max_user_instances: u64,
    pub nr_watches: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalReading {
    pub zone: String,
    pub celsius: f64,
}

/// One OOM-killer action recovered from the service log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEvent {
    /// `None` when the log prefix could not be read as a date
    pub timestamp: Option<NaiveDateTime>,
    pub pid: u32,
    pub command: String,
    pub reason: String,
}
