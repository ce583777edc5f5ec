//! Previous-tick cumulative counters and the rates derived from them.
//!
//! Every `observe_*` call computes a rate against the stored baseline and then
//! replaces the baseline with the current reading. A key seen for the first
//! time establishes its baseline and contributes a rate of zero.

use std::collections::HashMap;
use std::time::Duration;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const BITS_PER_MEGABIT: f64 = 1e6;

/// Block devices whose name starts with this prefix never count toward disk rates
pub const LOOPBACK_DEVICE_PREFIX: &str = "loop";

/// Cumulative CPU time for one CPU (or the aggregate), in clock ticks
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTimes {
    pub total: f64,
    /// idle + iowait
    pub idle: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Cumulative CPU time of the core with kernel index `id` (`cpuN` in /proc/stat)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoreTimes {
    pub id: usize,
    pub times: CpuTimes,
}

/// Counter history owned by the snapshot assembler
#[derive(Debug, Default)]
pub struct CounterHistory {
    cpu: Option<CpuTimes>,
    cores: HashMap<usize, CpuTimes>,
    disks: HashMap<String, DiskCounters>,
    nets: HashMap<String, NetCounters>,
}

impl CounterHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate and per-core utilization since the previous observation.
    ///
    /// A missing aggregate reading leaves the aggregate baseline untouched and
    /// reports zero. Cores are matched by kernel index, so a core without a
    /// baseline under its own index reports zero even when others went offline.
    pub fn observe_cpu(&mut self, aggregate: Option<CpuTimes>, cores: &[CoreTimes]) -> (f64, Vec<f64>) {
        let total = match aggregate {
            Some(current) => {
                let pct = self
                    .cpu
                    .map(|prev| utilization(prev, current))
                    .unwrap_or(0.0);
                self.cpu = Some(current);
                pct
            }
            None => 0.0,
        };

        let per_core = cores
            .iter()
            .map(|core| {
                self.cores
                    .get(&core.id)
                    .map(|&prev| utilization(prev, core.times))
                    .unwrap_or(0.0)
            })
            .collect();
        if !cores.is_empty() {
            self.cores = cores.iter().map(|core| (core.id, core.times)).collect();
        }

        (total, per_core)
    }

    /// Disk read/write throughput in MiB/s, loopback devices excluded
    pub fn observe_disks(
        &mut self,
        current: &HashMap<String, DiskCounters>,
        interval: Duration,
    ) -> (f64, f64) {
        let mut read_delta = 0u64;
        let mut write_delta = 0u64;
        let mut next = HashMap::with_capacity(current.len());

        for (name, &counters) in current {
            if name.starts_with(LOOPBACK_DEVICE_PREFIX) {
                continue;
            }
            if let Some(prev) = self.disks.get(name) {
                read_delta += counter_delta(prev.read_bytes, counters.read_bytes);
                write_delta += counter_delta(prev.write_bytes, counters.write_bytes);
            }
            next.insert(name.clone(), counters);
        }
        self.disks = next;

        (
            per_second(read_delta as f64 / BYTES_PER_MIB, interval),
            per_second(write_delta as f64 / BYTES_PER_MIB, interval),
        )
    }

    /// Network receive/transmit throughput in Mbit/s summed over interfaces
    pub fn observe_net(
        &mut self,
        current: &HashMap<String, NetCounters>,
        interval: Duration,
    ) -> (f64, f64) {
        let mut rx_delta = 0u64;
        let mut tx_delta = 0u64;

        for (name, counters) in current {
            if let Some(prev) = self.nets.get(name) {
                rx_delta += counter_delta(prev.rx_bytes, counters.rx_bytes);
                tx_delta += counter_delta(prev.tx_bytes, counters.tx_bytes);
            }
        }
        self.nets = current.clone();

        (
            per_second(rx_delta as f64 * 8.0 / BITS_PER_MEGABIT, interval),
            per_second(tx_delta as f64 * 8.0 / BITS_PER_MEGABIT, interval),
        )
    }
}

/// `100 * (1 - Δidle/Δtotal)`, zero when the total did not advance
pub fn utilization(prev: CpuTimes, current: CpuTimes) -> f64 {
    let dt = current.total - prev.total;
    if dt <= 0.0 {
        return 0.0;
    }
    let di = current.idle - prev.idle;
    (100.0 * (1.0 - di / dt)).clamp(0.0, 100.0)
}

/// Growth of a cumulative counter; a counter that went backwards contributes nothing
pub fn counter_delta(prev: u64, current: u64) -> u64 {
    current.saturating_sub(prev)
}

fn per_second(amount: f64, interval: Duration) -> f64 {
    let secs = interval.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    amount / secs
}
