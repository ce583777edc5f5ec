// Shared fakes for the sampling engine integration tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sysmoni::error::{Result, SysmoniError};
use sysmoni::sampler::{
    CoreTimes, CpuTimes, CpuTimesSnapshot, DiskCounters, GpuProvider, GpuReading, HostSource,
    MemorySummary, NetCounters, RawProcess,
};

/// Readings served for one tick
#[derive(Debug, Clone, Default)]
pub struct HostTick {
    pub cpu: Option<CpuTimesSnapshot>,
    pub disks: Option<HashMap<String, DiskCounters>>,
    pub nets: Option<HashMap<String, NetCounters>>,
    pub processes: Vec<RawProcess>,
}

impl HostTick {
    /// Tick `n` of a host whose CPU advances 1000 ticks, 900 of them idle,
    /// every interval
    pub fn linear(n: u64) -> Self {
        let cpu = CpuTimesSnapshot {
            aggregate: CpuTimes {
                total: (n * 1000) as f64,
                idle: (n * 900) as f64,
            },
            per_core: vec![CoreTimes {
                id: 0,
                times: CpuTimes {
                    total: (n * 500) as f64,
                    idle: (n * 250) as f64,
                },
            }],
        };
        Self {
            cpu: Some(cpu),
            disks: Some(HashMap::new()),
            nets: Some(HashMap::new()),
            processes: Vec::new(),
        }
    }
}

/// Host source replaying scripted ticks, then falling back to [`HostTick::linear`]
pub struct FakeHost {
    script: VecDeque<HostTick>,
    current: HostTick,
    pub refreshes: Arc<AtomicUsize>,
}

impl FakeHost {
    pub fn scripted(ticks: Vec<HostTick>) -> Self {
        Self {
            script: ticks.into(),
            current: HostTick::default(),
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn linear() -> Self {
        Self::scripted(Vec::new())
    }
}

impl HostSource for FakeHost {
    fn refresh(&mut self) {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        self.current = self
            .script
            .pop_front()
            .unwrap_or_else(|| HostTick::linear(n));
    }

    fn cpu_times(&mut self) -> Result<CpuTimesSnapshot> {
        self.current
            .cpu
            .clone()
            .ok_or_else(|| SysmoniError::parse("cpu unavailable"))
    }

    fn memory(&mut self) -> Result<MemorySummary> {
        Ok(MemorySummary {
            used_bytes: 4 << 30,
            total_bytes: 16 << 30,
            swap_used_bytes: 0,
            swap_total_bytes: 2 << 30,
        })
    }

    fn load_average(&mut self) -> Result<(f64, f64, f64)> {
        Ok((1.5, 1.0, 0.5))
    }

    fn disk_counters(&mut self) -> Result<HashMap<String, DiskCounters>> {
        self.current
            .disks
            .clone()
            .ok_or_else(|| SysmoniError::parse("diskstats unavailable"))
    }

    fn net_counters(&mut self) -> Result<HashMap<String, NetCounters>> {
        self.current
            .nets
            .clone()
            .ok_or_else(|| SysmoniError::parse("net dev unavailable"))
    }

    fn processes(&mut self) -> Vec<RawProcess> {
        self.current.processes.clone()
    }
}

/// GPU provider that always reports the same devices
pub struct StaticGpu(pub Vec<GpuReading>);

impl GpuProvider for StaticGpu {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn query(&mut self) -> Result<Vec<GpuReading>> {
        Ok(self.0.clone())
    }
}

pub fn process(pid: u32, name: &str, cpu: f64, nice: i32) -> RawProcess {
    RawProcess {
        pid,
        name: name.to_string(),
        cmdline: String::new(),
        nice,
        cpu_percent: cpu,
        memory_percent: 0.5,
    }
}
