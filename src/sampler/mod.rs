//! Host resource sampling engine.
//!
//! Turns cumulative OS counters, the process table, slow GPU queries and a few
//! pseudo-files into a stream of immutable [`Sample`]s.

mod assembler;
pub mod cgroup;
mod command;
pub mod gpu;
pub mod history;
pub mod host;
pub mod kills;
mod model;
mod runtime;
pub mod sysfs;

pub use assembler::{
    top_by_cpu, Sampler, SamplerConfig, CGROUP_LIMIT, THROTTLED_PROCESS_LIMIT, TOP_PROCESS_LIMIT,
};
pub use cgroup::{CgroupCache, CGROUP_CACHE_TTL_TICKS};
pub use command::run_with_timeout;
pub use gpu::{GpuProvider, GpuSlot, NvidiaSmiProvider};
pub use history::{CoreTimes, CounterHistory, CpuTimes, DiskCounters, NetCounters};
pub use host::{CpuTimesSnapshot, HostSource, ProcHost, RawProcess};
pub use kills::{fetch_kill_events, parse_kill_events};
pub use model::{
    BatteryReading, CgroupAggregate, CpuSummary, GpuReading, InotifyLimits, IoRates, KillEvent,
    MemorySummary, ProcessEntry, Sample, ThermalReading,
};
pub use runtime::{LoopState, SamplingLoop};
pub use sysfs::SysfsReader;
