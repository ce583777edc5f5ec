//! GPU readings: provider abstraction, the shared latest-reading slot and the
//! slow poller that keeps it fresh on its own cadence.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use super::command::run_with_timeout;
use super::model::GpuReading;
use crate::error::Result;
use crate::utils::parse_number;

/// Default cadence of the GPU poller
pub const GPU_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default deadline for a single GPU query
pub const GPU_QUERY_TIMEOUT: Duration = Duration::from_millis(400);

const NVIDIA_SMI: &str = "nvidia-smi";
const NVIDIA_SMI_ARGS: [&str; 2] = [
    "--query-gpu=name,utilization.gpu,memory.used,memory.total,temperature.gpu",
    "--format=csv,noheader,nounits",
];

/// Trait for GPU readings providers
///
/// A query must finish (or fail) within a bounded time; the poller never
/// waits on anything else.
pub trait GpuProvider: Send + 'static {
    /// Short human-readable name used in log lines
    fn name(&self) -> &'static str;

    /// Query every visible device
    fn query(&mut self) -> impl Future<Output = Result<Vec<GpuReading>>> + Send;
}

/// Queries NVIDIA devices through `nvidia-smi` CSV output
#[derive(Debug, Clone)]
pub struct NvidiaSmiProvider {
    timeout: Duration,
}

impl NvidiaSmiProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for NvidiaSmiProvider {
    fn default() -> Self {
        Self::new(GPU_QUERY_TIMEOUT)
    }
}

impl GpuProvider for NvidiaSmiProvider {
    fn name(&self) -> &'static str {
        NVIDIA_SMI
    }

    async fn query(&mut self) -> Result<Vec<GpuReading>> {
        let out = run_with_timeout(NVIDIA_SMI, &NVIDIA_SMI_ARGS, self.timeout).await?;
        Ok(parse_gpu_csv(&out))
    }
}

/// Parse `name, util, mem used, mem total, temp` rows; short rows are skipped
pub fn parse_gpu_csv(out: &str) -> Vec<GpuReading> {
    out.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < 5 {
                return None;
            }
            Some(GpuReading {
                name: parts[0].trim().to_string(),
                utilization_percent: parse_number(parts[1]),
                memory_used_mb: parse_number(parts[2]),
                memory_total_mb: parse_number(parts[3]),
                temperature_celsius: parse_number(parts[4]),
            })
        })
        .collect()
}

/// Single-slot cell holding the most recently completed GPU query.
///
/// Writers replace the whole reading under the write lock, so readers never
/// observe a partial update. Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct GpuSlot {
    inner: Arc<RwLock<Vec<GpuReading>>>,
}

impl GpuSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, readings: Vec<GpuReading>) {
        *self.inner.write() = readings;
    }

    pub fn latest(&self) -> Vec<GpuReading> {
        self.inner.read().clone()
    }
}

/// Task that polls GPU metrics into `slot`.
///
/// Fires immediately, then every `period`. A failed or timed-out query keeps
/// the previously published reading; before the first success the slot stays
/// empty.
pub async fn gpu_poll_task<P: GpuProvider>(
    mut provider: P,
    slot: GpuSlot,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!("GPU poller started ({}, every {:?})", provider.name(), period);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut consecutive_failures = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match provider.query().await {
                    Ok(readings) => {
                        if consecutive_failures > 0 {
                            log::info!("GPU query recovered after {} failures", consecutive_failures);
                        }
                        consecutive_failures = 0;
                        slot.publish(readings);
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        if consecutive_failures == 1 {
                            log::warn!("GPU query via {} failed: {}", provider.name(), e);
                        } else {
                            log::debug!("GPU query failed (attempt {}): {}", consecutive_failures, e);
                        }
                    }
                }
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }

    log::info!("GPU poller stopped");
}
