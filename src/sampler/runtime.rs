//! Sampling loop: drives the assembler on a fixed interval and runs the GPU
//! poller alongside it until a shared shutdown signal fires.

use chrono::{DateTime, Local};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::assembler::{Sampler, SamplerConfig};
use super::gpu::{gpu_poll_task, GpuProvider, NvidiaSmiProvider};
use super::host::{HostSource, ProcHost};
use super::model::Sample;
use crate::error::{Result, SysmoniError};

/// Lifecycle of a [`SamplingLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Owns the sampling and GPU polling tasks.
///
/// Samples are delivered over a channel holding at most one pending sample;
/// a slow consumer therefore slows sampling down instead of queueing.
pub struct SamplingLoop<H = ProcHost, P = NvidiaSmiProvider> {
    state: LoopState,
    sampler: Option<Sampler<H>>,
    gpu_provider: Option<P>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl SamplingLoop<ProcHost, NvidiaSmiProvider> {
    /// Loop over the live host, polling `nvidia-smi` when GPU sampling is on
    pub fn new(config: SamplerConfig) -> Self {
        let gpu_provider = NvidiaSmiProvider::new(config.gpu_timeout);
        Self::with_parts(Sampler::new(config), Some(gpu_provider))
    }
}

impl<H, P> SamplingLoop<H, P>
where
    H: HostSource + 'static,
    P: GpuProvider,
{
    pub fn with_parts(sampler: Sampler<H>, gpu_provider: Option<P>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            state: LoopState::Idle,
            sampler: Some(sampler),
            gpu_provider,
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Sender that cancels both tasks when signalled
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Spawn the tasks and return the sample stream.
    ///
    /// Must be called from within a Tokio runtime. The stream ends when the
    /// loop stops. A zero sampling or GPU period is rejected and the loop
    /// stays idle.
    pub fn start(&mut self) -> Result<mpsc::Receiver<Sample>> {
        if self.state != LoopState::Idle {
            return Err(SysmoniError::config(format!(
                "sampling loop cannot start from {:?}",
                self.state
            )));
        }
        if let Some(sampler) = &self.sampler {
            sampler.config().validate()?;
        }
        let sampler = self
            .sampler
            .take()
            .ok_or_else(|| SysmoniError::config("sampler already consumed"))?;

        let (sample_tx, sample_rx) = mpsc::channel(1);
        let config = sampler.config().clone();

        if config.enable_gpu {
            if let Some(provider) = self.gpu_provider.take() {
                self.handles.push(tokio::spawn(gpu_poll_task(
                    provider,
                    sampler.gpu_slot(),
                    config.gpu_interval,
                    self.shutdown_tx.subscribe(),
                )));
            }
        }

        self.handles.push(tokio::spawn(sampling_task(
            sampler,
            sample_tx,
            self.shutdown_tx.clone(),
            self.shutdown_tx.subscribe(),
        )));

        log::info!("sampling loop started (interval {:?})", config.interval);
        self.state = LoopState::Running;
        Ok(sample_rx)
    }

    /// Signal shutdown and wait for both tasks to finish
    pub async fn stop(&mut self) {
        if self.state == LoopState::Running {
            let _ = self.shutdown_tx.send(());
            for handle in self.handles.drain(..) {
                if let Err(e) = handle.await {
                    log::warn!("sampling task ended abnormally: {}", e);
                }
            }
            log::info!("sampling loop stopped");
        }
        self.state = LoopState::Stopped;
    }
}

/// One sample per elapsed interval, first one a full interval after start.
///
/// Stops on shutdown or when the consumer drops its receiver; in the latter
/// case it raises shutdown itself so the GPU poller stops too.
async fn sampling_task<H: HostSource>(
    mut sampler: Sampler<H>,
    sample_tx: mpsc::Sender<Sample>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = sampler.config().interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last: Option<DateTime<Local>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = monotonic_now(last, Local::now());
                last = Some(now);
                let sample = sampler.sample(now);

                tokio::select! {
                    sent = sample_tx.send(sample) => {
                        if sent.is_err() {
                            log::info!("sample consumer went away, stopping");
                            let _ = shutdown_tx.send(());
                            break;
                        }
                    }
                    _ = shutdown.recv() => {
                        break;
                    }
                }
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }
}

/// Never let a wall-clock step backwards reorder sample timestamps
fn monotonic_now(last: Option<DateTime<Local>>, now: DateTime<Local>) -> DateTime<Local> {
    match last {
        Some(prev) if now < prev => prev,
        _ => now,
    }
}
