//! Monitor command handler.
//!
//! Consumes the sample stream and presents it as a live view, a single JSON
//! record, or NDJSON.

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::sampler::{Sample, SamplingLoop};
use crate::ui::{draw, ProcessView};

/// How samples are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Redraw a text view each tick
    Live,
    /// One JSON record, then exit
    Json,
    /// One JSON record per line until interrupted
    JsonStream,
}

impl OutputMode {
    /// Pick the mode from flags; piped output defaults to a single record
    pub fn select(config: &Config, stdout_is_terminal: bool) -> Self {
        if config.json_stream {
            OutputMode::JsonStream
        } else if config.json || !stdout_is_terminal {
            OutputMode::Json
        } else {
            OutputMode::Live
        }
    }
}

/// Execute the monitor command
pub async fn execute(config: Config) -> Result<()> {
    let view = ProcessView::new(config.filter.as_deref(), config.sort)
        .context("Invalid process filter")?;
    let mode = OutputMode::select(&config, io::stdout().is_terminal());

    let mut sampling = SamplingLoop::new(config.sampler_config());
    let shutdown = sampling.shutdown_handle();
    ctrlc::set_handler(move || {
        let _ = shutdown.send(());
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let mut samples = sampling.start().context("Failed to start sampling")?;

    while let Some(sample) = samples.recv().await {
        match mode {
            OutputMode::Live => draw(&sample, &view).context("Failed to draw sample")?,
            OutputMode::Json => {
                write_record(&sample)?;
                break;
            }
            OutputMode::JsonStream => {
                if !write_record(&sample)? {
                    break;
                }
            }
        }
    }

    sampling.stop().await;
    Ok(())
}

/// Write one NDJSON line; `false` once the reader has closed the pipe
fn write_record(sample: &Sample) -> Result<bool> {
    let line = serde_json::to_string(sample).context("Failed to encode sample")?;
    let mut stdout = io::stdout().lock();
    match writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(e) => Err(e).context("Failed to write sample"),
    }
}
