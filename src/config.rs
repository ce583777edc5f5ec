use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SysmoniError};
use crate::sampler::SamplerConfig;

pub const ENV_INTERVAL: &str = "SRPS_SYSMON_INTERVAL";
pub const ENV_GPU: &str = "SRPS_SYSMON_GPU";
pub const ENV_BATTERY: &str = "SRPS_SYSMON_BATT";

/// Column the consumer orders processes by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Cpu,
    Mem,
}

/// Runtime options for sysmoni
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub interval: Duration,
    pub sort: SortKey,
    /// Regex over process commands, applied by the display only
    #[serde(default)]
    pub filter: Option<String>,
    pub json: bool,
    pub json_stream: bool,
    pub enable_gpu: bool,
    pub enable_battery: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            sort: SortKey::Cpu,
            filter: None,
            json: false,
            json_stream: false,
            enable_gpu: true,
            enable_battery: true,
        }
    }
}

impl Config {
    /// Apply `SRPS_SYSMON_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// An interval that does not parse is ignored and the current value kept.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_INTERVAL).filter(|v| !v.is_empty()) {
            match parse_duration(&raw) {
                Ok(interval) => self.interval = interval,
                Err(e) => log::warn!("ignoring {}={:?}: {}", ENV_INTERVAL, raw, e),
            }
        }
        if lookup(ENV_GPU).as_deref() == Some("0") {
            self.enable_gpu = false;
        }
        if lookup(ENV_BATTERY).as_deref() == Some("0") {
            self.enable_battery = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(SysmoniError::config("interval must be greater than zero"));
        }
        if let Some(filter) = &self.filter {
            regex::Regex::new(filter)
                .map_err(|e| SysmoniError::config(format!("invalid filter {:?}: {}", filter, e)))?;
        }
        Ok(())
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            interval: self.interval,
            enable_gpu: self.enable_gpu,
            enable_battery: self.enable_battery,
            ..SamplerConfig::default()
        }
    }
}

/// Parse `250ms`, `1.5s`, `2m`, `1h`, or a bare number of seconds
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| SysmoniError::parse(format!("invalid duration: {:?}", raw)))?;
    let secs = match unit.trim() {
        "" | "s" => value,
        "ms" => value / 1000.0,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => {
            return Err(SysmoniError::parse(format!(
                "unknown duration unit {:?} in {:?}",
                other, raw
            )))
        }
    };

    Duration::try_from_secs_f64(secs)
        .map_err(|e| SysmoniError::parse(format!("invalid duration {:?}: {}", raw, e)))
}
