//! Battery, thermal-zone and inotify pseudo-files.
//!
//! All readers are best-effort: a missing or unreadable file yields an empty or
//! zero value.

use std::fs;
use std::path::{Path, PathBuf};

use super::model::{BatteryReading, InotifyLimits, ThermalReading};
use crate::utils::parse_number;

const BATTERY_PREFIX: &str = "BAT";
const THERMAL_ZONE_PREFIX: &str = "thermal_zone";

/// Pseudo-filesystem reader rooted at configurable `/sys` and `/proc` paths
#[derive(Debug, Clone)]
pub struct SysfsReader {
    sys_root: PathBuf,
    proc_root: PathBuf,
}

impl SysfsReader {
    pub fn new() -> Self {
        Self::with_roots("/sys", "/proc")
    }

    pub fn with_roots(sys_root: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            sys_root: sys_root.into(),
            proc_root: proc_root.into(),
        }
    }

    /// First `BAT*` supply with a readable capacity
    pub fn battery(&self) -> Option<BatteryReading> {
        let supplies = self.sys_root.join("class/power_supply");
        prefixed_entries(&supplies, BATTERY_PREFIX)
            .into_iter()
            .find_map(|(_, dir)| {
                let capacity = fs::read_to_string(dir.join("capacity")).ok()?;
                let state = fs::read_to_string(dir.join("status")).unwrap_or_default();
                Some(BatteryReading {
                    percent: parse_number(&capacity),
                    state: state.trim().to_string(),
                })
            })
    }

    /// Every thermal zone's temperature in °C, ordered by zone index
    pub fn thermal_zones(&self) -> Vec<ThermalReading> {
        let thermal = self.sys_root.join("class/thermal");
        prefixed_entries(&thermal, THERMAL_ZONE_PREFIX)
            .into_iter()
            .filter_map(|(zone, dir)| {
                let raw = fs::read_to_string(dir.join("temp")).ok()?;
                Some(ThermalReading {
                    zone,
                    celsius: parse_number(&raw) / 1000.0,
                })
            })
            .collect()
    }

    pub fn inotify(&self) -> InotifyLimits {
        let base = self.proc_root.join("sys/fs/inotify");
        InotifyLimits {
            max_user_watches: read_u64(&base.join("max_user_watches")),
            max_user_instances: read_u64(&base.join("max_user_instances")),
            nr_watches: read_u64(&base.join("nr_watches")),
        }
    }
}

impl Default for SysfsReader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u64(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Entries of `dir` whose name starts with `prefix`, sorted by the numeric
/// suffix (then by name) so `zone2` comes before `zone10`
fn prefixed_entries(dir: &Path, prefix: &str) -> Vec<(String, PathBuf)> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut entries: Vec<(String, PathBuf)> = read_dir
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with(prefix).then(|| (name, e.path()))
        })
        .collect();

    entries.sort_by_key(|(name, _)| {
        let index = name[prefix.len()..].parse::<u64>().unwrap_or(u64::MAX);
        (index, name.clone())
    });
    entries
}
