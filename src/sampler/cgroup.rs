//! pid → cgroup leaf attribution with wholesale periodic invalidation.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Number of ticks after which every cached entry is dropped
pub const CGROUP_CACHE_TTL_TICKS: u32 = 60;

/// Caches the cgroup leaf name for each process id.
///
/// Entries are cleared all at once every [`CGROUP_CACHE_TTL_TICKS`] ticks so a
/// reused pid is never attributed to a dead process's cgroup for long.
/// Failed lookups are not cached.
#[derive(Debug)]
pub struct CgroupCache {
    proc_root: PathBuf,
    entries: HashMap<u32, String>,
    ticks: u32,
}

impl CgroupCache {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    /// Cache that reads `<proc_root>/<pid>/cgroup`
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            entries: HashMap::new(),
            ticks: 0,
        }
    }

    /// Advance one tick, clearing the cache when the lifetime bound is reached
    pub fn tick(&mut self) {
        self.ticks += 1;
        if self.ticks >= CGROUP_CACHE_TTL_TICKS {
            log::trace!("clearing cgroup cache ({} entries)", self.entries.len());
            self.entries.clear();
            self.ticks = 0;
        }
    }

    pub fn lookup(&mut self, pid: u32) -> Option<String> {
        if let Some(name) = self.entries.get(&pid) {
            return Some(name.clone());
        }

        let path = self.proc_root.join(pid.to_string()).join("cgroup");
        let content = fs::read_to_string(&path)
            .map_err(|e| log::trace!("cgroup read failed for {}: {}", pid, e))
            .ok()?;
        let leaf = parse_cgroup_leaf(&content)?;
        self.entries.insert(pid, leaf.clone());
        Some(leaf)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CgroupCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Last non-empty path segment of the first well-formed `id:controllers:path` record
pub fn parse_cgroup_leaf(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, ':');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(_), Some(_), Some(path)) => Some(path),
                _ => None,
            }
        })
        .find_map(|path| path.rsplit('/').find(|seg| !seg.is_empty()))
        .map(str::to_string)
}
