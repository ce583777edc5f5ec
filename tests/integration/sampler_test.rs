// Integration tests for per-tick snapshot assembly

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Local;
use sysmoni::sampler::{
    CgroupCache, DiskCounters, GpuReading, NetCounters, Sampler, SamplerConfig, SysfsReader,
    CGROUP_CACHE_TTL_TICKS, CGROUP_LIMIT, THROTTLED_PROCESS_LIMIT, TOP_PROCESS_LIMIT,
};
use tempfile::TempDir;

use super::support::{process, FakeHost, HostTick};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sampler_with(host: FakeHost, config: SamplerConfig, root: &TempDir) -> Sampler<FakeHost> {
    Sampler::with_sources(
        config,
        host,
        CgroupCache::with_proc_root(root.path().join("proc")),
        SysfsReader::with_roots(root.path().join("sys"), root.path().join("proc")),
    )
}

#[test]
fn test_first_tick_reports_zero_rates() {
    let root = TempDir::new().unwrap();
    let mut sampler = sampler_with(FakeHost::linear(), SamplerConfig::default(), &root);

    let sample = sampler.sample(Local::now());
    assert_eq!(sample.cpu.total, 0.0);
    assert_eq!(sample.cpu.per_core, vec![0.0]);
    assert_eq!(sample.io.disk_read_mbs, 0.0);
    assert_eq!(sample.io.net_rx_mbps, 0.0);
    assert_eq!(sample.interval, Duration::from_secs(1));
}

#[test]
fn test_second_tick_computes_rates() {
    let root = TempDir::new().unwrap();
    let mut first = HostTick::linear(1);
    let mut second = HostTick::linear(2);

    let mut disks = HashMap::new();
    disks.insert("sda".to_string(), DiskCounters { read_bytes: 1_048_576, write_bytes: 0 });
    disks.insert("loop3".to_string(), DiskCounters { read_bytes: 0, write_bytes: 0 });
    first.disks = Some(disks.clone());
    disks.insert("sda".to_string(), DiskCounters { read_bytes: 2_097_152, write_bytes: 524_288 });
    disks.insert("loop3".to_string(), DiskCounters { read_bytes: 1 << 30, write_bytes: 1 << 30 });
    second.disks = Some(disks);

    let mut nets = HashMap::new();
    nets.insert("eth0".to_string(), NetCounters { rx_bytes: 0, tx_bytes: 0 });
    first.nets = Some(nets.clone());
    nets.insert("eth0".to_string(), NetCounters { rx_bytes: 250_000, tx_bytes: 125_000 });
    second.nets = Some(nets);

    let mut sampler = sampler_with(
        FakeHost::scripted(vec![first, second]),
        SamplerConfig::default(),
        &root,
    );
    sampler.sample(Local::now());
    let sample = sampler.sample(Local::now());

    assert!((sample.cpu.total - 10.0).abs() < 1e-9);
    assert!((sample.cpu.per_core[0] - 50.0).abs() < 1e-9);
    assert!((sample.io.disk_read_mbs - 1.0).abs() < 1e-9);
    assert!((sample.io.disk_write_mbs - 0.5).abs() < 1e-9);
    assert!((sample.io.net_rx_mbps - 2.0).abs() < 1e-9);
    assert!((sample.io.net_tx_mbps - 1.0).abs() < 1e-9);
    assert_eq!(sample.cpu.load1, 1.5);
}

#[test]
fn test_failed_sources_degrade_to_zero() {
    let root = TempDir::new().unwrap();
    let broken = HostTick {
        cpu: None,
        disks: None,
        nets: None,
        processes: Vec::new(),
    };
    let mut sampler = sampler_with(
        FakeHost::scripted(vec![HostTick::linear(1), broken, HostTick::linear(3)]),
        SamplerConfig::default(),
        &root,
    );

    sampler.sample(Local::now());
    let degraded = sampler.sample(Local::now());
    assert_eq!(degraded.cpu.total, 0.0);
    assert!(degraded.cpu.per_core.is_empty());
    assert_eq!(degraded.io.disk_read_mbs, 0.0);

    // Baseline from tick 1 survives the failed read
    let recovered = sampler.sample(Local::now());
    assert!((recovered.cpu.total - 10.0).abs() < 1e-9);
}

#[test]
fn test_process_lists_bounded_and_sorted() {
    let root = TempDir::new().unwrap();
    let mut tick = HostTick::linear(1);
    for pid in 1..=200u32 {
        let nice = if pid % 3 == 0 { 10 } else { 0 };
        tick.processes
            .push(process(pid, &format!("worker{}", pid), (pid % 37) as f64, nice));
        write(
            root.path(),
            &format!("proc/{}/cgroup", pid),
            &format!("0::/system.slice/svc{}.service\n", pid % 20),
        );
    }
    tick.processes.push(process(999, "", 99.0, 0));

    let mut sampler = sampler_with(FakeHost::scripted(vec![tick]), SamplerConfig::default(), &root);
    let sample = sampler.sample(Local::now());

    assert_eq!(sample.top.len(), TOP_PROCESS_LIMIT);
    assert!(sample.top.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
    assert!(sample.top.iter().all(|p| p.pid != 999), "unnamed processes are skipped");

    assert_eq!(sample.throttled.len(), THROTTLED_PROCESS_LIMIT);
    assert!(sample.throttled.iter().all(|p| p.nice > 0));
    assert!(sample
        .throttled
        .windows(2)
        .all(|w| w[0].cpu_percent >= w[1].cpu_percent));

    assert_eq!(sample.cgroups.len(), CGROUP_LIMIT);
    assert!(sample
        .cgroups
        .windows(2)
        .all(|w| w[0].cpu_percent >= w[1].cpu_percent));
    assert!(sample.cgroups.iter().all(|c| c.name.ends_with(".service")));
}

#[test]
fn test_command_falls_back_to_name_and_is_truncated() {
    let root = TempDir::new().unwrap();
    let mut tick = HostTick::linear(1);
    tick.processes.push(process(1, "kthreadd", 2.0, 0));
    let mut long = process(2, "java", 1.0, 0);
    long.cmdline = format!("/usr/bin/java -jar {}", "x".repeat(200));
    tick.processes.push(long);

    let mut sampler = sampler_with(FakeHost::scripted(vec![tick]), SamplerConfig::default(), &root);
    let sample = sampler.sample(Local::now());

    assert_eq!(sample.top[0].command, "kthreadd");
    assert_eq!(sample.top[1].command.chars().count(), 60);
    assert!(sample.top[1].command.ends_with('…'));
}

#[test]
fn test_cgroup_attribution_refreshes_after_invalidation() {
    let root = TempDir::new().unwrap();
    write(root.path(), "proc/42/cgroup", "0::/user.slice/old.scope\n");
    let mut tick = HostTick::linear(1);
    tick.processes.push(process(42, "app", 5.0, 0));
    let ticks = vec![tick; CGROUP_CACHE_TTL_TICKS as usize + 1];

    let mut sampler = sampler_with(FakeHost::scripted(ticks), SamplerConfig::default(), &root);
    let first = sampler.sample(Local::now());
    assert_eq!(first.cgroups[0].name, "old.scope");

    // pid reused by a process in another cgroup
    write(root.path(), "proc/42/cgroup", "0::/user.slice/new.scope\n");
    let mut names = Vec::new();
    for _ in 0..CGROUP_CACHE_TTL_TICKS {
        names.push(sampler.sample(Local::now()).cgroups[0].name.clone());
    }
    assert_eq!(names.last().map(String::as_str), Some("new.scope"));
}

#[test]
fn test_optional_sensors() {
    let root = TempDir::new().unwrap();
    write(root.path(), "sys/class/power_supply/BAT1/capacity", "55\n");
    write(root.path(), "sys/class/power_supply/BAT1/status", "Charging\n");
    write(root.path(), "sys/class/thermal/thermal_zone0/temp", "51000\n");
    write(root.path(), "proc/sys/fs/inotify/max_user_watches", "8192\n");

    let mut sampler = sampler_with(FakeHost::linear(), SamplerConfig::default(), &root);
    sampler.gpu_slot().publish(vec![GpuReading {
        name: "gpu0".to_string(),
        utilization_percent: 12.0,
        ..Default::default()
    }]);
    let sample = sampler.sample(Local::now());

    let battery = sample.battery.unwrap();
    assert_eq!(battery.percent, 55.0);
    assert_eq!(battery.state, "Charging");
    assert_eq!(sample.temps.len(), 1);
    assert_eq!(sample.temps[0].celsius, 51.0);
    assert_eq!(sample.inotify.max_user_watches, 8192);
    assert_eq!(sample.gpus.len(), 1);
}

#[test]
fn test_disabled_sensors_omitted() {
    let root = TempDir::new().unwrap();
    write(root.path(), "sys/class/power_supply/BAT0/capacity", "90\n");
    let config = SamplerConfig {
        enable_gpu: false,
        enable_battery: false,
        ..SamplerConfig::default()
    };
    let mut sampler = sampler_with(FakeHost::linear(), config, &root);
    sampler.gpu_slot().publish(vec![GpuReading::default()]);

    let sample = sampler.sample(Local::now());
    assert!(sample.battery.is_none());
    assert!(sample.gpus.is_empty());
    assert!(sample.temps.is_empty());
}

#[test]
fn test_sample_serializes_with_stable_field_names() {
    let root = TempDir::new().unwrap();
    let mut sampler = sampler_with(FakeHost::linear(), SamplerConfig::default(), &root);
    let value = serde_json::to_value(sampler.sample(Local::now())).unwrap();

    for key in [
        "timestamp", "interval", "cpu", "memory", "io", "gpus", "battery", "top", "throttled",
        "cgroups", "inotify", "temps",
    ] {
        assert!(value.get(key).is_some(), "missing field {}", key);
    }
}
