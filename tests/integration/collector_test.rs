use vantasys::{CollectorConfig, MetricsCollector};

fn collector() -> MetricsCollector {
    MetricsCollector::with_config(CollectorConfig {
        scan_hardware: false,
    })
}

#[test]
fn test_cpu_info() {
    let collector = collector();
    let cpu = collector.get_cpu_info();

    assert!(cpu.count_logical >= 1);
    assert_eq!(cpu.per_core_usage.len(), cpu.count_logical);
    assert!(cpu.usage_percent >= 0.0);
    // Nothing published yet: identification falls back to "Unknown"
    assert_eq!(cpu.family, "Unknown");
}

#[test]
fn test_memory_info() {
    let memory = collector().get_memory_info();

    assert!(memory.total > 0);
    assert!(memory.used <= memory.total);
    assert!((0.0..=100.0).contains(&memory.percent));
    assert_eq!(memory.pagefile_total, Some(memory.swap_total));
    assert!(memory.modules.is_empty());
}

#[test]
fn test_disk_info_has_a_device() {
    let disk = collector().get_disk_info();
    assert!(!disk.device.is_empty());
    assert!(disk.used <= disk.total);
}

#[test]
fn test_first_network_rate_is_zero() {
    let collector = collector();
    let first = collector.get_network_info();
    assert_eq!(first.upload_speed, 0.0);
    assert_eq!(first.download_speed, 0.0);

    let detailed = collector.get_network_detailed();
    assert!(detailed.global_rate.bytes_recv >= first.bytes_recv);
}

#[test]
fn test_first_disk_rates_are_zero() {
    let detailed = collector().get_disk_detailed();
    for stats in detailed.io_stats.values() {
        assert_eq!(stats.read_speed, 0.0);
        assert_eq!(stats.write_speed, 0.0);
    }
}

#[test]
fn test_top_processes_limits_and_order() {
    let collector = collector();

    assert!(collector.get_top_processes(0).unwrap().is_empty());

    let first = collector.get_top_processes(5).unwrap();
    assert!(first.len() <= 5);
    assert!(first.iter().all(|p| p.cpu_percent == 0.0));

    let second = collector.get_top_processes(5).unwrap();
    assert!(second.len() <= 5);
    assert!(second
        .windows(2)
        .all(|pair| pair[0].cpu_percent >= pair[1].cpu_percent));
}

#[cfg(target_os = "linux")]
#[test]
fn test_top_processes_exclude_threads() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let collector = collector();
    let own_pid = std::process::id();

    let release = Arc::new(Barrier::new(4));
    let workers: Vec<_> = (0..3)
        .map(|_| {
            let release = Arc::clone(&release);
            thread::spawn(move || {
                release.wait();
            })
        })
        .collect();

    let thread_ids: Vec<u32> = std::fs::read_dir("/proc/self/task")
        .unwrap()
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse().ok())
        .filter(|tid| *tid != own_pid)
        .collect();
    assert!(thread_ids.len() >= 3);

    // A detail lookup loads this process's tasks into the table
    collector.get_process_detail(i64::from(own_pid)).unwrap();
    collector.get_top_processes(100_000).unwrap();
    let rows = collector.get_top_processes(100_000).unwrap();

    release.wait();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(rows.iter().any(|p| p.pid == own_pid));
    let leaked: Vec<_> = rows
        .iter()
        .filter(|p| thread_ids.contains(&p.pid))
        .map(|p| p.pid)
        .collect();
    assert!(leaked.is_empty(), "thread ids listed as processes: {:?}", leaked);
}

#[cfg(unix)]
#[test]
fn test_kill_spawned_process() {
    let collector = collector();
    let mut child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("sleep is available");
    let pid = i64::from(child.id());

    assert!(collector.kill_process(pid).unwrap());
    let status = child.wait().unwrap();
    assert!(!status.success());

    // Reaped: nothing left to signal
    assert!(!collector.kill_process(pid).unwrap());
}

#[test]
fn test_process_detail_for_self() {
    let collector = collector();
    let pid = std::process::id();

    let detail = collector
        .get_process_detail(i64::from(pid))
        .unwrap()
        .expect("own process is visible");
    assert_eq!(detail.pid, pid);
    assert!(detail.memory_info.contains_key("rss"));
    assert!(detail.memory_info.contains_key("vms"));
}

#[test]
fn test_missing_pid() {
    let collector = collector();
    // Above any pid_max the kernel allows
    let missing = i64::from(i32::MAX);

    assert!(collector.get_process_detail(missing).unwrap().is_none());
    assert!(!collector.kill_process(missing).unwrap());
}

#[test]
fn test_invalid_input() {
    let collector = collector();
    assert!(collector.get_top_processes(-3).unwrap_err().is_invalid_input());
    assert!(collector.get_connections(-1).unwrap_err().is_invalid_input());
    assert!(collector.get_process_detail(-1).unwrap_err().is_invalid_input());
}

#[test]
fn test_connections_respect_limit() {
    let collector = collector();
    assert!(collector.get_connections(0).unwrap().is_empty());

    let conns = collector.get_connections(10).unwrap();
    assert!(conns.len() <= 10);
    assert!(conns.windows(2).all(|pair| pair[0].status <= pair[1].status));
}

#[test]
fn test_system_info_before_scan() {
    let info = collector().get_system_info();
    assert!(!info.hostname.is_empty());
    assert!(info.gpu.is_empty());
    assert!(info.motherboard.is_none());
    assert!(info.uptime_seconds > 0 || info.boot_time == 0);
}

#[test]
fn test_sensors_do_not_fail() {
    let sensors = collector().get_sensors();
    for readings in sensors.temperatures.values() {
        assert!(!readings.is_empty());
    }
}

#[test]
fn test_collector_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MetricsCollector>();
}
