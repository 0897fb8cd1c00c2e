use std::thread;
use std::time::{Duration, Instant};

use vantasys::core::system_info::{
    CpuSpecs, DdrType, GpuInfo, GpuVendor, HardwareProbe, MotherboardInfo, ProbeOutcome,
    RamModule, ScanStatus, SharedHardware,
};
use vantasys::MetricsCollector;

struct StaticProbe;

impl HardwareProbe for StaticProbe {
    fn gpus(&self) -> ProbeOutcome<Vec<GpuInfo>> {
        ProbeOutcome::Ok(vec![GpuInfo {
            name: "Radeon RX 7900 XT".to_string(),
            vendor: GpuVendor::Amd,
            driver_version: "6.8".to_string(),
            memory_total: 20 << 30,
            ..Default::default()
        }])
    }

    fn motherboard(&self) -> ProbeOutcome<Option<MotherboardInfo>> {
        ProbeOutcome::Degraded("dmi not readable".to_string())
    }

    fn cpu_specs(&self) -> ProbeOutcome<CpuSpecs> {
        ProbeOutcome::Ok(CpuSpecs {
            marketing_name: Some("Test CPU 9000".to_string()),
            family: Some("19".to_string()),
            cores: 6,
            threads: 12,
            ..Default::default()
        })
    }

    fn ram_modules(&self) -> ProbeOutcome<Vec<RamModule>> {
        ProbeOutcome::Ok(vec![RamModule {
            bank_label: "DIMM A1".to_string(),
            capacity: 16 << 30,
            speed: 3200,
            configured_speed: Some(3000),
            memory_type: Some(DdrType::DDR4),
            ..Default::default()
        }])
    }
}

fn wait_complete(hardware: &SharedHardware) {
    let started = Instant::now();
    while hardware.status() == ScanStatus::Pending {
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "hardware scan did not publish"
        );
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_published_profile_reaches_every_reader() {
    let collector = MetricsCollector::with_probe(Box::new(StaticProbe));
    wait_complete(collector.hardware());

    let system = collector.get_system_info();
    assert_eq!(system.hardware_scan, ScanStatus::Complete);
    assert_eq!(system.gpu.len(), 1);
    assert_eq!(system.gpu[0].vendor, GpuVendor::Amd);
    assert!(system.motherboard.is_none());
    assert_eq!(system.cpu_marketing_name.as_deref(), Some("Test CPU 9000"));

    let cpu = collector.get_cpu_info();
    assert_eq!(cpu.family, "19");
    assert_eq!(cpu.cores, 6);
    assert_eq!(cpu.threads, 12);

    let memory = collector.get_memory_info();
    assert_eq!(memory.modules.len(), 1);
    assert_eq!(memory.memory_type.as_deref(), Some("DDR4"));
    assert_eq!(memory.dram_frequency, Some(1500.0));

    let degraded = collector.hardware().snapshot().degraded;
    assert_eq!(degraded.len(), 1);
    assert_eq!(degraded[0].probe, "motherboard");
}

/// Every probe but the CPU one panics
struct FaultyProbe;

impl HardwareProbe for FaultyProbe {
    fn gpus(&self) -> ProbeOutcome<Vec<GpuInfo>> {
        panic!("gpu driver query crashed");
    }

    fn motherboard(&self) -> ProbeOutcome<Option<MotherboardInfo>> {
        panic!("dmi table truncated");
    }

    fn cpu_specs(&self) -> ProbeOutcome<CpuSpecs> {
        ProbeOutcome::Ok(CpuSpecs {
            family: Some("6".to_string()),
            ..Default::default()
        })
    }

    fn ram_modules(&self) -> ProbeOutcome<Vec<RamModule>> {
        panic!("smbios entry out of bounds");
    }
}

#[test]
fn test_panicking_probes_leave_collector_usable() {
    let collector = MetricsCollector::with_probe(Box::new(FaultyProbe));
    wait_complete(collector.hardware());

    let profile = collector.hardware().snapshot();
    assert_eq!(profile.status, ScanStatus::Complete);
    let failed: Vec<_> = profile.degraded.iter().map(|f| f.probe.as_str()).collect();
    assert_eq!(failed, vec!["gpu", "motherboard", "ram"]);
    assert!(profile.degraded[2].reason.contains("smbios entry out of bounds"));

    assert_eq!(collector.get_cpu_info().family, "6");
    assert!(collector.get_memory_info().modules.is_empty());
    assert!(collector.get_system_info().gpu.is_empty());
}
