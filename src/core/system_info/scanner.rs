//! One-shot background hardware scan.
//!
//! Probes are slow (they shell out to the platform management interface), so
//! they run on a dedicated thread at startup and publish a complete
//! [`HardwareProfile`] into a [`SharedHardware`] cell. Readers never wait on
//! the scan: before it finishes they see the empty pending profile.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::RwLock;

use super::types::*;
use crate::error::Result;

// A panicking probe must degrade, not take the process down
#[cfg(panic = "abort")]
compile_error!("the hardware scanner requires panic = \"unwind\"");

/// Result of a single best-effort probe
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Ok(T),
    /// The probe failed; the reason is kept for logging and the profile
    Degraded(String),
}

impl<T> From<Result<T>> for ProbeOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => ProbeOutcome::Ok(value),
            Err(e) => ProbeOutcome::Degraded(e.to_string()),
        }
    }
}

/// Source of slow hardware descriptors.
///
/// Implementations are provided in the platform layer; each method is
/// independent and must not depend on another having succeeded.
pub trait HardwareProbe: Send {
    fn gpus(&self) -> ProbeOutcome<Vec<GpuInfo>>;

    fn motherboard(&self) -> ProbeOutcome<Option<MotherboardInfo>>;

    fn cpu_specs(&self) -> ProbeOutcome<CpuSpecs>;

    fn ram_modules(&self) -> ProbeOutcome<Vec<RamModule>>;
}

/// Lock-guarded hardware profile shared between the scanner and readers
#[derive(Debug, Clone, Default)]
pub struct SharedHardware {
    inner: Arc<RwLock<HardwareProfile>>,
}

impl SharedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current profile, taken under the read lock
    pub fn snapshot(&self) -> HardwareProfile {
        self.inner.read().clone()
    }

    /// Run `f` against the current profile while holding the read lock
    pub fn read<R>(&self, f: impl FnOnce(&HardwareProfile) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn status(&self) -> ScanStatus {
        self.inner.read().status
    }

    /// Replace the whole profile in one write-lock window
    pub fn publish(&self, mut profile: HardwareProfile) {
        profile.status = ScanStatus::Complete;
        *self.inner.write() = profile;
    }
}

pub struct HardwareScanner;

impl HardwareScanner {
    /// Start the scan on its own thread. The handle is returned for callers
    /// that want it; the metrics façade drops it.
    pub fn spawn(
        probe: Box<dyn HardwareProbe>,
        target: SharedHardware,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("hardware-scan".to_string())
            .spawn(move || {
                let profile = Self::scan(probe.as_ref());
                target.publish(profile);
            })
    }

    /// Run every probe and assemble the profile. No lock is held here.
    pub fn scan(probe: &dyn HardwareProbe) -> HardwareProfile {
        let started = Instant::now();
        let mut degraded = Vec::new();

        let gpus = run_probe("gpu", || probe.gpus(), &mut degraded);
        let motherboard = run_probe("motherboard", || probe.motherboard(), &mut degraded);
        let cpu_specs = run_probe("cpu", || probe.cpu_specs(), &mut degraded);
        let ram_modules = run_probe("ram", || probe.ram_modules(), &mut degraded);

        info!(
            "Hardware scan finished in {:.1}s ({} GPU(s), {} RAM module(s), {} degraded probe(s))",
            started.elapsed().as_secs_f64(),
            gpus.len(),
            ram_modules.len(),
            degraded.len()
        );

        HardwareProfile {
            status: ScanStatus::Pending,
            gpus,
            motherboard,
            cpu_specs,
            ram_modules,
            degraded,
        }
    }
}

fn run_probe<T: Default>(
    name: &str,
    probe: impl FnOnce() -> ProbeOutcome<T>,
    degraded: &mut Vec<ProbeFailure>,
) -> T {
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(probe)).unwrap_or_else(|payload| {
        ProbeOutcome::Degraded(format!("probe panicked: {}", panic_message(&payload)))
    });

    match outcome {
        ProbeOutcome::Ok(value) => {
            debug!(
                "Probe '{}' completed in {} ms",
                name,
                started.elapsed().as_millis()
            );
            value
        }
        ProbeOutcome::Degraded(reason) => {
            warn!("Probe '{}' degraded: {}", name, reason);
            degraded.push(ProbeFailure {
                probe: name.to_string(),
                reason,
            });
            T::default()
        }
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VantaError;
    use std::sync::mpsc;
    use std::time::Duration;

    struct FakeProbe {
        fail_gpu: bool,
        panic_ram: bool,
    }

    impl HardwareProbe for FakeProbe {
        fn gpus(&self) -> ProbeOutcome<Vec<GpuInfo>> {
            if self.fail_gpu {
                return ProbeOutcome::Degraded("powershell not found".to_string());
            }
            ProbeOutcome::Ok(vec![GpuInfo {
                name: "Test GPU".to_string(),
                vendor: GpuVendor::Nvidia,
                driver_version: "1.0".to_string(),
                memory_total: 8 << 30,
                ..Default::default()
            }])
        }

        fn motherboard(&self) -> ProbeOutcome<Option<MotherboardInfo>> {
            ProbeOutcome::Ok(Some(MotherboardInfo {
                manufacturer: "Acme".to_string(),
                product: "B650".to_string(),
                serial: "123".to_string(),
                version: None,
                bios_vendor: None,
                bios_version: "F1".to_string(),
                bios_date: "2024-01-01".to_string(),
            }))
        }

        fn cpu_specs(&self) -> ProbeOutcome<CpuSpecs> {
            ProbeOutcome::Ok(CpuSpecs {
                cores: 8,
                threads: 16,
                ..Default::default()
            })
        }

        fn ram_modules(&self) -> ProbeOutcome<Vec<RamModule>> {
            if self.panic_ram {
                panic!("boom");
            }
            ProbeOutcome::Ok(vec![RamModule::default()])
        }
    }

    /// Blocks its first probe until released, to observe the pending state
    struct GatedProbe {
        gate: parking_lot::Mutex<mpsc::Receiver<()>>,
    }

    impl HardwareProbe for GatedProbe {
        fn gpus(&self) -> ProbeOutcome<Vec<GpuInfo>> {
            let _ = self.gate.lock().recv_timeout(Duration::from_secs(5));
            ProbeOutcome::Ok(vec![GpuInfo::default()])
        }
        fn motherboard(&self) -> ProbeOutcome<Option<MotherboardInfo>> {
            ProbeOutcome::Ok(None)
        }
        fn cpu_specs(&self) -> ProbeOutcome<CpuSpecs> {
            ProbeOutcome::Ok(CpuSpecs::default())
        }
        fn ram_modules(&self) -> ProbeOutcome<Vec<RamModule>> {
            ProbeOutcome::Ok(vec![])
        }
    }

    #[test]
    fn test_pending_profile_is_empty() {
        let shared = SharedHardware::new();
        let profile = shared.snapshot();
        assert_eq!(profile.status, ScanStatus::Pending);
        assert!(profile.gpus.is_empty());
        assert!(profile.motherboard.is_none());
    }

    #[test]
    fn test_publish_is_visible_to_readers() {
        let shared = SharedHardware::new();
        let profile = HardwareScanner::scan(&FakeProbe {
            fail_gpu: false,
            panic_ram: false,
        });
        shared.publish(profile.clone());

        let seen = shared.snapshot();
        assert_eq!(seen.status, ScanStatus::Complete);
        assert_eq!(seen.gpus, profile.gpus);
        assert_eq!(seen.motherboard, profile.motherboard);
        assert!(seen.degraded.is_empty());
    }

    #[test]
    fn test_failed_probe_uses_default_and_others_survive() {
        let profile = HardwareScanner::scan(&FakeProbe {
            fail_gpu: true,
            panic_ram: true,
        });

        assert!(profile.gpus.is_empty());
        assert!(profile.ram_modules.is_empty());
        assert!(profile.motherboard.is_some());
        assert_eq!(profile.cpu_specs.cores, 8);

        let failed: Vec<_> = profile.degraded.iter().map(|f| f.probe.as_str()).collect();
        assert_eq!(failed, vec!["gpu", "ram"]);
        assert!(profile.degraded[1].reason.contains("boom"));
    }

    #[test]
    fn test_spawned_scan_does_not_block_readers() {
        let (tx, rx) = mpsc::channel();
        let shared = SharedHardware::new();
        let handle = HardwareScanner::spawn(
            Box::new(GatedProbe {
                gate: parking_lot::Mutex::new(rx),
            }),
            shared.clone(),
        )
        .unwrap();

        // Scan is parked inside a probe; the reader still gets the default
        assert_eq!(shared.status(), ScanStatus::Pending);
        assert!(shared.read(|p| p.gpus.is_empty()));

        tx.send(()).unwrap();
        handle.join().unwrap();

        assert_eq!(shared.status(), ScanStatus::Complete);
        assert_eq!(shared.snapshot().gpus.len(), 1);
    }

    #[test]
    fn test_outcome_from_result() {
        let ok = ProbeOutcome::from(Ok::<u32, VantaError>(3));
        assert_eq!(ok, ProbeOutcome::Ok(3));

        let degraded = ProbeOutcome::<u32>::from(Err(VantaError::probe("no wmi")));
        assert_eq!(
            degraded,
            ProbeOutcome::Degraded("Probe failed: no wmi".to_string())
        );
    }
}
