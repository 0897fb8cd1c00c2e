use crate::error::{Result, VantaError};
use once_cell::sync::Lazy;

use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::Nvml;

/// NVML must be initialized once per process
static NVML: Lazy<Option<Nvml>> = Lazy::new(|| Nvml::init().ok());

/// Static figures for one NVIDIA device
#[derive(Debug, Clone, Default)]
pub struct NvmlDevice {
    pub name: Option<String>,
    pub memory_total: u64,
    pub driver_version: Option<String>,
    pub temperature: Option<f32>,
    pub pci_bus_id: Option<String>,
}

/// Enumerate NVIDIA devices in NVML index order.
///
/// Devices that fail to open are skipped.
pub fn list_devices() -> Result<Vec<NvmlDevice>> {
    let nvml = NVML.as_ref().ok_or_else(|| {
        VantaError::probe("NVML not available (NVIDIA driver not installed or incompatible)")
    })?;

    let count = nvml
        .device_count()
        .map_err(|e| VantaError::probe(format!("NVML device count failed: {}", e)))?;
    let driver_version = nvml.sys_driver_version().ok();

    let mut devices = Vec::with_capacity(count as usize);
    for index in 0..count {
        let device = match nvml.device_by_index(index) {
            Ok(device) => device,
            Err(e) => {
                log::debug!("Skipping NVIDIA device {}: {}", index, e);
                continue;
            }
        };

        devices.push(NvmlDevice {
            name: device.name().ok(),
            memory_total: device.memory_info().map(|m| m.total).unwrap_or(0),
            driver_version: driver_version.clone(),
            temperature: device
                .temperature(TemperatureSensor::Gpu)
                .ok()
                .map(|t| t as f32),
            pci_bus_id: device.pci_info().ok().map(|p| p.bus_id),
        });
    }

    Ok(devices)
}
