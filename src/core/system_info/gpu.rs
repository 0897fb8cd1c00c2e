use crate::core::system_info::types::{GpuInfo, GpuVendor};
use crate::error::Result;

#[cfg(windows)]
use crate::platform::system::windows::gpu::get_gpu_info;

#[cfg(target_os = "linux")]
use crate::platform::system::linux::gpu::get_gpu_info;

pub fn collect() -> Result<Vec<GpuInfo>> {
    #[cfg(any(windows, target_os = "linux"))]
    {
        #[allow(unused_mut)]
        let mut gpus = get_gpu_info()?;

        #[cfg(feature = "nvml")]
        enrich_from_nvml(&mut gpus);

        Ok(gpus)
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Err(crate::error::VantaError::unsupported(
            "GPU enumeration is not available on this platform",
        ))
    }
}

pub fn detect_vendor(name: &str) -> GpuVendor {
    let name = name.to_ascii_lowercase();

    if name.contains("nvidia") || name.contains("geforce") || name.contains("quadro") {
        GpuVendor::Nvidia
    } else if name.contains("amd") || name.contains("radeon") || name.contains("ati ") {
        GpuVendor::Amd
    } else if name.contains("intel") {
        GpuVendor::Intel
    } else {
        GpuVendor::Unknown
    }
}

/// Overwrite VRAM, driver and temperature of NVIDIA adapters with NVML data.
///
/// NVIDIA adapters are matched to NVML devices by order of appearance.
#[cfg(feature = "nvml")]
pub fn enrich_from_nvml(gpus: &mut [GpuInfo]) {
    let devices = match crate::platform::nvidia_nvml::list_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::debug!("NVML enrichment skipped: {}", e);
            return;
        }
    };

    let nvidia = gpus.iter_mut().filter(|g| g.vendor == GpuVendor::Nvidia);
    for (gpu, device) in nvidia.zip(devices) {
        if device.memory_total > 0 {
            gpu.memory_total = device.memory_total;
        }
        if let Some(driver) = device.driver_version {
            gpu.driver_version = driver;
        }
        gpu.temperature = device.temperature.or(gpu.temperature);
        gpu.pci_slot = gpu.pci_slot.take().or(device.pci_bus_id);
    }
}

/// VRAM as reported by `AdapterRAM`, which is a signed 32-bit field
pub fn wrap_adapter_ram(raw: i64) -> u64 {
    if raw < 0 {
        (raw + (1i64 << 32)) as u64
    } else {
        raw as u64
    }
}
