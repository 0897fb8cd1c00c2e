use std::fs;
use std::path::{Path, PathBuf};

use crate::core::system_info::gpu::detect_vendor;
use crate::core::system_info::types::{GpuInfo, GpuVendor};
use crate::error::Result;
use crate::platform::command::run_command;

/// Display controllers from `lspci -mm`, enriched from sysfs
pub fn get_gpu_info() -> Result<Vec<GpuInfo>> {
    let output = run_command("lspci", &["-mm"])?;

    let gpus = parse_lspci_mm(&output)
        .into_iter()
        .map(|device| {
            let sysfs = pci_sysfs_path(&device.slot);
            let driver = driver_name(&sysfs);
            let vendor = match detect_vendor(&device.vendor) {
                GpuVendor::Unknown => detect_vendor(&device.name),
                known => known,
            };

            GpuInfo {
                vendor,
                name: format!("{} {}", device.vendor, device.name),
                driver_version: driver
                    .as_deref()
                    .and_then(module_version)
                    .or(driver)
                    .unwrap_or_else(|| "Unknown".to_string()),
                memory_total: read_u64(&sysfs.join("mem_info_vram_total")).unwrap_or(0),
                pci_slot: Some(device.slot),
                ..Default::default()
            }
        })
        .collect();

    Ok(gpus)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PciDevice {
    pub slot: String,
    pub class: String,
    pub vendor: String,
    pub name: String,
}

/// Keep VGA, 3D and display controllers from machine-readable lspci output.
///
/// Line shape: `00:02.0 "VGA compatible controller" "Intel Corporation" "UHD Graphics 770" -r0c ...`
pub fn parse_lspci_mm(output: &str) -> Vec<PciDevice> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('"').collect();
            if parts.len() < 6 {
                return None;
            }
            let class = parts[1];
            let is_display = class.contains("VGA")
                || class.contains("3D controller")
                || class.contains("Display controller");
            if !is_display {
                return None;
            }
            Some(PciDevice {
                slot: parts[0].trim().to_string(),
                class: class.to_string(),
                vendor: parts[3].trim().to_string(),
                name: parts[5].trim().to_string(),
            })
        })
        .collect()
}

fn pci_sysfs_path(slot: &str) -> PathBuf {
    // lspci drops the PCI domain when it is 0000
    let full = if slot.matches(':').count() == 1 {
        format!("0000:{}", slot)
    } else {
        slot.to_string()
    };
    Path::new("/sys/bus/pci/devices").join(full)
}

fn driver_name(device: &Path) -> Option<String> {
    fs::read_link(device.join("driver"))
        .ok()
        .and_then(|target| target.file_name().map(|n| n.to_string_lossy().to_string()))
}

fn module_version(driver: &str) -> Option<String> {
    fs::read_to_string(Path::new("/sys/module").join(driver).join("version"))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_u64(path: &Path) -> Option<u64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSPCI: &str = r#"00:00.0 "Host bridge" "Intel Corporation" "12th Gen Core Processor Host Bridge" -r02 "Dell" "Device 0a9f"
00:02.0 "VGA compatible controller" "Intel Corporation" "Alder Lake-S GT1 [UHD Graphics 770]" -r0c -p00 "Dell" "Device 0a9f"
01:00.0 "3D controller" "NVIDIA Corporation" "GA107M [GeForce RTX 3050 Mobile]" -ra1 "Dell" "Device 0b19"
02:00.0 "Non-Volatile memory controller" "Samsung Electronics Co Ltd" "NVMe SSD Controller" -p02 "Samsung" "Device a801"
"#;

    #[test]
    fn test_parse_lspci_mm_keeps_display_devices() {
        let devices = parse_lspci_mm(LSPCI);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].slot, "00:02.0");
        assert_eq!(devices[0].vendor, "Intel Corporation");
        assert_eq!(devices[0].name, "Alder Lake-S GT1 [UHD Graphics 770]");
        assert_eq!(devices[1].class, "3D controller");
        assert_eq!(detect_vendor(&devices[1].vendor), GpuVendor::Nvidia);
    }

    #[test]
    fn test_parse_lspci_mm_ignores_malformed_lines() {
        assert!(parse_lspci_mm("garbage line\n\n").is_empty());
    }

    #[test]
    fn test_pci_sysfs_path_adds_domain() {
        assert_eq!(
            pci_sysfs_path("01:00.0"),
            PathBuf::from("/sys/bus/pci/devices/0000:01:00.0")
        );
        assert_eq!(
            pci_sysfs_path("0001:01:00.0"),
            PathBuf::from("/sys/bus/pci/devices/0001:01:00.0")
        );
    }
}
