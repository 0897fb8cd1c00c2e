use serde::Deserialize;

use super::core::run_powershell_rows;
use crate::core::system_info::gpu::{detect_vendor, wrap_adapter_ram};
use crate::core::system_info::types::GpuInfo;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct VideoControllerPs {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "AdapterRAM")]
    adapter_ram: Option<i64>,
    #[serde(rename = "DriverVersion")]
    driver_version: Option<String>,
    #[serde(rename = "VideoModeDescription")]
    video_mode: Option<String>,
    #[serde(rename = "DriverDate")]
    driver_date: Option<String>,
    #[serde(rename = "PNPDeviceID")]
    pnp_device_id: Option<String>,
}

pub fn get_gpu_info() -> Result<Vec<GpuInfo>> {
    let controllers: Vec<VideoControllerPs> = run_powershell_rows(
        "Get-CimInstance Win32_VideoController \
         | Select-Object Name, AdapterRAM, DriverVersion, VideoModeDescription, PNPDeviceID, \
           @{n='DriverDate';e={ if ($_.DriverDate) { $_.DriverDate.ToString('yyyy-MM-dd') } }}",
    )?;

    Ok(controllers.into_iter().map(gpu_from_controller).collect())
}

fn gpu_from_controller(c: VideoControllerPs) -> GpuInfo {
    let name = c.name.unwrap_or_else(|| "Unknown GPU".to_string());
    GpuInfo {
        vendor: detect_vendor(&name),
        name,
        driver_version: c.driver_version.unwrap_or_else(|| "Unknown".to_string()),
        memory_total: c.adapter_ram.map(wrap_adapter_ram).unwrap_or(0),
        temperature: None,
        video_mode: c.video_mode,
        driver_date: c.driver_date,
        pci_slot: c.pnp_device_id,
    }
}
