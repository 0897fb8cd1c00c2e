use serde::Deserialize;

use super::core::run_powershell_rows;
use crate::core::system_info::memory::{ddr_from_smbios, module_size_label, rank_label};
use crate::core::system_info::motherboard::clean_field;
use crate::core::system_info::types::RamModule;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct PhysicalMemoryPs {
    #[serde(rename = "BankLabel")]
    bank_label: Option<String>,
    #[serde(rename = "DeviceLocator")]
    device_locator: Option<String>,
    #[serde(rename = "Capacity")]
    capacity: Option<u64>,
    #[serde(rename = "Speed")]
    speed: Option<u32>,
    #[serde(rename = "ConfiguredClockSpeed")]
    configured_speed: Option<u32>,
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
    #[serde(rename = "PartNumber")]
    part_number: Option<String>,
    #[serde(rename = "SerialNumber")]
    serial_number: Option<String>,
    #[serde(rename = "SMBIOSMemoryType")]
    smbios_type: Option<u16>,
    /// Rank count on SMBIOS 2.7+
    #[serde(rename = "Attributes")]
    attributes: Option<u32>,
}

pub fn get_ram_modules() -> Result<Vec<RamModule>> {
    let rows: Vec<PhysicalMemoryPs> = run_powershell_rows(
        "Get-CimInstance Win32_PhysicalMemory \
         | Select-Object BankLabel, DeviceLocator, Capacity, Speed, ConfiguredClockSpeed, \
           Manufacturer, PartNumber, SerialNumber, SMBIOSMemoryType, Attributes",
    )?;

    Ok(rows.into_iter().map(module_from_row).collect())
}

fn module_from_row(m: PhysicalMemoryPs) -> RamModule {
    let capacity = m.capacity.unwrap_or(0);
    RamModule {
        bank_label: clean_field(m.bank_label.as_deref())
            .or_else(|| clean_field(m.device_locator.as_deref()))
            .unwrap_or_else(|| "Slot".to_string()),
        capacity,
        speed: m.speed.unwrap_or(0),
        configured_speed: m.configured_speed.filter(|s| *s > 0),
        manufacturer: clean_field(m.manufacturer.as_deref()).unwrap_or_else(|| "Unknown".to_string()),
        part_number: clean_field(m.part_number.as_deref()).unwrap_or_default(),
        serial_number: clean_field(m.serial_number.as_deref()),
        module_size: module_size_label(capacity),
        memory_type: m.smbios_type.map(ddr_from_smbios),
        rank: m.attributes.filter(|a| *a > 0).map(rank_label),
    }
}
