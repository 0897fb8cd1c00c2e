use crate::core::system_info::types::{DdrType, RamModule};
use crate::error::Result;

#[cfg(windows)]
use crate::platform::system::windows::ram::get_ram_modules;

#[cfg(target_os = "linux")]
use crate::platform::system::linux::ram::get_ram_modules;

pub fn collect_modules() -> Result<Vec<RamModule>> {
    #[cfg(any(windows, target_os = "linux"))]
    {
        get_ram_modules()
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Err(crate::error::VantaError::unsupported(
            "memory module query is not available on this platform",
        ))
    }
}

/// SMBIOS type 17 "Memory Type" code
pub fn ddr_from_smbios(code: u16) -> DdrType {
    match code {
        18 => DdrType::DDR,
        19 => DdrType::DDR2,
        24 => DdrType::DDR3,
        26 => DdrType::DDR4,
        30 => DdrType::LPDDR4,
        34 => DdrType::DDR5,
        35 => DdrType::LPDDR5,
        _ => DdrType::Unknown,
    }
}

/// Memory type as printed by dmidecode ("DDR4", "LPDDR5", ...)
pub fn ddr_from_name(name: &str) -> DdrType {
    match name.trim().to_ascii_uppercase().as_str() {
        "DDR" => DdrType::DDR,
        "DDR2" => DdrType::DDR2,
        "DDR3" => DdrType::DDR3,
        "DDR4" => DdrType::DDR4,
        "DDR5" => DdrType::DDR5,
        "LPDDR4" | "LPDDR4X" => DdrType::LPDDR4,
        "LPDDR5" | "LPDDR5X" => DdrType::LPDDR5,
        _ => DdrType::Unknown,
    }
}

/// "16 GBytes" style label for a module capacity in bytes
pub fn module_size_label(bytes: u64) -> Option<String> {
    if bytes == 0 {
        return None;
    }
    let gib = bytes as f64 / (1u64 << 30) as f64;
    if gib >= 1.0 {
        Some(format!("{} GBytes", gib.round() as u64))
    } else {
        Some(format!("{} MBytes", bytes >> 20))
    }
}

/// Rank count as a label ("Single", "Dual", ...)
pub fn rank_label(ranks: u32) -> String {
    match ranks {
        1 => "Single".to_string(),
        2 => "Dual".to_string(),
        4 => "Quad".to_string(),
        8 => "Octal".to_string(),
        n => format!("{}-rank", n),
    }
}

/// Memory type of the first module that reports a known one
pub fn memory_type(modules: &[RamModule]) -> Option<DdrType> {
    modules
        .iter()
        .filter_map(|m| m.memory_type)
        .find(|t| *t != DdrType::Unknown)
}

/// Effective DRAM frequency in MHz (half the MT/s transfer rate).
///
/// Uses the configured speed when reported, the rated speed otherwise.
pub fn dram_frequency(modules: &[RamModule]) -> Option<f64> {
    modules
        .iter()
        .map(|m| m.configured_speed.filter(|s| *s > 0).unwrap_or(m.speed))
        .find(|speed| *speed > 0)
        .map(|mts| mts as f64 / 2.0)
}
