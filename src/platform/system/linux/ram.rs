use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::system_info::memory::{ddr_from_name, module_size_label, rank_label};
use crate::core::system_info::motherboard::clean_field;
use crate::core::system_info::types::RamModule;
use crate::error::Result;
use crate::platform::command::run_command;

static SIZE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*(kB|KB|MB|GB|TB)$").ok());
static SPEED_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\d+)\s*(MT/s|MHz)").ok());

/// Installed modules from `dmidecode -t memory` (needs root)
pub fn get_ram_modules() -> Result<Vec<RamModule>> {
    let output = run_command("dmidecode", &["-t", "memory"])?;
    Ok(parse_dmidecode_memory(&output))
}

/// Parse "Memory Device" blocks; empty slots are skipped
pub fn parse_dmidecode_memory(output: &str) -> Vec<RamModule> {
    output
        .split("\n\n")
        .filter(|block| block.lines().any(|l| l.trim() == "Memory Device"))
        .filter_map(parse_device_block)
        .collect()
}

fn parse_device_block(block: &str) -> Option<RamModule> {
    let field = |key: &str| {
        block.lines().find_map(|line| {
            let (k, v) = line.trim().split_once(':')?;
            (k.trim() == key).then(|| v.trim())
        })
    };

    let capacity = parse_size_bytes(field("Size")?)?;
    if capacity == 0 {
        return None;
    }

    let bank_label = clean_field(field("Bank Locator"))
        .or_else(|| clean_field(field("Locator")))
        .unwrap_or_else(|| "Slot".to_string());

    Some(RamModule {
        bank_label,
        capacity,
        speed: field("Speed").and_then(parse_speed).unwrap_or(0),
        configured_speed: field("Configured Memory Speed")
            .or_else(|| field("Configured Clock Speed"))
            .and_then(parse_speed),
        manufacturer: clean_field(field("Manufacturer")).unwrap_or_else(|| "Unknown".to_string()),
        part_number: clean_field(field("Part Number")).unwrap_or_default(),
        serial_number: clean_field(field("Serial Number")),
        module_size: module_size_label(capacity),
        memory_type: field("Type").map(ddr_from_name),
        rank: field("Rank").map(|r| {
            r.parse::<u32>()
                .map(rank_label)
                .unwrap_or_else(|_| r.to_string())
        }),
    })
}

/// "16 GB" -> bytes; "No Module Installed" -> None
fn parse_size_bytes(size: &str) -> Option<u64> {
    let caps = SIZE_RE.as_ref()?.captures(size.trim())?;
    let value: u64 = caps[1].parse().ok()?;
    let shift = match &caps[2] {
        "kB" | "KB" => 10,
        "MB" => 20,
        "GB" => 30,
        _ => 40,
    };
    Some(value << shift)
}

fn parse_speed(speed: &str) -> Option<u32> {
    let caps = SPEED_RE.as_ref()?.captures(speed.trim())?;
    caps[1].parse().ok()
}
