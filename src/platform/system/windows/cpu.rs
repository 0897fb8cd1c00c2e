use serde::Deserialize;
use wmi::WMIConnection;

use crate::core::system_info::cpu::{estimate_clocks, format_cache_size};
use crate::core::system_info::types::CpuSpecs;
use crate::error::{Result, VantaError};

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_Processor")]
#[serde(rename_all = "PascalCase")]
struct Win32Processor {
    name: Option<String>,
    manufacturer: Option<String>,
    l2_cache_size: Option<u32>, // KB
    l3_cache_size: Option<u32>, // KB
    socket_designation: Option<String>,
    stepping: Option<String>,
    number_of_cores: Option<u32>,
    number_of_logical_processors: Option<u32>,
    max_clock_speed: Option<u32>,
    ext_clock: Option<u32>,
    revision: Option<u16>,
    level: Option<u16>,
    version: Option<String>,
}

/// CPU specs from WMI `Win32_Processor`
pub fn get_cpu_specs() -> Result<CpuSpecs> {
    let wmi_con = WMIConnection::new()
        .map_err(|e| VantaError::probe(format!("Failed to connect to WMI: {}", e)))?;

    let processors: Vec<Win32Processor> = wmi_con
        .query()
        .map_err(|e| VantaError::probe(format!("WMI query failed: {}", e)))?;

    let processor = processors
        .into_iter()
        .next()
        .ok_or_else(|| VantaError::probe("Win32_Processor returned no rows"))?;

    Ok(specs_from_processor(processor))
}

fn specs_from_processor(p: Win32Processor) -> CpuSpecs {
    let max_clock = p.max_clock_speed.filter(|mhz| *mhz > 0).map(f64::from);
    let (bus_speed, multiplier, rated_fsb) =
        estimate_clocks(max_clock, p.ext_clock.map(f64::from));
    let text = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    CpuSpecs {
        marketing_name: text(p.name),
        vendor: text(p.manufacturer),
        l2_cache: p.l2_cache_size.filter(|kb| *kb > 0).map(|kb| format_cache_size(kb as u64)),
        l3_cache: p.l3_cache_size.filter(|kb| *kb > 0).map(|kb| format_cache_size(kb as u64)),
        socket: text(p.socket_designation),
        // WMI "Level" tracks the CPU family
        family: p.level.map(|l| format!("{:X}", l)),
        stepping: text(p.stepping),
        revision: p.revision.map(|r| format!("{:04X}", r)),
        model: text(p.version),
        cores: p.number_of_cores.unwrap_or(0) as usize,
        threads: p.number_of_logical_processors.unwrap_or(0) as usize,
        max_clock_mhz: max_clock,
        bus_speed,
        multiplier,
        rated_fsb,
        ..Default::default()
    }
}
