use serde::Deserialize;

use super::core::run_powershell_rows;
use crate::core::system_info::motherboard::{clean_field, field_or_unknown};
use crate::core::system_info::types::MotherboardInfo;
use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BaseBoardPs {
    manufacturer: Option<String>,
    product: Option<String>,
    serial_number: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BiosPs {
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
    #[serde(rename = "SMBIOSBIOSVersion")]
    version: Option<String>,
    #[serde(rename = "ReleaseDate")]
    release_date: Option<String>,
}

/// Board from `Win32_BaseBoard`, BIOS from `Win32_BIOS`
pub fn get_motherboard_info() -> Result<Option<MotherboardInfo>> {
    let boards: Vec<BaseBoardPs> = run_powershell_rows(
        "Get-CimInstance Win32_BaseBoard \
         | Select-Object Manufacturer, Product, SerialNumber, Version",
    )?;
    let Some(board) = boards.into_iter().next() else {
        return Ok(None);
    };

    // A missing BIOS row still leaves a usable board description
    let bios = run_powershell_rows::<BiosPs>(
        "Get-CimInstance Win32_BIOS \
         | Select-Object Manufacturer, SMBIOSBIOSVersion, \
           @{n='ReleaseDate';e={ if ($_.ReleaseDate) { $_.ReleaseDate.ToString('yyyy-MM-dd') } }}",
    )
    .unwrap_or_else(|e| {
        log::debug!("Win32_BIOS query failed: {}", e);
        vec![]
    })
    .into_iter()
    .next();

    Ok(Some(MotherboardInfo {
        manufacturer: field_or_unknown(board.manufacturer.as_deref()),
        product: field_or_unknown(board.product.as_deref()),
        serial: field_or_unknown(board.serial_number.as_deref()),
        version: clean_field(board.version.as_deref()),
        bios_vendor: bios.as_ref().and_then(|b| clean_field(b.manufacturer.as_deref())),
        bios_version: field_or_unknown(bios.as_ref().and_then(|b| b.version.as_deref())),
        bios_date: bios.and_then(|b| b.release_date).unwrap_or_default(),
    }))
}
