use std::fs;
use std::path::Path;

use crate::core::system_info::motherboard::{clean_field, field_or_unknown};
use crate::core::system_info::types::MotherboardInfo;
use crate::error::{Result, VantaError};

const DMI_ROOT: &str = "/sys/class/dmi/id";

pub fn get_motherboard_info() -> Result<Option<MotherboardInfo>> {
    let root = Path::new(DMI_ROOT);
    if !root.is_dir() {
        return Err(VantaError::probe(format!("{} is not available", DMI_ROOT)));
    }
    Ok(read_dmi(root))
}

/// Board and BIOS from a DMI sysfs directory. `None` when the board itself
/// is not described.
pub fn read_dmi(root: &Path) -> Option<MotherboardInfo> {
    // board_serial is root-only; unreadable files count as missing
    let read = |name: &str| fs::read_to_string(root.join(name)).ok();

    let manufacturer = clean_field(read("board_vendor").as_deref());
    let product = clean_field(read("board_name").as_deref());
    if manufacturer.is_none() && product.is_none() {
        return None;
    }

    Some(MotherboardInfo {
        manufacturer: manufacturer.unwrap_or_else(|| "Unknown".to_string()),
        product: product.unwrap_or_else(|| "Unknown".to_string()),
        serial: field_or_unknown(read("board_serial").as_deref()),
        version: clean_field(read("board_version").as_deref()),
        bios_vendor: clean_field(read("bios_vendor").as_deref()),
        bios_version: field_or_unknown(read("bios_version").as_deref()),
        bios_date: clean_field(read("bios_date").as_deref()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_dmi() {
        let dir = TempDir::new().unwrap();
        let write = |name: &str, value: &str| fs::write(dir.path().join(name), value).unwrap();
        write("board_vendor", "Micro-Star International Co., Ltd.\n");
        write("board_name", "MAG B650 TOMAHAWK WIFI (MS-7D75)\n");
        write("board_version", "1.0\n");
        write("bios_vendor", "American Megatrends International, LLC.\n");
        write("bios_version", "1.A0\n");
        write("bios_date", "07/18/2024\n");

        let board = read_dmi(dir.path()).unwrap();
        assert_eq!(board.manufacturer, "Micro-Star International Co., Ltd.");
        assert_eq!(board.product, "MAG B650 TOMAHAWK WIFI (MS-7D75)");
        assert_eq!(board.serial, "Unknown");
        assert_eq!(board.version.as_deref(), Some("1.0"));
        assert_eq!(board.bios_version, "1.A0");
        assert_eq!(board.bios_date, "07/18/2024");
    }

    #[test]
    fn test_read_dmi_placeholders_mean_absent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("board_vendor"), "Default string\n").unwrap();
        fs::write(dir.path().join("board_name"), "To be filled by O.E.M.\n").unwrap();
        assert!(read_dmi(dir.path()).is_none());
    }
}
