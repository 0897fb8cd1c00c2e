use crate::core::system_info::types::MotherboardInfo;
use crate::error::Result;

#[cfg(windows)]
use crate::platform::system::windows::mbo::get_motherboard_info;

#[cfg(target_os = "linux")]
use crate::platform::system::linux::mbo::get_motherboard_info;

/// Board and BIOS descriptors. `Ok(None)` when the firmware reports nothing.
pub fn collect() -> Result<Option<MotherboardInfo>> {
    #[cfg(any(windows, target_os = "linux"))]
    {
        get_motherboard_info()
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Err(crate::error::VantaError::unsupported(
            "motherboard query is not available on this platform",
        ))
    }
}

/// OEM placeholder strings that mean "not set"
const PLACEHOLDERS: &[&str] = &[
    "to be filled by o.e.m.",
    "default string",
    "not applicable",
    "not specified",
    "system product name",
    "none",
    "n/a",
];

/// Trimmed value, or `None` for empty and placeholder strings
pub fn clean_field(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || PLACEHOLDERS.contains(&value.to_ascii_lowercase().as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Like [`clean_field`] but falls back to "Unknown"
pub fn field_or_unknown(value: Option<&str>) -> String {
    clean_field(value).unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field(Some("  ASUSTeK  ")), Some("ASUSTeK".to_string()));
        assert_eq!(clean_field(Some("To be filled by O.E.M.")), None);
        assert_eq!(clean_field(Some("Default string")), None);
        assert_eq!(clean_field(Some("")), None);
        assert_eq!(clean_field(None), None);
    }

    #[test]
    fn test_field_or_unknown() {
        assert_eq!(field_or_unknown(Some("   ")), "Unknown");
        assert_eq!(field_or_unknown(Some("B650 AORUS")), "B650 AORUS");
    }
}
