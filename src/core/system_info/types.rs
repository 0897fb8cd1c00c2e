use serde::{Deserialize, Serialize};

/// Whether the one-shot hardware scan has published yet
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    #[default]
    Pending,
    Complete,
}

/// Slow-to-query hardware descriptors, published once by the scanner
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HardwareProfile {
    pub status: ScanStatus,
    pub gpus: Vec<GpuInfo>,
    pub motherboard: Option<MotherboardInfo>,
    pub cpu_specs: CpuSpecs,
    pub ram_modules: Vec<RamModule>,
    /// Probes that fell back to their default, with the reason
    pub degraded: Vec<ProbeFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeFailure {
    pub probe: String,
    pub reason: String,
}

/// GPU Information
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GpuInfo {
    pub name: String,
    pub vendor: GpuVendor,
    pub driver_version: String,
    /// Dedicated memory in bytes, 0 when unknown
    pub memory_total: u64,
    pub temperature: Option<f32>,
    pub video_mode: Option<String>,
    pub driver_date: Option<String>,
    pub pci_slot: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    #[default]
    Unknown,
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuVendor::Nvidia => write!(f, "NVIDIA"),
            GpuVendor::Amd => write!(f, "AMD"),
            GpuVendor::Intel => write!(f, "Intel"),
            GpuVendor::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Motherboard Information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotherboardInfo {
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub version: Option<String>, // Board revision (e.g., "Rev 1.0")
    pub bios_vendor: Option<String>,
    pub bios_version: String,
    pub bios_date: String,
}

/// Where a clock figure came from.
///
/// Bus speed, multiplier and rated FSB are heuristics built on whatever clock
/// fields the platform reports; they are not authoritative hardware facts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstimateBasis {
    /// Value reported directly by the platform
    Reported,
    /// Computed from other values, at least one of which was reported
    Derived,
    /// Fallback constant, nothing was reported
    Assumed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub basis: EstimateBasis,
}

impl Estimate {
    pub fn reported(value: f64) -> Self {
        Self {
            value,
            basis: EstimateBasis::Reported,
        }
    }

    pub fn derived(value: f64) -> Self {
        Self {
            value,
            basis: EstimateBasis::Derived,
        }
    }

    pub fn assumed(value: f64) -> Self {
        Self {
            value,
            basis: EstimateBasis::Assumed,
        }
    }
}

/// Extended CPU descriptors, every field best-effort
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CpuSpecs {
    pub marketing_name: Option<String>,
    pub vendor: Option<String>,

    // Cache information, formatted as "512 KB" / "32 MB"
    pub l1_data_cache: Option<String>,
    pub l1_inst_cache: Option<String>,
    pub l2_cache: Option<String>,
    pub l3_cache: Option<String>,

    pub socket: Option<String>,
    pub family: Option<String>,
    pub model: Option<String>,
    pub stepping: Option<String>,
    pub ext_family: Option<String>,
    pub ext_model: Option<String>,
    pub revision: Option<String>,
    pub microcode: Option<String>,

    pub cores: usize,
    pub threads: usize,

    // Clocks
    pub max_clock_mhz: Option<f64>,
    pub bus_speed: Option<Estimate>,
    pub multiplier: Option<Estimate>,
    pub rated_fsb: Option<Estimate>,

    /// Comma separated instruction set extensions
    pub instructions: Option<String>,
}

/// One installed memory module
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RamModule {
    pub bank_label: String,
    pub capacity: u64,
    /// Rated speed in MT/s, 0 when unknown
    pub speed: u32,
    pub configured_speed: Option<u32>,
    pub manufacturer: String,
    pub part_number: String,
    pub serial_number: Option<String>,
    pub module_size: Option<String>,
    pub memory_type: Option<DdrType>,
    pub rank: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DdrType {
    DDR,
    DDR2,
    DDR3,
    DDR4,
    DDR5,
    LPDDR4,
    LPDDR5,
    Unknown,
}

impl std::fmt::Display for DdrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DdrType::DDR => write!(f, "DDR"),
            DdrType::DDR2 => write!(f, "DDR2"),
            DdrType::DDR3 => write!(f, "DDR3"),
            DdrType::DDR4 => write!(f, "DDR4"),
            DdrType::DDR5 => write!(f, "DDR5"),
            DdrType::LPDDR4 => write!(f, "LPDDR4"),
            DdrType::LPDDR5 => write!(f, "LPDDR5"),
            DdrType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Host identity plus the published hardware fields.
///
/// `gpu`, `motherboard` and `cpu_marketing_name` stay empty until the
/// background scan completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemStaticInfo {
    pub hostname: String,
    pub os_name: String,
    pub os_release: String,
    pub os_version: String,
    pub os_edition: String,
    pub machine_type: String,
    pub processor: String,
    pub cpu_marketing_name: Option<String>,
    pub boot_time: u64,
    pub uptime_seconds: u64,
    pub gpu: Vec<GpuInfo>,
    pub motherboard: Option<MotherboardInfo>,
    pub hardware_scan: ScanStatus,
}
