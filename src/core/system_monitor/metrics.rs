use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::system_info::{Estimate, RamModule, ScanStatus};

/// CPU usage merged with the published CPU specs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CpuInfo {
    pub usage_percent: f32,
    pub per_core_usage: Vec<f32>,
    /// Current frequency of the first core in MHz
    pub frequency_current: Option<f64>,
    pub count_physical: usize,
    pub count_logical: usize,
    pub temperature: Option<f32>,
    pub load_average: (f64, f64, f64), // 1, 5, 15 min

    // Kernel counters since boot (Linux only)
    pub ctx_switches: Option<u64>,
    pub interrupts: Option<u64>,
    pub soft_interrupts: Option<u64>,
    pub syscalls: Option<u64>,

    pub marketing_name: Option<String>,
    pub vendor: Option<String>,
    pub socket: Option<String>,
    pub family: String,
    pub model: String,
    pub stepping: String,
    pub ext_family: String,
    pub ext_model: String,
    pub revision: String,
    pub microcode: Option<String>,
    pub instructions: Option<String>,

    pub l1_data_cache: Option<String>,
    pub l1_inst_cache: Option<String>,
    /// L1 sizes are `cores * 32 KB` placeholders, not measured values
    pub l1_approximate: bool,
    pub l2_cache: Option<String>,
    pub l3_cache: Option<String>,

    pub core_speed: Option<f64>,
    pub max_clock: Option<f64>,
    pub bus_speed: Option<Estimate>,
    pub multiplier: Option<Estimate>,
    pub rated_fsb: Option<Estimate>,

    pub cores: usize,
    pub threads: usize,
    pub hardware_scan: ScanStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub percent: f32,
    pub swap_total: u64,
    pub swap_used: u64,
    pub pagefile_total: Option<u64>,
    pub pagefile_used: Option<u64>,
    pub modules: Vec<RamModule>,
    #[serde(rename = "type")]
    pub memory_type: Option<String>,
    /// Effective DRAM clock in MHz
    pub dram_frequency: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskInfo {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f32,
    pub device: String,
}

impl DiskInfo {
    pub fn unknown() -> Self {
        Self {
            total: 0,
            used: 0,
            free: 0,
            percent: 0.0,
            device: "Unknown".to_string(),
        }
    }
}

/// Global network totals with per-second rates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkRate {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub upload_speed: f64,
    pub download_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub status: String,
    pub username: Option<String>,
    /// Unix timestamp (seconds)
    pub create_time: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskPartition {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f32,
    pub opts: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiskIOStats {
    pub read_count: u64,
    pub write_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_speed: f64,
    pub write_speed: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiskDetailed {
    pub partitions: Vec<DiskPartition>,
    pub io_stats: BTreeMap<String, DiskIOStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetInterface {
    pub name: String,
    pub is_up: bool,
    pub duplex: String,
    /// Link speed in Mbit/s, 0 when unknown
    pub speed: u64,
    pub mtu: u64,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub netmask: Option<String>,
    pub broadcast: Option<String>,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkDetailed {
    pub interfaces: Vec<NetInterface>,
    pub global_rate: NetworkRate,
    pub dns_servers: Vec<String>,
    /// Interface name -> default gateway address
    pub gateways: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetConnection {
    /// Descriptor number in the owning process, -1 when unknown
    pub fd: i64,
    pub family: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub laddr: String,
    pub raddr: String,
    pub status: String,
    pub pid: Option<u32>,
    pub process_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDetail {
    pub pid: u32,
    pub name: String,
    pub cmdline: Vec<String>,
    pub cwd: String,
    pub username: String,
    pub status: String,
    pub create_time: u64,
    /// "rss" and "vms" in bytes
    pub memory_info: BTreeMap<String, u64>,
    pub num_threads: Option<usize>,
    pub num_fds: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
    pub display_name: String,
    pub status: String,
    pub start_type: String,
    pub pid: Option<u32>,
    pub username: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    pub label: String,
    pub current: f32,
    pub high: Option<f32>,
    pub critical: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FanReading {
    pub label: String,
    /// RPM
    pub current: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatteryInfo {
    pub percent: f32,
    /// Seconds until empty, `None` while charging or unknown
    pub secsleft: Option<u64>,
    pub power_plugged: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorMetrics {
    /// Chip name -> readings
    pub temperatures: BTreeMap<String, Vec<SensorReading>>,
    pub fans: BTreeMap<String, Vec<FanReading>>,
    pub battery: Option<BatteryInfo>,
}
