//! Readers for `/proc` and `/sys` counters the cross-platform layer lacks.
//!
//! Every reader has a pure parser next to it so the formats can be tested
//! without a Linux host.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::core::system_monitor::counters::DiskTotals;
use crate::core::system_monitor::metrics::FanReading;

const SECTOR_SIZE: u64 = 512;

// ============================================================================
// Disk I/O
// ============================================================================

/// Per physical device I/O totals
pub fn read_disk_totals() -> Option<BTreeMap<String, DiskTotals>> {
    let content = fs::read_to_string("/proc/diskstats").ok()?;
    let devices = block_devices(Path::new("/sys/block"));
    Some(parse_diskstats(&content, |name| devices.contains(name)))
}

/// Names under /sys/block, without loop and ram devices
fn block_devices(root: &Path) -> BTreeSet<String> {
    let Ok(entries) = fs::read_dir(root) else {
        return BTreeSet::new();
    };
    entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with("loop") && !name.starts_with("ram"))
        .collect()
}

pub fn parse_diskstats(
    content: &str,
    keep: impl Fn(&str) -> bool,
) -> BTreeMap<String, DiskTotals> {
    let mut totals = BTreeMap::new();

    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let name = fields[2];
        if !keep(name) {
            continue;
        }

        let num = |i: usize| fields[i].parse::<u64>().unwrap_or(0);
        totals.insert(
            name.to_string(),
            DiskTotals {
                read_count: num(3),
                read_bytes: num(5) * SECTOR_SIZE,
                write_count: num(7),
                write_bytes: num(9) * SECTOR_SIZE,
            },
        );
    }

    totals
}

// ============================================================================
// Kernel counters
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelCounters {
    pub ctx_switches: Option<u64>,
    pub interrupts: Option<u64>,
    pub soft_interrupts: Option<u64>,
}

pub fn read_kernel_counters() -> KernelCounters {
    fs::read_to_string("/proc/stat")
        .map(|content| parse_proc_stat(&content))
        .unwrap_or_default()
}

pub fn parse_proc_stat(content: &str) -> KernelCounters {
    let mut counters = KernelCounters::default();

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let key = fields.next();
        let total = fields.next().and_then(|v| v.parse::<u64>().ok());
        match key {
            Some("ctxt") => counters.ctx_switches = total,
            Some("intr") => counters.interrupts = total,
            Some("softirq") => counters.soft_interrupts = total,
            _ => {}
        }
    }

    counters
}

// ============================================================================
// Mounts
// ============================================================================

/// Mount point -> options string
pub fn read_mount_options() -> HashMap<String, String> {
    fs::read_to_string("/proc/mounts")
        .map(|content| parse_mounts(&content))
        .unwrap_or_default()
}

pub fn parse_mounts(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            Some((unescape_mount_path(fields[1]), fields[3].to_string()))
        })
        .collect()
}

/// Undo the octal escapes /proc/mounts uses for spaces and tabs
fn unescape_mount_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 4])
                .ok()
                .and_then(|octal| u8::from_str_radix(octal, 8).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

// ============================================================================
// Network
// ============================================================================

pub fn read_dns_servers() -> Vec<String> {
    fs::read_to_string("/etc/resolv.conf")
        .map(|content| parse_resolv_conf(&content))
        .unwrap_or_default()
}

pub fn parse_resolv_conf(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => Some(addr.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Interface -> default gateway
pub fn read_default_gateways() -> BTreeMap<String, String> {
    fs::read_to_string("/proc/net/route")
        .map(|content| parse_route(&content))
        .unwrap_or_default()
}

pub fn parse_route(content: &str) -> BTreeMap<String, String> {
    let mut gateways = BTreeMap::new();

    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[1] != "00000000" {
            continue;
        }
        // Addresses are little-endian hex
        if let Ok(raw) = u32::from_str_radix(fields[2], 16) {
            let gateway = Ipv4Addr::from(raw.to_le_bytes());
            gateways
                .entry(fields[0].to_string())
                .or_insert_with(|| gateway.to_string());
        }
    }

    gateways
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkInfo {
    pub is_up: bool,
    /// Mbit/s, 0 when unknown
    pub speed: u64,
    pub duplex: String,
}

pub fn read_link_info(iface: &str) -> LinkInfo {
    let dir = Path::new("/sys/class/net").join(iface);
    let read = |name: &str| fs::read_to_string(dir.join(name)).ok();

    LinkInfo {
        is_up: read("flags").map(|f| parse_flags_up(&f)).unwrap_or(false),
        speed: read("speed").map(|s| parse_link_speed(&s)).unwrap_or(0),
        duplex: read("duplex")
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

/// IFF_UP bit of the hex interface flags ("0x1003")
pub fn parse_flags_up(flags: &str) -> bool {
    let flags = flags.trim().trim_start_matches("0x");
    u32::from_str_radix(flags, 16)
        .map(|f| f & 0x1 != 0)
        .unwrap_or(false)
}

/// Negative or unreadable speeds (no carrier) are 0
pub fn parse_link_speed(speed: &str) -> u64 {
    speed.trim().parse::<i64>().map(|s| s.max(0) as u64).unwrap_or(0)
}

// ============================================================================
// Fans
// ============================================================================

/// hwmon chip name -> fan readings
pub fn read_fans() -> BTreeMap<String, Vec<FanReading>> {
    let mut fans = BTreeMap::new();
    let Ok(chips) = fs::read_dir("/sys/class/hwmon") else {
        return fans;
    };

    for chip in chips.flatten() {
        let dir = chip.path();
        let chip_name = fs::read_to_string(dir.join("name"))
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|_| chip.file_name().to_string_lossy().to_string());

        let Ok(files) = fs::read_dir(&dir) else {
            continue;
        };
        let mut readings: Vec<FanReading> = files
            .flatten()
            .filter_map(|f| {
                let file = f.file_name().to_string_lossy().to_string();
                let index = file.strip_prefix("fan")?.strip_suffix("_input")?.to_string();
                let rpm = fs::read_to_string(f.path()).ok()?.trim().parse().ok()?;
                let label = fs::read_to_string(dir.join(format!("fan{}_label", index)))
                    .map(|l| l.trim().to_string())
                    .unwrap_or_else(|_| format!("fan{}", index));
                Some(FanReading {
                    label,
                    current: rpm,
                })
            })
            .collect();

        if !readings.is_empty() {
            readings.sort_by(|a, b| a.label.cmp(&b.label));
            fans.insert(chip_name, readings);
        }
    }

    fans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diskstats() {
        let content = "\
   8       0 sda 1200 30 48000 900 800 40 16000 700 0 1000 1600 0 0 0 0
   8       1 sda1 1000 20 40000 800 700 30 14000 600 0 900 1400 0 0 0 0
   7       0 loop0 10 0 20 1 0 0 0 0 0 1 1 0 0 0 0
 259       0 nvme0n1 50 0 800 10 20 0 400 5 0 10 15
";
        let keep = ["sda", "nvme0n1"];
        let totals = parse_diskstats(content, |name| keep.contains(&name));

        assert_eq!(totals.len(), 2);
        assert_eq!(
            totals["sda"],
            DiskTotals {
                read_count: 1200,
                read_bytes: 48000 * 512,
                write_count: 800,
                write_bytes: 16000 * 512,
            }
        );
        assert_eq!(totals["nvme0n1"].read_bytes, 800 * 512);
        assert!(!totals.contains_key("sda1"));
    }

    #[test]
    fn test_parse_proc_stat() {
        let content = "\
cpu  100 0 50 1000 0 0 0 0 0 0
cpu0 50 0 25 500 0 0 0 0 0 0
intr 987654 12 0 3
ctxt 123456
btime 1700000000
softirq 55555 1 2 3
";
        let counters = parse_proc_stat(content);
        assert_eq!(counters.ctx_switches, Some(123456));
        assert_eq!(counters.interrupts, Some(987654));
        assert_eq!(counters.soft_interrupts, Some(55555));
        assert_eq!(parse_proc_stat(""), KernelCounters::default());
    }

    #[test]
    fn test_parse_mounts() {
        let content = "\
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
/dev/sdb1 /media/usb\\040drive vfat rw,nosuid,nodev 0 0
";
        let opts = parse_mounts(content);
        assert_eq!(opts["/"], "rw,relatime");
        assert_eq!(opts["/media/usb drive"], "rw,nosuid,nodev");
    }

    #[test]
    fn test_parse_resolv_conf() {
        let content = "\
# Generated by NetworkManager
search lan
nameserver 192.168.1.1
nameserver fe80::1%eth0
; nameserver 10.0.0.1
options edns0
";
        assert_eq!(
            parse_resolv_conf(content),
            vec!["192.168.1.1".to_string(), "fe80::1%eth0".to_string()]
        );
    }

    #[test]
    fn test_parse_route() {
        let content = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
wlan0\t00000000\t0100000A\t0003\t0\t0\t600\t00000000\t0\t0\t0
";
        let gateways = parse_route(content);
        assert_eq!(gateways.len(), 2);
        assert_eq!(gateways["eth0"], "192.168.1.1");
        assert_eq!(gateways["wlan0"], "10.0.0.1");
    }

    #[test]
    fn test_link_parsers() {
        assert!(parse_flags_up("0x1003\n"));
        assert!(!parse_flags_up("0x1002"));
        assert!(!parse_flags_up("junk"));
        assert_eq!(parse_link_speed("1000\n"), 1000);
        assert_eq!(parse_link_speed("-1"), 0);
        assert_eq!(parse_link_speed(""), 0);
    }
}
