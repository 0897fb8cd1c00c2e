use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crate::core::system_info::cpu::format_cache_size;
use crate::core::system_info::types::CpuSpecs;
use crate::error::{Result, VantaError};

const CPU_SYSFS: &str = "/sys/devices/system/cpu";

/// CPU specs from `/proc/cpuinfo` and sysfs
pub fn get_cpu_specs() -> Result<CpuSpecs> {
    let cpuinfo = fs::read_to_string("/proc/cpuinfo")
        .map_err(|e| VantaError::probe(format!("Failed to read /proc/cpuinfo: {}", e)))?;

    let mut specs = parse_cpuinfo(&cpuinfo);

    let caches = summarize_caches(&read_cache_entries(Path::new(CPU_SYSFS)));
    specs.l1_data_cache = caches.get(&(1, "Data".to_string())).map(|kb| format_cache_size(*kb));
    specs.l1_inst_cache = caches
        .get(&(1, "Instruction".to_string()))
        .map(|kb| format_cache_size(*kb));
    specs.l2_cache = caches.get(&(2, "Unified".to_string())).map(|kb| format_cache_size(*kb));
    specs.l3_cache = caches.get(&(3, "Unified".to_string())).map(|kb| format_cache_size(*kb));

    specs.max_clock_mhz =
        read_trimmed(&Path::new(CPU_SYSFS).join("cpu0/cpufreq/cpuinfo_max_freq"))
            .and_then(|khz| khz.parse::<f64>().ok())
            .map(|khz| khz / 1000.0);

    Ok(specs)
}

/// Identification fields from the first processor block, plus core counts
pub fn parse_cpuinfo(content: &str) -> CpuSpecs {
    let mut specs = CpuSpecs::default();
    let mut threads = 0usize;
    // (physical id, core id) pairs identify physical cores
    let mut cores = BTreeSet::new();
    let mut sockets = BTreeSet::new();
    let mut physical_id = String::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        let first_block = threads <= 1;

        match key {
            "processor" => threads += 1,
            "physical id" => {
                physical_id = value.to_string();
                sockets.insert(value.to_string());
            }
            "core id" => {
                cores.insert((physical_id.clone(), value.to_string()));
            }
            "vendor_id" if first_block => specs.vendor = non_empty(value),
            "model name" if first_block => specs.marketing_name = non_empty(value),
            "cpu family" if first_block => specs.family = hex(value),
            "model" if first_block => specs.model = hex(value),
            "stepping" if first_block => specs.stepping = non_empty(value),
            "microcode" if first_block => specs.microcode = non_empty(value),
            _ => {}
        }
    }

    specs.threads = threads;
    specs.cores = cores.len();
    if sockets.len() > 1 {
        specs.socket = Some(format!("{} sockets", sockets.len()));
    }
    specs
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Decimal cpuinfo value rendered in hex, matching the CPUID display
fn hex(value: &str) -> Option<String> {
    value.parse::<u32>().ok().map(|v| format!("{:X}", v))
}

/// One `cpuN/cache/indexM` directory
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub level: u8,
    pub cache_type: String,
    pub size_kb: u64,
    pub shared_cpu_list: String,
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn read_cache_entries(root: &Path) -> Vec<CacheEntry> {
    let Ok(cpus) = fs::read_dir(root) else {
        return vec![];
    };

    let mut entries = Vec::new();
    for cpu in cpus.flatten() {
        let name = cpu.file_name().to_string_lossy().to_string();
        let is_cpu_dir = name
            .strip_prefix("cpu")
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
        if !is_cpu_dir {
            continue;
        }

        let Ok(indexes) = fs::read_dir(cpu.path().join("cache")) else {
            continue;
        };
        for index in indexes.flatten() {
            let dir = index.path();
            let entry = (|| {
                Some(CacheEntry {
                    level: read_trimmed(&dir.join("level"))?.parse().ok()?,
                    cache_type: read_trimmed(&dir.join("type"))?,
                    size_kb: parse_size_kb(&read_trimmed(&dir.join("size"))?)?,
                    shared_cpu_list: read_trimmed(&dir.join("shared_cpu_list"))
                        .unwrap_or_default(),
                })
            })();
            if let Some(entry) = entry {
                entries.push(entry);
            }
        }
    }
    entries
}

/// "32K" / "8M" / "1024" -> KB
pub fn parse_size_kb(size: &str) -> Option<u64> {
    let size = size.trim();
    if let Some(kb) = size.strip_suffix('K') {
        kb.parse().ok()
    } else if let Some(mb) = size.strip_suffix('M') {
        mb.parse::<u64>().ok().map(|mb| mb * 1024)
    } else {
        size.parse::<u64>().ok().map(|bytes| bytes / 1024)
    }
}

/// Total KB per (level, type), counting each shared cache instance once
pub fn summarize_caches(entries: &[CacheEntry]) -> BTreeMap<(u8, String), u64> {
    let mut instances: HashMap<(u8, String, String), u64> = HashMap::new();
    for entry in entries {
        instances.insert(
            (entry.level, entry.cache_type.clone(), entry.shared_cpu_list.clone()),
            entry.size_kb,
        );
    }

    let mut totals = BTreeMap::new();
    for ((level, cache_type, _), size_kb) in instances {
        *totals.entry((level, cache_type)).or_insert(0) += size_kb;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPUINFO: &str = "\
processor\t: 0
vendor_id\t: AuthenticAMD
cpu family\t: 25
model\t\t: 97
model name\t: AMD Ryzen 7 7700X 8-Core Processor
stepping\t: 2
microcode\t: 0xa601206
physical id\t: 0
core id\t\t: 0

processor\t: 1
vendor_id\t: AuthenticAMD
cpu family\t: 25
model\t\t: 97
model name\t: AMD Ryzen 7 7700X 8-Core Processor
stepping\t: 2
physical id\t: 0
core id\t\t: 0

processor\t: 2
vendor_id\t: AuthenticAMD
model name\t: something else
physical id\t: 0
core id\t\t: 1
";

    #[test]
    fn test_parse_cpuinfo() {
        let specs = parse_cpuinfo(CPUINFO);
        assert_eq!(specs.vendor.as_deref(), Some("AuthenticAMD"));
        assert_eq!(
            specs.marketing_name.as_deref(),
            Some("AMD Ryzen 7 7700X 8-Core Processor")
        );
        assert_eq!(specs.family.as_deref(), Some("19"));
        assert_eq!(specs.model.as_deref(), Some("61"));
        assert_eq!(specs.stepping.as_deref(), Some("2"));
        assert_eq!(specs.microcode.as_deref(), Some("0xa601206"));
        assert_eq!(specs.threads, 3);
        assert_eq!(specs.cores, 2);
        assert!(specs.socket.is_none());
    }

    #[test]
    fn test_parse_size_kb() {
        assert_eq!(parse_size_kb("32K"), Some(32));
        assert_eq!(parse_size_kb("8M"), Some(8192));
        assert_eq!(parse_size_kb("65536"), Some(64));
        assert_eq!(parse_size_kb("big"), None);
    }

    #[test]
    fn test_summarize_caches_dedupes_shared_instances() {
        let entry = |level, ty: &str, kb, shared: &str| CacheEntry {
            level,
            cache_type: ty.to_string(),
            size_kb: kb,
            shared_cpu_list: shared.to_string(),
        };
        let entries = vec![
            entry(1, "Data", 32, "0,8"),
            entry(1, "Data", 32, "0,8"), // seen again from cpu8
            entry(1, "Data", 32, "1,9"),
            entry(2, "Unified", 1024, "0,8"),
            entry(2, "Unified", 1024, "1,9"),
            entry(3, "Unified", 32768, "0-15"),
            entry(3, "Unified", 32768, "0-15"),
        ];

        let totals = summarize_caches(&entries);
        assert_eq!(totals[&(1, "Data".to_string())], 64);
        assert_eq!(totals[&(2, "Unified".to_string())], 2048);
        assert_eq!(totals[&(3, "Unified".to_string())], 32768);
    }
}
