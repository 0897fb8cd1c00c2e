use sysinfo::System;

/// First build number of Windows 11 (it still reports major version 10)
const WINDOWS_11_FIRST_BUILD: u32 = 22000;

/// Host identity captured once when the collector is created
#[derive(Debug, Clone, PartialEq)]
pub struct HostIdentity {
    pub hostname: String,
    pub os_name: String,
    pub os_release: String,
    pub os_version: String,
    pub os_edition: String,
    pub machine_type: String,
    pub processor: String,
    pub boot_time: u64,
}

pub fn collect(processor: &str) -> HostIdentity {
    let unknown = || "Unknown".to_string();
    let kernel = System::kernel_version();
    let long_name = System::long_os_version();

    let os_name = if cfg!(windows) {
        kernel
            .as_deref()
            .and_then(parse_windows_build)
            .map(windows_product_name)
            .unwrap_or_else(|| "Windows".to_string())
    } else {
        System::name().unwrap_or_else(unknown)
    };

    let os_edition = if cfg!(windows) {
        long_name
            .as_deref()
            .and_then(windows_edition)
            .unwrap_or_else(unknown)
    } else {
        unknown()
    };

    HostIdentity {
        hostname: System::host_name().unwrap_or_else(unknown),
        os_name,
        os_release: kernel.unwrap_or_else(unknown),
        os_version: System::os_version().unwrap_or_else(unknown),
        os_edition,
        machine_type: std::env::consts::ARCH.to_string(),
        processor: if processor.trim().is_empty() {
            unknown()
        } else {
            processor.trim().to_string()
        },
        boot_time: System::boot_time(),
    }
}

/// Seconds since boot, recomputed from the stored boot time
pub fn uptime_since(boot_time: u64) -> u64 {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    now.saturating_sub(boot_time)
}

/// "10.0.22631" or "22631" -> 22631
fn parse_windows_build(kernel: &str) -> Option<u32> {
    kernel.trim().rsplit('.').next()?.parse().ok()
}

pub fn windows_product_name(build: u32) -> String {
    if build >= WINDOWS_11_FIRST_BUILD {
        "Windows 11".to_string()
    } else {
        "Windows 10".to_string()
    }
}

/// "Windows 11 Pro" -> "Pro"
fn windows_edition(long_name: &str) -> Option<String> {
    let rest = long_name.trim().strip_prefix("Windows")?.trim_start();
    let edition = rest
        .split_once(' ')
        .map(|(_, edition)| edition.trim())
        .unwrap_or("");
    if edition.is_empty() {
        None
    } else {
        Some(edition.to_string())
    }
}
