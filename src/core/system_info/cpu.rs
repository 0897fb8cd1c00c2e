use crate::core::system_info::types::{CpuSpecs, Estimate};
use crate::error::Result;

#[cfg(windows)]
use crate::platform::system::windows::cpu::get_cpu_specs;

#[cfg(target_os = "linux")]
use crate::platform::system::linux::cpu::get_cpu_specs;

/// Bus clock assumed when the platform reports none (MHz)
pub const ASSUMED_BUS_SPEED_MHZ: f64 = 100.0;
/// FSB multiplier used for the "rated FSB" figure of quad-pumped buses
const FSB_PUMP_FACTOR: f64 = 4.0;

/// Collect extended CPU specs: platform query first, CPUID fills the gaps
pub fn collect_specs() -> Result<CpuSpecs> {
    #[cfg(any(windows, target_os = "linux"))]
    let platform = get_cpu_specs();

    #[cfg(not(any(windows, target_os = "linux")))]
    let platform: Result<CpuSpecs> = Err(crate::error::VantaError::unsupported(
        "no CPU descriptor query on this platform",
    ));

    let identity = cpuid_identity();

    let mut specs = match (platform, identity.is_some()) {
        (Ok(specs), _) => specs,
        // CPUID alone still gives a useful profile
        (Err(e), true) => {
            log::debug!("Platform CPU query failed, using CPUID only: {}", e);
            CpuSpecs::default()
        }
        (Err(e), false) => return Err(e),
    };

    if let Some(identity) = identity {
        identity.fill(&mut specs);
    }

    if specs.cores == 0 {
        specs.cores = sysinfo::System::physical_core_count().unwrap_or(0);
    }

    let (bus_speed, multiplier, rated_fsb) = estimate_clocks(specs.max_clock_mhz, None);
    specs.bus_speed = specs.bus_speed.or(bus_speed);
    specs.multiplier = specs.multiplier.or(multiplier);
    specs.rated_fsb = specs.rated_fsb.or(rated_fsb);

    Ok(specs)
}

/// Format a cache size in KB the way the dashboard shows it ("512 KB", "32 MB")
pub fn format_cache_size(kb: u64) -> String {
    if kb > 1024 {
        format!("{} MB", kb / 1024)
    } else {
        format!("{} KB", kb)
    }
}

/// Bus speed, multiplier and rated FSB from whatever clocks were reported.
///
/// `ext_clock_mhz` is the external (bus) clock. Without it the bus is assumed
/// to run at 100 MHz and everything built on it is labelled `Assumed`.
pub fn estimate_clocks(
    max_clock_mhz: Option<f64>,
    ext_clock_mhz: Option<f64>,
) -> (Option<Estimate>, Option<Estimate>, Option<Estimate>) {
    let ext_clock = ext_clock_mhz.filter(|mhz| *mhz > 0.0);

    let bus_speed = match ext_clock {
        Some(mhz) => Estimate::reported(mhz),
        None => Estimate::assumed(ASSUMED_BUS_SPEED_MHZ),
    };

    let multiplier = max_clock_mhz.filter(|mhz| *mhz > 0.0).map(|max| {
        let ratio = max / bus_speed.value;
        if ext_clock.is_some() {
            Estimate::derived(ratio)
        } else {
            Estimate::assumed(ratio)
        }
    });

    let rated_fsb = match ext_clock {
        Some(mhz) => Estimate::derived(mhz * FSB_PUMP_FACTOR),
        None => Estimate::assumed(ASSUMED_BUS_SPEED_MHZ * FSB_PUMP_FACTOR),
    };

    (Some(bus_speed), multiplier, Some(rated_fsb))
}

/// Instruction set extensions worth showing
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionFlags {
    pub mmx: bool,
    pub sse: bool,
    pub sse2: bool,
    pub sse3: bool,
    pub ssse3: bool,
    pub sse4_1: bool,
    pub sse4_2: bool,
    pub x86_64: bool,
    pub vt_x: bool,
    pub amd_v: bool,
    pub aes: bool,
    pub avx: bool,
    pub avx2: bool,
    pub avx512f: bool,
    pub fma3: bool,
    pub sha: bool,
}

/// Render flags as "MMX, SSE, SSE2, ..." in a fixed order
pub fn instruction_list(flags: &InstructionFlags) -> String {
    let named = [
        (flags.mmx, "MMX"),
        (flags.sse, "SSE"),
        (flags.sse2, "SSE2"),
        (flags.sse3, "SSE3"),
        (flags.ssse3, "SSSE3"),
        (flags.sse4_1, "SSE4.1"),
        (flags.sse4_2, "SSE4.2"),
        (flags.x86_64, "x86-64"),
        (flags.vt_x, "VT-x"),
        (flags.amd_v, "AMD-V"),
        (flags.aes, "AES"),
        (flags.avx, "AVX"),
        (flags.avx2, "AVX2"),
        (flags.avx512f, "AVX-512F"),
        (flags.fma3, "FMA3"),
        (flags.sha, "SHA"),
    ];

    named
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Identification read straight from the CPUID instruction
#[derive(Debug, Clone, Default)]
pub struct CpuidIdentity {
    pub vendor: Option<String>,
    pub brand: Option<String>,
    pub family: Option<u32>,
    pub model: Option<u32>,
    pub stepping: Option<u32>,
    pub ext_family: Option<u32>,
    pub ext_model: Option<u32>,
    pub l1_data_kb: Option<u64>,
    pub l1_inst_kb: Option<u64>,
    pub instructions: InstructionFlags,
}

impl CpuidIdentity {
    /// Fill fields the platform query left empty. Platform values win.
    pub fn fill(self, specs: &mut CpuSpecs) {
        let cores = specs.cores.max(1) as u64;
        let hex = |v: u32| format!("{:X}", v);

        specs.vendor = specs.vendor.take().or(self.vendor);
        specs.marketing_name = specs.marketing_name.take().or(self.brand);
        specs.family = specs.family.take().or(self.family.map(hex));
        specs.model = specs.model.take().or(self.model.map(hex));
        specs.stepping = specs.stepping.take().or(self.stepping.map(|s| s.to_string()));
        specs.ext_family = specs.ext_family.take().or(self.ext_family.map(hex));
        specs.ext_model = specs.ext_model.take().or(self.ext_model.map(hex));
        specs.l1_data_cache = specs
            .l1_data_cache
            .take()
            .or(self.l1_data_kb.map(|kb| format_cache_size(kb * cores)));
        specs.l1_inst_cache = specs
            .l1_inst_cache
            .take()
            .or(self.l1_inst_kb.map(|kb| format_cache_size(kb * cores)));

        if specs.instructions.is_none() {
            let list = instruction_list(&self.instructions);
            if !list.is_empty() {
                specs.instructions = Some(list);
            }
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn cpuid_identity() -> Option<CpuidIdentity> {
    use raw_cpuid::{CacheType, CpuId};

    let cpuid = CpuId::new();
    let mut identity = CpuidIdentity {
        vendor: cpuid.get_vendor_info().map(|v| v.as_str().to_string()),
        brand: cpuid
            .get_processor_brand_string()
            .map(|b| b.as_str().trim().to_string())
            .filter(|b| !b.is_empty()),
        ..Default::default()
    };

    if let Some(features) = cpuid.get_feature_info() {
        identity.family = Some(features.family_id() as u32);
        identity.model = Some(features.model_id() as u32);
        identity.stepping = Some(features.stepping_id() as u32);
        identity.ext_family = Some(features.extended_family_id() as u32);
        identity.ext_model = Some(features.extended_model_id() as u32);

        let flags = &mut identity.instructions;
        flags.mmx = features.has_mmx();
        flags.sse = features.has_sse();
        flags.sse2 = features.has_sse2();
        flags.sse3 = features.has_sse3();
        flags.ssse3 = features.has_ssse3();
        flags.sse4_1 = features.has_sse41();
        flags.sse4_2 = features.has_sse42();
        flags.vt_x = features.has_vmx();
        flags.aes = features.has_aesni();
        flags.avx = features.has_avx();
        flags.fma3 = features.has_fma();
    }

    if let Some(extended) = cpuid.get_extended_feature_info() {
        identity.instructions.avx2 = extended.has_avx2();
        identity.instructions.avx512f = extended.has_avx512f();
        identity.instructions.sha = extended.has_sha();
    }

    if let Some(ext) = cpuid.get_extended_processor_and_feature_identifiers() {
        identity.instructions.x86_64 = ext.has_64bit_mode();
        identity.instructions.amd_v = ext.has_svm();
    }

    if let Some(caches) = cpuid.get_cache_parameters() {
        for cache in caches.filter(|c| c.level() == 1) {
            let bytes = cache.associativity()
                * cache.physical_line_partitions()
                * cache.coherency_line_size()
                * cache.sets();
            let kb = (bytes / 1024) as u64;
            match cache.cache_type() {
                CacheType::Data => identity.l1_data_kb = Some(kb),
                CacheType::Instruction => identity.l1_inst_kb = Some(kb),
                _ => {}
            }
        }
    }

    Some(identity)
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub fn cpuid_identity() -> Option<CpuidIdentity> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::system_info::types::EstimateBasis;

    #[test]
    fn test_format_cache_size() {
        assert_eq!(format_cache_size(512), "512 KB");
        assert_eq!(format_cache_size(1024), "1024 KB");
        assert_eq!(format_cache_size(32768), "32 MB");
    }

    #[test]
    fn test_estimates_with_reported_bus() {
        let (bus, mult, fsb) = estimate_clocks(Some(4500.0), Some(100.0));
        assert_eq!(bus, Some(Estimate::reported(100.0)));
        assert_eq!(mult, Some(Estimate::derived(45.0)));
        assert_eq!(fsb, Some(Estimate::derived(400.0)));
    }

    #[test]
    fn test_estimates_without_bus_are_assumed() {
        let (bus, mult, fsb) = estimate_clocks(Some(3600.0), None);
        assert_eq!(bus.unwrap().basis, EstimateBasis::Assumed);
        assert_eq!(bus.unwrap().value, ASSUMED_BUS_SPEED_MHZ);
        assert_eq!(mult, Some(Estimate::assumed(36.0)));
        assert_eq!(fsb, Some(Estimate::assumed(400.0)));

        // Zero ext clock is the same as missing
        let (bus, _, _) = estimate_clocks(None, Some(0.0));
        assert_eq!(bus.unwrap().basis, EstimateBasis::Assumed);
    }

    #[test]
    fn test_no_multiplier_without_max_clock() {
        let (_, mult, _) = estimate_clocks(None, Some(100.0));
        assert!(mult.is_none());
    }

    #[test]
    fn test_instruction_list_order() {
        let flags = InstructionFlags {
            sse2: true,
            mmx: true,
            avx2: true,
            x86_64: true,
            ..Default::default()
        };
        assert_eq!(instruction_list(&flags), "MMX, SSE2, x86-64, AVX2");
        assert_eq!(instruction_list(&InstructionFlags::default()), "");
    }

    #[test]
    fn test_identity_fill_keeps_platform_values() {
        let mut specs = CpuSpecs {
            marketing_name: Some("From WMI".to_string()),
            cores: 4,
            ..Default::default()
        };

        CpuidIdentity {
            brand: Some("From CPUID".to_string()),
            family: Some(0x19),
            stepping: Some(2),
            l1_data_kb: Some(32),
            ..Default::default()
        }
        .fill(&mut specs);

        assert_eq!(specs.marketing_name.as_deref(), Some("From WMI"));
        assert_eq!(specs.family.as_deref(), Some("19"));
        assert_eq!(specs.stepping.as_deref(), Some("2"));
        assert_eq!(specs.l1_data_cache.as_deref(), Some("128 KB"));
        assert!(specs.instructions.is_none());
    }
}
