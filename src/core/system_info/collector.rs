use crate::core::system_info::scanner::{HardwareProbe, ProbeOutcome};
use crate::core::system_info::types::*;
use crate::core::system_info::{cpu, gpu, memory, motherboard};

/// Hardware probe backed by the host's management interfaces
#[derive(Debug, Default)]
pub struct PlatformProbe;

impl HardwareProbe for PlatformProbe {
    fn gpus(&self) -> ProbeOutcome<Vec<GpuInfo>> {
        gpu::collect().into()
    }

    fn motherboard(&self) -> ProbeOutcome<Option<MotherboardInfo>> {
        motherboard::collect().into()
    }

    fn cpu_specs(&self) -> ProbeOutcome<CpuSpecs> {
        cpu::collect_specs().into()
    }

    fn ram_modules(&self) -> ProbeOutcome<Vec<RamModule>> {
        memory::collect_modules().into()
    }
}

/// Probe used by the default collector
pub fn get_hardware_probe() -> Box<dyn HardwareProbe> {
    Box::new(PlatformProbe)
}
