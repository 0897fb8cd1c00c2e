// Platform-specific code module

pub mod command;
#[cfg(feature = "nvml")]
pub mod nvidia_nvml;
pub mod system;
