pub mod collector;
pub mod cpu;
pub mod gpu;
pub mod memory;
pub mod motherboard;
pub mod os;
pub mod scanner;
pub mod types;

pub use collector::{get_hardware_probe, PlatformProbe};
pub use scanner::{HardwareProbe, HardwareScanner, ProbeOutcome, SharedHardware};
pub use types::*;
