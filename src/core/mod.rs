// Core business logic module

pub mod config;
pub mod system_info;
pub mod system_monitor;

// Re-export commonly used items
pub use config::Config;
pub use system_info::{HardwareProfile, SharedHardware};
pub use system_monitor::{CollectorConfig, MetricsCollector};
