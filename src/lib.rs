// VantaSys Library - Public API

// Re-export error types
pub mod error;
pub use error::{Result, VantaError};

// Module declarations
pub mod core;
pub mod platform;

// Re-export commonly used types
pub use core::config::Config;
pub use core::system_monitor::{CollectorConfig, MetricsCollector};

// Initialize logging
pub fn init_logging(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
