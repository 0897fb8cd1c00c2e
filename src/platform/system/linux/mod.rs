//! Linux data sources: procfs, sysfs and a few command-line tools.

pub mod connections;
pub mod cpu;
pub mod gpu;
pub mod mbo;
pub mod procfs;
pub mod ram;
pub mod services;
