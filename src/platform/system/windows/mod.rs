// Windows hardware and system queries

pub mod connections;
pub mod core;
pub mod cpu;
pub mod gpu;
pub mod mbo;
pub mod ram;
pub mod services;
