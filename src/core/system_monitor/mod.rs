//! Stateful metrics sampling.
//!
//! [`MetricsCollector`] is the façade: it turns cumulative OS counters into
//! rates, keeps per-process CPU baselines between polls and merges in the
//! hardware profile published by the background scanner.

mod collector;
pub mod connections;
pub mod counters;
pub mod limits;
pub mod metrics;
pub mod network;
pub mod process_cache;
pub mod sensors;
pub mod services;

pub use collector::{CollectorConfig, MetricsCollector};
pub use counters::{CounterSnapshot, CounterStore, CounterTotals, DiskTotals, NetTotals};
pub use metrics::*;
pub use process_cache::{ProcessCache, ProcessSample, SampleState};
