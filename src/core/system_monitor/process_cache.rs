//! Per-process CPU baselines kept between polls.
//!
//! CPU percent is only meaningful between two observations of the same
//! process. The first sight of a pid arms an entry and reports zero; the
//! next poll computes usage from the CPU time consumed in between.

use std::collections::HashMap;
use std::time::Instant;

use super::metrics::ProcessInfo;

/// One live process as enumerated by the façade
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    /// Unix start time; a change means the pid was reused
    pub start_time: u64,
    /// Accumulated CPU time in milliseconds
    pub cpu_time_ms: u64,
    pub name: String,
    pub memory_percent: f32,
    pub status: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleState {
    /// Baseline recorded, no rate yet
    Armed,
    /// At least one rate has been computed
    Ready,
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    cpu_time_ms: u64,
    sampled_at: Instant,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    start_time: u64,
    baseline: Baseline,
    state: SampleState,
}

#[derive(Debug, Default)]
pub struct ProcessCache {
    entries: HashMap<u32, CacheEntry>,
}

impl ProcessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile with the live process list and return the top `limit`
    /// processes by CPU percent.
    ///
    /// `samples` order is kept for ties. After the call the cache holds
    /// exactly the pids in `samples`.
    pub fn poll(&mut self, samples: Vec<ProcessSample>, now: Instant, limit: usize) -> Vec<ProcessInfo> {
        let mut live = HashMap::with_capacity(samples.len());
        let mut results = Vec::with_capacity(samples.len());

        for sample in samples {
            let baseline = Baseline {
                cpu_time_ms: sample.cpu_time_ms,
                sampled_at: now,
            };

            let (cpu_percent, state) = match self.entries.remove(&sample.pid) {
                Some(entry) if entry.start_time == sample.start_time => {
                    (cpu_percent(&entry.baseline, &baseline), SampleState::Ready)
                }
                // New pid, or a reused one
                _ => (0.0, SampleState::Armed),
            };

            live.insert(
                sample.pid,
                CacheEntry {
                    start_time: sample.start_time,
                    baseline,
                    state,
                },
            );

            results.push(ProcessInfo {
                pid: sample.pid,
                name: sample.name,
                cpu_percent,
                memory_percent: sample.memory_percent,
                status: sample.status,
                username: sample.username,
                create_time: sample.start_time,
            });
        }

        // Whatever was not seen this poll is gone
        self.entries = live;

        results.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);
        results
    }

    pub fn state(&self, pid: u32) -> Option<SampleState> {
        self.entries.get(&pid).map(|e| e.state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// CPU time consumed over wall time, per-core scale (can exceed 100)
fn cpu_percent(previous: &Baseline, current: &Baseline) -> f32 {
    let wall_ms = current
        .sampled_at
        .saturating_duration_since(previous.sampled_at)
        .as_secs_f64()
        * 1000.0;
    if wall_ms <= 0.0 {
        return 0.0;
    }

    let cpu_ms = current.cpu_time_ms.saturating_sub(previous.cpu_time_ms) as f64;
    (cpu_ms / wall_ms * 100.0) as f32
}
