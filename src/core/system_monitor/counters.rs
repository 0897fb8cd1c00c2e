//! Rate derivation from cumulative OS counters.
//!
//! A [`CounterStore`] keeps exactly one snapshot per counter family. Every
//! observation produces a rate against that snapshot and then replaces it,
//! so each read measures the interval since the previous read.

use std::collections::BTreeMap;
use std::time::Instant;

/// Cumulative totals that can be turned into a rate against an older reading
pub trait CounterTotals: Clone {
    type Rate;

    /// Rate from `previous` to `self` over `elapsed_secs` (always > 0)
    fn rate_since(&self, previous: &Self, elapsed_secs: f64) -> Self::Rate;
}

#[derive(Debug, Clone)]
pub struct CounterSnapshot<T> {
    pub taken_at: Instant,
    pub totals: T,
}

#[derive(Debug, Clone)]
pub struct CounterStore<T> {
    last: Option<CounterSnapshot<T>>,
}

impl<T> Default for CounterStore<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: CounterTotals> CounterStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, current: T) -> T::Rate {
        self.observe_at(current, Instant::now())
    }

    /// Rate against the stored snapshot, then overwrite it with `current`
    pub fn observe_at(&mut self, current: T, now: Instant) -> T::Rate {
        let rate = match &self.last {
            Some(previous) => {
                current.rate_since(&previous.totals, elapsed_secs(previous.taken_at, now))
            }
            // First reading is its own baseline
            None => current.rate_since(&current, 1.0),
        };

        self.last = Some(CounterSnapshot {
            taken_at: now,
            totals: current,
        });

        rate
    }

    pub fn last(&self) -> Option<&CounterSnapshot<T>> {
        self.last.as_ref()
    }
}

fn elapsed_secs(since: Instant, now: Instant) -> f64 {
    let elapsed = now.saturating_duration_since(since).as_secs_f64();
    if elapsed <= 0.0 {
        1.0
    } else {
        elapsed
    }
}

/// Signed per-second delta. Counter resets come out negative.
fn per_sec(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    (current as f64 - previous as f64) / elapsed_secs
}

/// Keyed totals: keys missing from the current reading are dropped,
/// new keys get a zero first rate.
impl<T: CounterTotals> CounterTotals for BTreeMap<String, T> {
    type Rate = BTreeMap<String, T::Rate>;

    fn rate_since(&self, previous: &Self, elapsed_secs: f64) -> Self::Rate {
        self.iter()
            .map(|(key, current)| {
                let rate = match previous.get(key) {
                    Some(prev) => current.rate_since(prev, elapsed_secs),
                    None => current.rate_since(current, 1.0),
                };
                (key.clone(), rate)
            })
            .collect()
    }
}

// ============================================================================
// Network
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetTotals {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRates {
    pub upload_speed: f64,
    pub download_speed: f64,
}

impl CounterTotals for NetTotals {
    type Rate = NetRates;

    fn rate_since(&self, previous: &Self, elapsed_secs: f64) -> NetRates {
        NetRates {
            upload_speed: per_sec(self.bytes_sent, previous.bytes_sent, elapsed_secs),
            download_speed: per_sec(self.bytes_recv, previous.bytes_recv, elapsed_secs),
        }
    }
}

// ============================================================================
// Disk
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskTotals {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskRates {
    pub read_speed: f64,
    pub write_speed: f64,
}

impl CounterTotals for DiskTotals {
    type Rate = DiskRates;

    fn rate_since(&self, previous: &Self, elapsed_secs: f64) -> DiskRates {
        DiskRates {
            read_speed: per_sec(self.read_bytes, previous.read_bytes, elapsed_secs),
            write_speed: per_sec(self.write_bytes, previous.write_bytes, elapsed_secs),
        }
    }
}

pub type DiskCounterStore = CounterStore<BTreeMap<String, DiskTotals>>;
pub type NetCounterStore = CounterStore<NetTotals>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn net(sent: u64, recv: u64) -> NetTotals {
        NetTotals {
            bytes_sent: sent,
            bytes_recv: recv,
            ..Default::default()
        }
    }

    fn disk(read: u64, write: u64) -> DiskTotals {
        DiskTotals {
            read_bytes: read,
            write_bytes: write,
            ..Default::default()
        }
    }

    fn disks(entries: &[(&str, DiskTotals)]) -> BTreeMap<String, DiskTotals> {
        entries
            .iter()
            .map(|(name, totals)| (name.to_string(), *totals))
            .collect()
    }

    #[test]
    fn test_first_observe_is_zero() {
        let mut store = NetCounterStore::new();
        let rate = store.observe(net(5_000, 9_000));
        assert_eq!(rate, NetRates::default());
        assert_eq!(store.last().unwrap().totals, net(5_000, 9_000));
    }

    #[test]
    fn test_consecutive_observes_use_previous_baseline() {
        let mut store = NetCounterStore::new();
        let t0 = Instant::now();
        store.observe_at(net(1_000, 2_000), t0);

        let rate = store.observe_at(net(3_000, 6_000), t0 + Duration::from_secs(2));
        assert_eq!(rate.upload_speed, 1_000.0);
        assert_eq!(rate.download_speed, 2_000.0);

        // Third call measures against the second reading only
        let rate = store.observe_at(net(3_500, 6_000), t0 + Duration::from_secs(3));
        assert_eq!(rate.upload_speed, 500.0);
        assert_eq!(rate.download_speed, 0.0);
    }

    #[test]
    fn test_zero_elapsed_counts_as_one_second() {
        let mut store = NetCounterStore::new();
        let t0 = Instant::now();
        store.observe_at(net(0, 0), t0);
        let rate = store.observe_at(net(750, 0), t0);
        assert_eq!(rate.upload_speed, 750.0);
    }

    #[test]
    fn test_counter_reset_gives_negative_rate() {
        let mut store = NetCounterStore::new();
        let t0 = Instant::now();
        store.observe_at(net(10_000, 0), t0);
        let rate = store.observe_at(net(4_000, 0), t0 + Duration::from_secs(1));
        assert_eq!(rate.upload_speed, -6_000.0);
    }

    #[test]
    fn test_per_disk_rates() {
        let mut store = DiskCounterStore::new();
        let t0 = Instant::now();
        store.observe_at(disks(&[("sda", disk(0, 0)), ("sdb", disk(100, 100))]), t0);

        let rates = store.observe_at(
            disks(&[("sda", disk(4_096, 2_048)), ("sdb", disk(100, 100))]),
            t0 + Duration::from_secs(2),
        );
        assert_eq!(rates["sda"].read_speed, 2_048.0);
        assert_eq!(rates["sda"].write_speed, 1_024.0);
        assert_eq!(rates["sdb"], DiskRates::default());
    }

    #[test]
    fn test_vanished_disk_is_dropped_and_new_disk_starts_at_zero() {
        let mut store = DiskCounterStore::new();
        let t0 = Instant::now();
        store.observe_at(disks(&[("sda", disk(0, 0)), ("sdb", disk(0, 0))]), t0);

        let rates = store.observe_at(
            disks(&[("sda", disk(10, 10)), ("sdc", disk(9_999, 9_999))]),
            t0 + Duration::from_secs(1),
        );
        assert!(!rates.contains_key("sdb"));
        assert_eq!(rates["sdc"], DiskRates::default());

        // sdb stays gone from the stored snapshot too
        let stored = &store.last().unwrap().totals;
        assert!(!stored.contains_key("sdb"));
        assert_eq!(stored.len(), 2);
    }
}
