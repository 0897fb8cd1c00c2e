//! Temperatures, fans and battery.
//!
//! Only readings the host actually reports are returned; a machine without
//! sensors yields empty maps and no battery.

use std::collections::BTreeMap;

use log::debug;
use sysinfo::Components;

use super::metrics::{BatteryInfo, FanReading, SensorReading};

/// hwmon chips that report the CPU package temperature
const CPU_CHIPS: &[&str] = &["coretemp", "k10temp", "zenpower", "cpu_thermal", "cpu"];

pub fn temperatures(components: &Components) -> BTreeMap<String, Vec<SensorReading>> {
    group_by_chip(components.iter().filter_map(|c| {
        Some((
            c.label().to_string(),
            c.temperature()?,
            c.max(),
            c.critical(),
        ))
    }))
}

/// Group `(label, current, high, critical)` rows by chip.
///
/// Component labels look like "coretemp Package id 0" or "nvme Composite":
/// the first word names the chip, the rest names the sensor.
pub fn group_by_chip(
    rows: impl Iterator<Item = (String, f32, Option<f32>, Option<f32>)>,
) -> BTreeMap<String, Vec<SensorReading>> {
    let mut grouped: BTreeMap<String, Vec<SensorReading>> = BTreeMap::new();

    for (label, current, high, critical) in rows {
        if !current.is_finite() {
            continue;
        }
        let label = label.trim();
        let (chip, sensor) = match label.split_once(' ') {
            Some((chip, sensor)) => (chip, sensor.trim()),
            None => (label, ""),
        };
        let chip = if chip.is_empty() { "unknown" } else { chip };

        grouped
            .entry(chip.to_string())
            .or_default()
            .push(SensorReading {
                label: if sensor.is_empty() {
                    chip.to_string()
                } else {
                    sensor.to_string()
                },
                current,
                high: high.filter(|h| h.is_finite() && *h > 0.0),
                critical: critical.filter(|c| c.is_finite() && *c > 0.0),
            });
    }

    grouped
}

/// First reading of a known CPU chip, if any
pub fn cpu_temperature(temperatures: &BTreeMap<String, Vec<SensorReading>>) -> Option<f32> {
    CPU_CHIPS
        .iter()
        .find_map(|chip| temperatures.get(*chip)?.first())
        .map(|r| r.current)
}

/// hwmon fans grouped by chip (Linux only)
#[cfg(target_os = "linux")]
pub fn fans() -> BTreeMap<String, Vec<FanReading>> {
    crate::platform::system::linux::procfs::read_fans()
}

#[cfg(not(target_os = "linux"))]
pub fn fans() -> BTreeMap<String, Vec<FanReading>> {
    BTreeMap::new()
}

/// First battery reported by the OS
pub fn battery() -> Option<BatteryInfo> {
    let manager = battery::Manager::new()
        .map_err(|e| debug!("Battery manager unavailable: {}", e))
        .ok()?;
    let first = manager
        .batteries()
        .map_err(|e| debug!("Battery enumeration failed: {}", e))
        .ok()?
        .flatten()
        .next()?;

    let state = first.state();
    Some(BatteryInfo {
        percent: (first.state_of_charge().value * 100.0).clamp(0.0, 100.0),
        secsleft: match state {
            battery::State::Discharging => first
                .time_to_empty()
                .map(|t| t.value)
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(|secs| secs as u64),
            _ => None,
        },
        power_plugged: power_plugged(state),
    })
}

fn power_plugged(state: battery::State) -> Option<bool> {
    match state {
        battery::State::Charging | battery::State::Full => Some(true),
        battery::State::Discharging | battery::State::Empty => Some(false),
        _ => None,
    }
}
