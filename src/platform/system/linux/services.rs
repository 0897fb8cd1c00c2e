use std::collections::HashMap;

use log::debug;

use crate::core::system_monitor::metrics::ServiceInfo;
use crate::error::Result;
use crate::platform::command::{command_exists, run_command};

/// systemd services; empty when systemctl is not installed
pub fn get_services() -> Result<Vec<ServiceInfo>> {
    if !command_exists("systemctl") {
        return Ok(vec![]);
    }

    let units = run_command(
        "systemctl",
        &[
            "list-units",
            "--type=service",
            "--all",
            "--no-legend",
            "--no-pager",
            "--plain",
        ],
    )?;
    let unit_files = run_command(
        "systemctl",
        &["list-unit-files", "--type=service", "--no-legend", "--no-pager"],
    )
    .unwrap_or_default();

    let rows = parse_list_units(&units);
    let mut services = join_units(&rows, &parse_unit_files(&unit_files));

    let mut args = vec!["show", "--no-pager", "-p", "Id,MainPID,User"];
    args.extend(rows.iter().map(|row| row.unit.as_str()));
    match run_command("systemctl", &args) {
        Ok(output) => apply_main_processes(&mut services, &parse_show(&output)),
        Err(e) => debug!("Service owners unavailable: {}", e),
    }

    Ok(services)
}

/// Main process of a unit as reported by `systemctl show`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitProcess {
    pub main_pid: Option<u32>,
    pub user: Option<String>,
}

/// Blank-line separated `Key=Value` blocks -> unit id -> main process
pub fn parse_show(output: &str) -> HashMap<String, UnitProcess> {
    let mut units = HashMap::new();
    for block in output.split("\n\n") {
        let mut id = None;
        let mut process = UnitProcess::default();
        for (key, value) in block.lines().filter_map(|line| line.split_once('=')) {
            match key.trim() {
                "Id" => id = Some(value.trim().to_string()),
                "MainPID" => process.main_pid = value.trim().parse().ok().filter(|pid| *pid > 0),
                "User" if !value.trim().is_empty() => {
                    process.user = Some(value.trim().to_string())
                }
                _ => {}
            }
        }
        if let Some(id) = id {
            units.insert(id, process);
        }
    }
    units
}

/// Running units without `User=` belong to the system manager, i.e. root
pub fn apply_main_processes(services: &mut [ServiceInfo], units: &HashMap<String, UnitProcess>) {
    for service in services.iter_mut() {
        let Some(unit) = units.get(&service.name) else {
            continue;
        };
        service.pid = unit.main_pid;
        service.username = match (&unit.user, unit.main_pid) {
            (Some(user), _) => Some(user.clone()),
            (None, Some(_)) => Some("root".to_string()),
            (None, None) => None,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitRow {
    pub unit: String,
    pub active: String,
    pub sub: String,
    pub description: String,
}

/// `UNIT LOAD ACTIVE SUB DESCRIPTION...`
pub fn parse_list_units(output: &str) -> Vec<UnitRow> {
    output
        .lines()
        .filter_map(|line| {
            // Failed units carry a leading marker even in some --plain outputs
            let line = line.trim().trim_start_matches('●').trim_start();
            let mut fields = line.split_whitespace();
            let unit = fields.next()?;
            let _load = fields.next()?;
            let active = fields.next()?;
            let sub = fields.next()?;
            let description = fields.collect::<Vec<_>>().join(" ");
            Some(UnitRow {
                unit: unit.to_string(),
                active: active.to_string(),
                sub: sub.to_string(),
                description,
            })
        })
        .collect()
}

/// `UNIT STATE [PRESET]` -> unit -> state
pub fn parse_unit_files(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            Some((fields.next()?.to_string(), fields.next()?.to_string()))
        })
        .collect()
}

pub fn join_units(units: &[UnitRow], unit_files: &HashMap<String, String>) -> Vec<ServiceInfo> {
    units
        .iter()
        .map(|row| ServiceInfo {
            name: row.unit.clone(),
            display_name: row
                .unit
                .strip_suffix(".service")
                .unwrap_or(&row.unit)
                .to_string(),
            status: row.sub.clone(),
            start_type: unit_files
                .get(&row.unit)
                .or_else(|| unit_files.get(&template_name(&row.unit)?))
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            pid: None,
            username: None,
            description: if row.description.is_empty() {
                None
            } else {
                Some(row.description.clone())
            },
        })
        .collect()
}

/// "getty@tty1.service" -> "getty@.service"
fn template_name(unit: &str) -> Option<String> {
    let (prefix, rest) = unit.split_once('@')?;
    let suffix = rest.rsplit_once('.').map(|(_, ext)| ext)?;
    Some(format!("{}@.{}", prefix, suffix))
}
