use serde::Deserialize;

use super::core::run_powershell_rows;
use crate::core::system_monitor::metrics::ServiceInfo;
use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServicePs {
    name: String,
    display_name: Option<String>,
    state: Option<String>,
    start_mode: Option<String>,
    process_id: Option<u32>,
    start_name: Option<String>,
    description: Option<String>,
}

pub fn get_services() -> Result<Vec<ServiceInfo>> {
    let rows: Vec<ServicePs> = run_powershell_rows(
        "Get-CimInstance Win32_Service \
         | Select-Object Name, DisplayName, State, StartMode, ProcessId, StartName, Description",
    )?;

    Ok(rows.into_iter().map(service_from_row).collect())
}

fn service_from_row(s: ServicePs) -> ServiceInfo {
    ServiceInfo {
        display_name: s.display_name.unwrap_or_else(|| s.name.clone()),
        name: s.name,
        status: s
            .state
            .map(|st| st.to_lowercase())
            .unwrap_or_else(|| "unknown".to_string()),
        start_type: start_type(s.start_mode.as_deref()),
        pid: s.process_id.filter(|pid| *pid != 0),
        username: s.start_name.filter(|n| !n.is_empty()),
        description: s.description.filter(|d| !d.is_empty()),
    }
}

fn start_type(mode: Option<&str>) -> String {
    match mode {
        Some("Auto") => "automatic".to_string(),
        Some("Manual") => "manual".to_string(),
        Some("Disabled") => "disabled".to_string(),
        Some(other) => other.to_lowercase(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::command::parse_json_rows;

    #[test]
    fn test_service_rows() {
        let rows: Vec<ServicePs> = parse_json_rows(
            r#"[{"Name":"Spooler","DisplayName":"Print Spooler","State":"Running","StartMode":"Auto","ProcessId":3120,"StartName":"LocalSystem","Description":"Queues print jobs"},
                {"Name":"Fax","DisplayName":null,"State":"Stopped","StartMode":"Manual","ProcessId":0,"StartName":"","Description":null}]"#,
        )
        .unwrap();
        let services: Vec<ServiceInfo> = rows.into_iter().map(service_from_row).collect();

        assert_eq!(services[0].status, "running");
        assert_eq!(services[0].start_type, "automatic");
        assert_eq!(services[0].pid, Some(3120));

        assert_eq!(services[1].display_name, "Fax");
        assert_eq!(services[1].start_type, "manual");
        assert_eq!(services[1].pid, None);
        assert_eq!(services[1].username, None);
    }
}
