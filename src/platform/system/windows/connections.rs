use serde::Deserialize;

use super::core::run_powershell_rows;
use crate::core::system_monitor::metrics::NetConnection;
use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TcpConnectionPs {
    local_address: String,
    local_port: u16,
    remote_address: Option<String>,
    remote_port: Option<u16>,
    state: Option<String>,
    owning_process: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UdpEndpointPs {
    local_address: String,
    local_port: u16,
    owning_process: Option<u32>,
}

/// TCP connections and UDP endpoints from the NetTCPIP module.
///
/// Windows does not expose socket descriptors, so `fd` is always -1.
pub fn get_connections() -> Result<Vec<NetConnection>> {
    let tcp: Vec<TcpConnectionPs> = run_powershell_rows(
        "Get-NetTCPConnection \
         | Select-Object LocalAddress, LocalPort, RemoteAddress, RemotePort, \
           @{n='State';e={ $_.State.ToString() }}, OwningProcess",
    )?;
    let udp: Vec<UdpEndpointPs> = run_powershell_rows(
        "Get-NetUDPEndpoint | Select-Object LocalAddress, LocalPort, OwningProcess",
    )
    .unwrap_or_else(|e| {
        log::debug!("Get-NetUDPEndpoint failed: {}", e);
        vec![]
    });

    let mut connections: Vec<NetConnection> = tcp.into_iter().map(from_tcp).collect();
    connections.extend(udp.into_iter().map(from_udp));
    Ok(connections)
}

fn from_tcp(row: TcpConnectionPs) -> NetConnection {
    let raddr = match (row.remote_address.as_deref(), row.remote_port) {
        (Some(addr), Some(port)) if !is_unspecified(addr) || port != 0 => endpoint(addr, port),
        _ => String::new(),
    };
    NetConnection {
        fd: -1,
        family: family(&row.local_address).to_string(),
        kind: "TCP".to_string(),
        laddr: endpoint(&row.local_address, row.local_port),
        raddr,
        status: row
            .state
            .as_deref()
            .map(tcp_state)
            .unwrap_or_else(|| "NONE".to_string()),
        pid: row.owning_process,
        process_name: None,
    }
}

fn from_udp(row: UdpEndpointPs) -> NetConnection {
    NetConnection {
        fd: -1,
        family: family(&row.local_address).to_string(),
        kind: "UDP".to_string(),
        laddr: endpoint(&row.local_address, row.local_port),
        raddr: String::new(),
        status: "NONE".to_string(),
        pid: row.owning_process,
        process_name: None,
    }
}

fn family(addr: &str) -> &'static str {
    if addr.contains(':') {
        "IPv6"
    } else {
        "IPv4"
    }
}

fn is_unspecified(addr: &str) -> bool {
    matches!(addr, "0.0.0.0" | "::")
}

fn endpoint(addr: &str, port: u16) -> String {
    format!("{}:{}", addr, port)
}

/// "TimeWait" -> "TIME_WAIT", "Listen" -> "LISTEN"
fn tcp_state(state: &str) -> String {
    let mut out = String::with_capacity(state.len() + 2);
    for (i, ch) in state.chars().enumerate() {
        if i > 0 && ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}
