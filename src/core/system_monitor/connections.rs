use std::collections::HashMap;

use super::metrics::NetConnection;
use crate::error::Result;

#[cfg(windows)]
use crate::platform::system::windows::connections::get_connections;

#[cfg(target_os = "linux")]
use crate::platform::system::linux::connections::get_connections;

/// Raw socket table of the host, process names not yet resolved
pub fn fetch() -> Result<Vec<NetConnection>> {
    #[cfg(any(windows, target_os = "linux"))]
    {
        get_connections()
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Err(crate::error::VantaError::unsupported(
            "socket table is not available on this platform",
        ))
    }
}

/// Stable sort by status, truncate, then fill in process names.
///
/// `resolve` runs at most once per distinct pid; pids it cannot name are
/// shown as "?".
pub fn finalize(
    mut connections: Vec<NetConnection>,
    limit: usize,
    mut resolve: impl FnMut(u32) -> Option<String>,
) -> Vec<NetConnection> {
    connections.sort_by(|a, b| a.status.cmp(&b.status));
    connections.truncate(limit);

    let mut names: HashMap<u32, String> = HashMap::new();
    for conn in &mut connections {
        if let Some(pid) = conn.pid {
            let name = names
                .entry(pid)
                .or_insert_with(|| resolve(pid).unwrap_or_else(|| "?".to_string()));
            conn.process_name = Some(name.clone());
        }
    }

    connections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(status: &str, pid: Option<u32>, laddr: &str) -> NetConnection {
        NetConnection {
            fd: -1,
            family: "IPv4".to_string(),
            kind: "TCP".to_string(),
            laddr: laddr.to_string(),
            raddr: String::new(),
            status: status.to_string(),
            pid,
            process_name: None,
        }
    }

    #[test]
    fn test_sorted_by_status_and_stable() {
        let out = finalize(
            vec![
                conn("LISTEN", Some(1), "a"),
                conn("ESTABLISHED", Some(2), "b"),
                conn("LISTEN", Some(3), "c"),
                conn("ESTABLISHED", None, "d"),
            ],
            10,
            |_| None,
        );
        let order: Vec<_> = out.iter().map(|c| c.laddr.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_names_resolved_once_per_pid() {
        let mut calls = Vec::new();
        let out = finalize(
            vec![
                conn("LISTEN", Some(7), "a"),
                conn("LISTEN", Some(7), "b"),
                conn("LISTEN", Some(9), "c"),
                conn("LISTEN", None, "d"),
            ],
            10,
            |pid| {
                calls.push(pid);
                (pid == 7).then(|| "sshd".to_string())
            },
        );

        assert_eq!(calls, vec![7, 9]);
        assert_eq!(out[0].process_name.as_deref(), Some("sshd"));
        assert_eq!(out[1].process_name.as_deref(), Some("sshd"));
        assert_eq!(out[2].process_name.as_deref(), Some("?"));
        assert_eq!(out[3].process_name, None);
    }

    #[test]
    fn test_limit() {
        let rows = vec![conn("LISTEN", None, "a"), conn("LISTEN", None, "b")];
        assert!(finalize(rows.clone(), 0, |_| None).is_empty());
        assert_eq!(finalize(rows, 1, |_| None).len(), 1);
    }
}
