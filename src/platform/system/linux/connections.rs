use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::core::system_monitor::metrics::NetConnection;
use crate::error::{Result, VantaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Tcp,
    Udp,
}

/// One row of /proc/net/{tcp,tcp6,udp,udp6}
#[derive(Debug, Clone, PartialEq)]
pub struct SocketEntry {
    pub kind: SocketKind,
    pub local: (IpAddr, u16),
    pub remote: (IpAddr, u16),
    pub status: String,
    pub inode: u64,
}

const TABLES: &[(&str, SocketKind)] = &[
    ("/proc/net/tcp", SocketKind::Tcp),
    ("/proc/net/tcp6", SocketKind::Tcp),
    ("/proc/net/udp", SocketKind::Udp),
    ("/proc/net/udp6", SocketKind::Udp),
];

/// Internet sockets with owning pid and descriptor when visible
pub fn get_connections() -> Result<Vec<NetConnection>> {
    let mut entries = Vec::new();
    let mut read_any = false;

    for (path, kind) in TABLES {
        match fs::read_to_string(path) {
            Ok(content) => {
                read_any = true;
                entries.extend(parse_socket_table(&content, *kind));
            }
            // tcp6/udp6 are missing when IPv6 is disabled
            Err(e) => log::debug!("Skipping {}: {}", path, e),
        }
    }

    if !read_any {
        return Err(VantaError::metric_collection("no /proc/net socket tables"));
    }

    let owners = socket_owners();
    Ok(entries
        .into_iter()
        .map(|entry| {
            let owner = owners.get(&entry.inode).copied();
            to_connection(entry, owner)
        })
        .collect())
}

fn to_connection(entry: SocketEntry, owner: Option<(u32, i64)>) -> NetConnection {
    let family = match entry.local.0 {
        IpAddr::V4(_) => "IPv4",
        IpAddr::V6(_) => "IPv6",
    };
    let kind = match entry.kind {
        SocketKind::Tcp => "TCP",
        SocketKind::Udp => "UDP",
    };

    NetConnection {
        fd: owner.map(|(_, fd)| fd).unwrap_or(-1),
        family: family.to_string(),
        kind: kind.to_string(),
        laddr: format_endpoint(entry.local),
        raddr: if entry.remote.0.is_unspecified() && entry.remote.1 == 0 {
            String::new()
        } else {
            format_endpoint(entry.remote)
        },
        status: entry.status,
        pid: owner.map(|(pid, _)| pid),
        process_name: None,
    }
}

fn format_endpoint((ip, port): (IpAddr, u16)) -> String {
    format!("{}:{}", ip, port)
}

pub fn parse_socket_table(content: &str, kind: SocketKind) -> Vec<SocketEntry> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 {
                return None;
            }
            let status = match kind {
                SocketKind::Tcp => tcp_state(fields[3]).to_string(),
                SocketKind::Udp => "NONE".to_string(),
            };
            Some(SocketEntry {
                kind,
                local: parse_endpoint(fields[1])?,
                remote: parse_endpoint(fields[2])?,
                status,
                inode: fields[9].parse().ok()?,
            })
        })
        .collect()
}

/// "0100007F:0277" -> 127.0.0.1:631. Addresses are stored as host-order
/// 32-bit words, the port is big-endian.
pub fn parse_endpoint(field: &str) -> Option<(IpAddr, u16)> {
    let (addr, port) = field.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;

    let ip = match addr.len() {
        8 => IpAddr::V4(Ipv4Addr::from(
            u32::from_str_radix(addr, 16).ok()?.to_le_bytes(),
        )),
        32 => {
            let mut bytes = [0u8; 16];
            for (i, chunk) in bytes.chunks_mut(4).enumerate() {
                let word = u32::from_str_radix(&addr[i * 8..i * 8 + 8], 16).ok()?;
                chunk.copy_from_slice(&word.to_le_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(bytes))
        }
        _ => return None,
    };

    Some((ip, port))
}

pub fn tcp_state(code: &str) -> &'static str {
    match code {
        "01" => "ESTABLISHED",
        "02" => "SYN_SENT",
        "03" => "SYN_RECV",
        "04" => "FIN_WAIT1",
        "05" => "FIN_WAIT2",
        "06" => "TIME_WAIT",
        "07" => "CLOSE",
        "08" => "CLOSE_WAIT",
        "09" => "LAST_ACK",
        "0A" => "LISTEN",
        "0B" => "CLOSING",
        "0C" => "NEW_SYN_RECV",
        _ => "NONE",
    }
}

/// Socket inode -> (pid, fd), from every readable /proc/<pid>/fd
fn socket_owners() -> HashMap<u64, (u32, i64)> {
    let mut owners = HashMap::new();
    let Ok(procs) = fs::read_dir("/proc") else {
        return owners;
    };

    for proc_dir in procs.flatten() {
        let Some(pid) = proc_dir.file_name().to_str().and_then(|p| p.parse::<u32>().ok())
        else {
            continue;
        };
        // Other users' processes are unreadable without privileges
        let Ok(fds) = fs::read_dir(proc_dir.path().join("fd")) else {
            continue;
        };

        for fd_entry in fds.flatten() {
            let Some(fd) = fd_entry.file_name().to_str().and_then(|f| f.parse::<i64>().ok())
            else {
                continue;
            };
            if let Some(inode) = fs::read_link(fd_entry.path())
                .ok()
                .and_then(|target| parse_socket_inode(&target.to_string_lossy()))
            {
                owners.entry(inode).or_insert((pid, fd));
            }
        }
    }

    owners
}

/// "socket:[12345]" -> 12345
pub fn parse_socket_inode(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?.strip_suffix(']')?.parse().ok()
}
