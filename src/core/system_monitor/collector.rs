use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use log::{debug, warn};
use parking_lot::Mutex;
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, Pid, Process,
    ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, RefreshKind, Signal, System, UpdateKind, Users,
};

use crate::core::system_info::cpu::format_cache_size;
use crate::core::system_info::os::{self, HostIdentity};
use crate::core::system_info::{
    get_hardware_probe, memory, CpuSpecs, HardwareProbe, HardwareScanner, SharedHardware,
    SystemStaticInfo,
};
use crate::error::Result;

use super::counters::{DiskCounterStore, NetCounterStore};
use super::limits::{parse_limit, parse_pid};
use super::metrics::*;
use super::process_cache::{ProcessCache, ProcessSample};
use super::{connections, network, sensors, services};

#[cfg(target_os = "linux")]
use crate::platform::system::linux::procfs;

#[cfg(windows)]
const SYSTEM_ROOT: &str = "C:\\";
#[cfg(not(windows))]
const SYSTEM_ROOT: &str = "/";

/// Per-core L1 size used when the platform reports none (KB)
const APPROX_L1_PER_CORE_KB: u64 = 32;

/// Configuration for metrics collection
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Start the background hardware scan in the constructor
    pub scan_hardware: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            scan_hardware: true,
        }
    }
}

/// Everything the façade mutates between calls
struct MonitorState {
    system: System,
    components: Components,
    disks: Disks,
    networks: Networks,
    users: Users,
    net_counters: NetCounterStore,
    disk_counters: DiskCounterStore,
    processes: ProcessCache,
}

/// Collects system metrics from various sources.
///
/// Shared across request workers as `Arc<MetricsCollector>`; every method
/// takes `&self`. Sampling state sits behind one mutex, the hardware profile
/// is read from the scanner's [`SharedHardware`] cell.
pub struct MetricsCollector {
    state: Mutex<MonitorState>,
    hardware: SharedHardware,
    identity: HostIdentity,
}

impl MetricsCollector {
    /// Create a new MetricsCollector with default configuration
    pub fn new() -> Self {
        Self::with_config(CollectorConfig::default())
    }

    /// Create a new MetricsCollector with custom configuration
    pub fn with_config(config: CollectorConfig) -> Self {
        if config.scan_hardware {
            Self::with_probe(get_hardware_probe())
        } else {
            debug!("Hardware scan disabled, profile stays pending");
            Self::build(SharedHardware::new())
        }
    }

    /// Create a collector whose background scan runs `probe`
    pub fn with_probe(probe: Box<dyn HardwareProbe>) -> Self {
        let hardware = SharedHardware::new();
        if let Err(e) = HardwareScanner::spawn(probe, hardware.clone()) {
            warn!("Failed to start hardware scan thread: {}", e);
        }
        Self::build(hardware)
    }

    fn build(hardware: SharedHardware) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());

        let system = System::new_with_specifics(refresh_kind);
        let processor = system
            .cpus()
            .first()
            .map(|c| c.brand().to_string())
            .unwrap_or_default();

        let state = MonitorState {
            system,
            components: Components::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            users: Users::new_with_refreshed_list(),
            net_counters: NetCounterStore::new(),
            disk_counters: DiskCounterStore::new(),
            processes: ProcessCache::new(),
        };

        Self {
            state: Mutex::new(state),
            hardware,
            identity: os::collect(&processor),
        }
    }

    /// The cell the hardware scanner publishes into
    pub fn hardware(&self) -> &SharedHardware {
        &self.hardware
    }

    // ========================================================================
    // CPU / memory / disk
    // ========================================================================

    pub fn get_cpu_info(&self) -> CpuInfo {
        let mut info = {
            let mut state = self.state.lock();
            state.system.refresh_cpu_all();
            state.components.refresh(true);

            let cpus = state.system.cpus();
            let load = System::load_average();
            let temperatures = sensors::temperatures(&state.components);

            CpuInfo {
                usage_percent: state.system.global_cpu_usage(),
                per_core_usage: cpus.iter().map(|cpu| cpu.cpu_usage()).collect(),
                frequency_current: cpus
                    .first()
                    .map(|c| c.frequency())
                    .filter(|mhz| *mhz > 0)
                    .map(|mhz| mhz as f64),
                count_physical: System::physical_core_count().unwrap_or(0),
                count_logical: cpus.len(),
                temperature: sensors::cpu_temperature(&temperatures),
                load_average: (load.one, load.five, load.fifteen),
                ..Default::default()
            }
        };

        #[cfg(target_os = "linux")]
        {
            let counters = procfs::read_kernel_counters();
            info.ctx_switches = counters.ctx_switches;
            info.interrupts = counters.interrupts;
            info.soft_interrupts = counters.soft_interrupts;
        }

        let (specs, status) = self
            .hardware
            .read(|profile| (profile.cpu_specs.clone(), profile.status));
        merge_cpu_specs(&mut info, &specs);
        info.hardware_scan = status;
        info
    }

    pub fn get_memory_info(&self) -> MemoryInfo {
        let mut info = {
            let mut state = self.state.lock();
            state.system.refresh_memory();
            let sys = &state.system;

            let total = sys.total_memory();
            let used = sys.used_memory();
            MemoryInfo {
                total,
                available: sys.available_memory(),
                used,
                percent: percent(used, total),
                swap_total: sys.total_swap(),
                swap_used: sys.used_swap(),
                pagefile_total: Some(sys.total_swap()),
                pagefile_used: Some(sys.used_swap()),
                ..Default::default()
            }
        };

        info.modules = self.hardware.read(|profile| profile.ram_modules.clone());
        info.memory_type = memory::memory_type(&info.modules).map(|t| t.to_string());
        info.dram_frequency = memory::dram_frequency(&info.modules);
        info
    }

    /// Usage of the system root volume
    pub fn get_disk_info(&self) -> DiskInfo {
        let mut state = self.state.lock();
        state.disks.refresh(true);

        state
            .disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new(SYSTEM_ROOT))
            .map(|disk| {
                let total = disk.total_space();
                let free = disk.available_space();
                let used = total.saturating_sub(free);
                DiskInfo {
                    total,
                    used,
                    free,
                    percent: percent(used, total),
                    device: disk.name().to_string_lossy().to_string(),
                }
            })
            .unwrap_or_else(|| {
                debug!("No disk mounted at {}", SYSTEM_ROOT);
                DiskInfo::unknown()
            })
    }

    pub fn get_disk_detailed(&self) -> DiskDetailed {
        #[cfg(target_os = "linux")]
        let mount_options = procfs::read_mount_options();
        #[cfg(target_os = "linux")]
        let proc_totals = procfs::read_disk_totals();

        let mut state = self.state.lock();
        state.disks.refresh(true);

        let partitions: Vec<DiskPartition> = state
            .disks
            .iter()
            .filter_map(|disk| {
                let total = disk.total_space();
                let mountpoint = disk.mount_point().to_string_lossy().to_string();
                if total == 0 {
                    debug!("Skipping partition {} with no capacity", mountpoint);
                    return None;
                }
                let free = disk.available_space();
                let used = total.saturating_sub(free);

                #[cfg(target_os = "linux")]
                let opts = mount_options.get(&mountpoint).cloned();
                #[cfg(not(target_os = "linux"))]
                let opts: Option<String> = None;

                Some(DiskPartition {
                    device: disk.name().to_string_lossy().to_string(),
                    fstype: disk.file_system().to_string_lossy().to_string(),
                    total,
                    used,
                    free,
                    percent: percent(used, total),
                    opts: opts.unwrap_or_else(|| {
                        let mode = if disk.is_read_only() { "ro" } else { "rw" };
                        mode.to_string()
                    }),
                    mountpoint,
                })
            })
            .collect();

        #[cfg(target_os = "linux")]
        let totals = proc_totals.unwrap_or_default();
        #[cfg(not(target_os = "linux"))]
        let totals = disk_usage_totals(&state.disks);

        let rates = state.disk_counters.observe(totals.clone());
        let io_stats = totals
            .into_iter()
            .map(|(device, t)| {
                let rate = rates.get(&device).copied().unwrap_or_default();
                (
                    device,
                    DiskIOStats {
                        read_count: t.read_count,
                        write_count: t.write_count,
                        read_bytes: t.read_bytes,
                        write_bytes: t.write_bytes,
                        read_speed: rate.read_speed,
                        write_speed: rate.write_speed,
                    },
                )
            })
            .collect();

        DiskDetailed {
            partitions,
            io_stats,
        }
    }

    // ========================================================================
    // Network
    // ========================================================================

    /// Global network rate; shares its counter store with the detailed view
    pub fn get_network_info(&self) -> NetworkRate {
        let mut state = self.state.lock();
        Self::network_rate(&mut state)
    }

    pub fn get_network_detailed(&self) -> NetworkDetailed {
        let (interfaces, global_rate) = {
            let mut state = self.state.lock();
            let global_rate = Self::network_rate(&mut state);

            let mut interfaces: Vec<NetInterface> = state
                .networks
                .iter()
                .map(|(name, data)| network::interface(name, data))
                .collect();
            interfaces.sort_by(|a, b| a.name.cmp(&b.name));
            (interfaces, global_rate)
        };

        #[cfg(target_os = "linux")]
        let (dns_servers, gateways) = (procfs::read_dns_servers(), procfs::read_default_gateways());
        #[cfg(not(target_os = "linux"))]
        let (dns_servers, gateways) = (Vec::new(), BTreeMap::new());

        NetworkDetailed {
            interfaces,
            global_rate,
            dns_servers,
            gateways,
        }
    }

    fn network_rate(state: &mut MonitorState) -> NetworkRate {
        state.networks.refresh(true);
        let totals = network::global_totals(&state.networks);
        let rates = state.net_counters.observe(totals);

        NetworkRate {
            bytes_sent: totals.bytes_sent,
            bytes_recv: totals.bytes_recv,
            packets_sent: totals.packets_sent,
            packets_recv: totals.packets_recv,
            upload_speed: rates.upload_speed,
            download_speed: rates.download_speed,
        }
    }

    // ========================================================================
    // Processes
    // ========================================================================

    /// Top `limit` processes by CPU percent since the previous call
    pub fn get_top_processes(&self, limit: i64) -> Result<Vec<ProcessInfo>> {
        let limit = parse_limit(limit)?;

        let mut state = self.state.lock();
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_user(UpdateKind::OnlyIfNotSet)
                .without_tasks(),
        );
        let now = Instant::now();

        let total_memory = state.system.total_memory();
        let mut samples: Vec<ProcessSample> = state
            .system
            .processes()
            .values()
            // Threads left over from a detail lookup are not processes
            .filter(|proc| proc.thread_kind().is_none())
            .map(|proc| ProcessSample {
                pid: proc.pid().as_u32(),
                start_time: proc.start_time(),
                cpu_time_ms: proc.accumulated_cpu_time(),
                name: proc.name().to_string_lossy().to_string(),
                memory_percent: percent(proc.memory(), total_memory),
                status: process_status(proc),
                username: user_name(&state.users, proc),
            })
            .collect();
        samples.sort_by_key(|s| s.pid);

        Ok(state.processes.poll(samples, now, limit))
    }

    /// Details for one pid, `None` when it no longer exists
    pub fn get_process_detail(&self, pid: i64) -> Result<Option<ProcessDetail>> {
        let pid = parse_pid(pid)?;
        let sys_pid = Pid::from_u32(pid);

        let mut state = self.state.lock();
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let Some(proc) = state.system.process(sys_pid) else {
            debug!("Process {} not found", pid);
            return Ok(None);
        };

        let memory_info = BTreeMap::from([
            ("rss".to_string(), proc.memory()),
            ("vms".to_string(), proc.virtual_memory()),
        ]);

        Ok(Some(ProcessDetail {
            pid,
            name: proc.name().to_string_lossy().to_string(),
            cmdline: proc
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy().to_string())
                .collect(),
            cwd: proc
                .cwd()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            username: user_name(&state.users, proc).unwrap_or_else(|| "Unknown".to_string()),
            status: process_status(proc),
            create_time: proc.start_time(),
            memory_info,
            num_threads: proc.tasks().map(|tasks| tasks.len()),
            num_fds: proc.open_files(),
        }))
    }

    /// Ask a process to terminate. `false` when the pid is gone or the
    /// signal was refused.
    pub fn kill_process(&self, pid: i64) -> Result<bool> {
        let pid = parse_pid(pid)?;
        let sys_pid = Pid::from_u32(pid);

        let mut state = self.state.lock();
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::nothing(),
        );

        let Some(proc) = state.system.process(sys_pid) else {
            return Ok(false);
        };

        // No SIGTERM on this platform: hard kill instead
        let sent = proc.kill_with(Signal::Term).unwrap_or_else(|| proc.kill());
        if sent {
            debug!("Sent termination signal to {}", pid);
        } else {
            warn!("Termination of process {} was refused", pid);
        }
        Ok(sent)
    }

    // ========================================================================
    // Connections / services / static info / sensors
    // ========================================================================

    pub fn get_connections(&self, limit: i64) -> Result<Vec<NetConnection>> {
        let limit = parse_limit(limit)?;

        let rows = connections::fetch().unwrap_or_else(|e| {
            warn!("Connection table unavailable: {}", e);
            Vec::new()
        });

        let mut state = self.state.lock();
        Ok(connections::finalize(rows, limit, |pid| {
            let sys_pid = Pid::from_u32(pid);
            state.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[sys_pid]),
                true,
                ProcessRefreshKind::nothing(),
            );
            state
                .system
                .process(sys_pid)
                .map(|p| p.name().to_string_lossy().to_string())
        }))
    }

    pub fn get_services(&self) -> Vec<ServiceInfo> {
        services::collect()
    }

    pub fn get_system_info(&self) -> SystemStaticInfo {
        let id = &self.identity;
        let (gpu, motherboard, cpu_marketing_name, status) = self.hardware.read(|profile| {
            (
                profile.gpus.clone(),
                profile.motherboard.clone(),
                profile.cpu_specs.marketing_name.clone(),
                profile.status,
            )
        });

        SystemStaticInfo {
            hostname: id.hostname.clone(),
            os_name: id.os_name.clone(),
            os_release: id.os_release.clone(),
            os_version: id.os_version.clone(),
            os_edition: id.os_edition.clone(),
            machine_type: id.machine_type.clone(),
            processor: id.processor.clone(),
            cpu_marketing_name,
            boot_time: id.boot_time,
            uptime_seconds: os::uptime_since(id.boot_time),
            gpu,
            motherboard,
            hardware_scan: status,
        }
    }

    pub fn get_sensors(&self) -> SensorMetrics {
        let temperatures = {
            let mut state = self.state.lock();
            state.components.refresh(true);
            sensors::temperatures(&state.components)
        };

        SensorMetrics {
            temperatures,
            fans: sensors::fans(),
            battery: sensors::battery(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill the identification, cache and clock fields from the published specs
fn merge_cpu_specs(info: &mut CpuInfo, specs: &CpuSpecs) {
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".to_string());

    info.marketing_name = specs.marketing_name.clone();
    info.vendor = specs.vendor.clone();
    info.socket = specs.socket.clone();
    info.family = or_unknown(&specs.family);
    info.model = or_unknown(&specs.model);
    info.stepping = or_unknown(&specs.stepping);
    info.ext_family = or_unknown(&specs.ext_family);
    info.ext_model = or_unknown(&specs.ext_model);
    info.revision = or_unknown(&specs.revision);
    info.microcode = specs.microcode.clone();
    info.instructions = specs.instructions.clone();

    info.cores = if specs.cores > 0 {
        specs.cores
    } else {
        info.count_physical
    };
    info.threads = if specs.threads > 0 {
        specs.threads
    } else {
        info.count_logical
    };

    info.l2_cache = specs.l2_cache.clone();
    info.l3_cache = specs.l3_cache.clone();
    info.l1_data_cache = specs.l1_data_cache.clone();
    info.l1_inst_cache = specs.l1_inst_cache.clone();
    if (info.l1_data_cache.is_none() || info.l1_inst_cache.is_none()) && info.cores > 0 {
        let approx = format_cache_size(info.cores as u64 * APPROX_L1_PER_CORE_KB);
        info.l1_data_cache.get_or_insert_with(|| approx.clone());
        info.l1_inst_cache.get_or_insert(approx);
        info.l1_approximate = true;
    }

    info.core_speed = info.frequency_current;
    info.max_clock = specs.max_clock_mhz;
    info.bus_speed = specs.bus_speed;
    info.multiplier = specs.multiplier;
    info.rated_fsb = specs.rated_fsb;
}

#[cfg(not(target_os = "linux"))]
fn disk_usage_totals(disks: &Disks) -> BTreeMap<String, super::counters::DiskTotals> {
    disks
        .iter()
        .map(|disk| {
            let usage = disk.usage();
            (
                disk.name().to_string_lossy().to_string(),
                super::counters::DiskTotals {
                    read_bytes: usage.total_read_bytes,
                    write_bytes: usage.total_written_bytes,
                    read_count: 0,
                    write_count: 0,
                },
            )
        })
        .collect()
}

fn process_status(proc: &Process) -> String {
    status_name(proc.status()).to_string()
}

fn status_name(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Run => "running",
        ProcessStatus::Sleep => "sleeping",
        ProcessStatus::Idle => "idle",
        ProcessStatus::Stop => "stopped",
        ProcessStatus::Tracing => "tracing-stop",
        ProcessStatus::Zombie => "zombie",
        ProcessStatus::Dead => "dead",
        ProcessStatus::UninterruptibleDiskSleep => "disk-sleep",
        ProcessStatus::Wakekill => "wake-kill",
        ProcessStatus::Waking => "waking",
        ProcessStatus::Parked => "parked",
        ProcessStatus::LockBlocked => "locked",
        ProcessStatus::Unknown(_) => "unknown",
    }
}

fn user_name(users: &Users, proc: &Process) -> Option<String> {
    let uid = proc.user_id()?;
    users.get_user_by_id(uid).map(|u| u.name().to_string())
}

fn percent(part: u64, total: u64) -> f32 {
    if total > 0 {
        (part as f32 / total as f32) * 100.0
    } else {
        0.0
    }
}
