use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use tokio::time::{interval, MissedTickBehavior};

use vantasys::core::system_info::ScanStatus;
use vantasys::{init_logging, Config, MetricsCollector};

/// Metrics that can be sampled repeatedly by `watch`
const WATCHABLE: [&str; 11] = [
    "cpu",
    "memory",
    "disk",
    "disk-detailed",
    "network",
    "network-detailed",
    "processes",
    "connections",
    "services",
    "system",
    "sensors",
];

/// Gap between the priming sample and the reported one for rate metrics
const SETTLE_DELAY: Duration = Duration::from_secs(1);
const HARDWARE_WAIT_LIMIT: Duration = Duration::from_secs(30);

/// `--limit`; falls back to the configured default when absent
fn limit_arg(default: usize) -> Arg {
    Arg::new("limit")
        .short('n')
        .long("limit")
        .value_name("N")
        .help(format!("Maximum number of rows [default: {}]", default))
        .value_parser(clap::value_parser!(i64))
        .allow_negative_numbers(true)
}

fn pid_arg() -> Arg {
    Arg::new("pid")
        .help("Process id")
        .required(true)
        .index(1)
        .value_parser(clap::value_parser!(i64))
        .allow_negative_numbers(true)
}

fn build_cli(config: &Config) -> Command {
    Command::new("vantasys")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hardware and OS telemetry for a local monitoring dashboard")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .global(true)
                .help("Override the configured log level (error, warn, info, debug, trace)"),
        )
        .arg(
            Arg::new("wait-hardware")
                .long("wait-hardware")
                .global(true)
                .help("Wait for the background hardware scan before printing")
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("cpu").about("CPU usage, counters and specs"))
        .subcommand(Command::new("memory").about("RAM, swap and memory modules"))
        .subcommand(Command::new("disk").about("Usage of the system volume"))
        .subcommand(Command::new("disk-detailed").about("Partitions and per-device I/O"))
        .subcommand(Command::new("network").about("Global network rate"))
        .subcommand(
            Command::new("network-detailed").about("Interfaces, DNS servers and gateways"),
        )
        .subcommand(
            Command::new("processes")
                .about("Top processes by CPU usage")
                .arg(limit_arg(config.default_process_limit)),
        )
        .subcommand(
            Command::new("process")
                .about("Details for a single process")
                .arg(pid_arg()),
        )
        .subcommand(
            Command::new("kill")
                .about("Ask a process to terminate")
                .arg(pid_arg()),
        )
        .subcommand(
            Command::new("connections")
                .about("Open internet sockets")
                .arg(limit_arg(config.default_connection_limit)),
        )
        .subcommand(Command::new("services").about("Services known to the service manager"))
        .subcommand(Command::new("system").about("Host identity and hardware profile"))
        .subcommand(Command::new("sensors").about("Temperatures, fans and battery"))
        .subcommand(
            Command::new("watch")
                .about("Sample a metric repeatedly until Ctrl-C")
                .arg(
                    Arg::new("metric")
                        .required(true)
                        .index(1)
                        .value_parser(WATCHABLE),
                )
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Milliseconds between samples")
                        .value_parser(clap::value_parser!(u64).range(100..))
                        .default_value("1000"),
                )
                .arg(limit_arg(config.default_process_limit)),
        )
        .subcommand(
            Command::new("config")
                .about("Show or initialize the configuration file")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("init").about("Write the default configuration")),
        )
}

fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let matches = build_cli(&config).get_matches();

    let level = match matches.get_one::<String>("log-level") {
        Some(level) => level
            .parse()
            .with_context(|| format!("Invalid log level: {}", level))?,
        None => config.log_level_filter(),
    };
    init_logging(level);

    if let Some(("config", sub)) = matches.subcommand() {
        return handle_config_command(sub, &config);
    }

    let collector = MetricsCollector::with_config(config.collector_config());
    if matches.get_flag("wait-hardware") {
        wait_for_hardware(&collector);
    }

    match matches.subcommand() {
        Some(("watch", sub)) => {
            let metric = sub
                .get_one::<String>("metric")
                .cloned()
                .context("metric is required")?;
            let period = Duration::from_millis(*sub.get_one::<u64>("interval").unwrap_or(&1000));
            let limit = limit_value(sub, default_limit(&metric, &config));
            run_watch(collector, metric, period, limit)
        }
        Some(("process", sub)) => {
            let pid = pid_value(sub)?;
            print_json(&collector.get_process_detail(pid)?)
        }
        Some(("kill", sub)) => {
            let pid = pid_value(sub)?;
            print_json(&collector.kill_process(pid)?)
        }
        Some((metric, sub)) => {
            let limit = limit_value(sub, default_limit(metric, &config));
            if is_rate_metric(metric) {
                // First reading only establishes the baseline
                sample(&collector, metric, limit)?;
                thread::sleep(SETTLE_DELAY);
            }
            print_json(&sample(&collector, metric, limit)?)
        }
        None => Ok(()),
    }
}

fn handle_config_command(matches: &ArgMatches, config: &Config) -> Result<()> {
    match matches.subcommand() {
        Some(("path", _)) => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        Some(("show", _)) => print_json(config),
        Some(("init", _)) => {
            Config::default().save()?;
            println!(
                "Wrote default configuration to {}",
                Config::get_config_path()?.display()
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

/// One reading of `metric`, serialized
fn sample(collector: &MetricsCollector, metric: &str, limit: i64) -> Result<Value> {
    let value = match metric {
        "cpu" => serde_json::to_value(collector.get_cpu_info())?,
        "memory" => serde_json::to_value(collector.get_memory_info())?,
        "disk" => serde_json::to_value(collector.get_disk_info())?,
        "disk-detailed" => serde_json::to_value(collector.get_disk_detailed())?,
        "network" => serde_json::to_value(collector.get_network_info())?,
        "network-detailed" => serde_json::to_value(collector.get_network_detailed())?,
        "processes" => serde_json::to_value(collector.get_top_processes(limit)?)?,
        "connections" => serde_json::to_value(collector.get_connections(limit)?)?,
        "services" => serde_json::to_value(collector.get_services())?,
        "system" => serde_json::to_value(collector.get_system_info())?,
        "sensors" => serde_json::to_value(collector.get_sensors())?,
        other => anyhow::bail!("Unknown metric: {}", other),
    };
    Ok(value)
}

fn is_rate_metric(metric: &str) -> bool {
    matches!(
        metric,
        "cpu" | "processes" | "network" | "network-detailed" | "disk-detailed"
    )
}

fn run_watch(
    collector: MetricsCollector,
    metric: String,
    period: Duration,
    limit: i64,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("vantasys-worker")
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(watch_loop(Arc::new(collector), metric, period, limit))
}

async fn watch_loop(
    collector: Arc<MetricsCollector>,
    metric: String,
    period: Duration,
    limit: i64,
) -> Result<()> {
    info!("Watching '{}' every {} ms", metric, period.as_millis());

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let collector = Arc::clone(&collector);
                let name = metric.clone();
                // Façade calls block on OS queries
                let value = tokio::task::spawn_blocking(move || sample(&collector, &name, limit))
                    .await
                    .context("Sampling task failed")??;
                println!("{}", serde_json::to_string(&value)?);
            }
            _ = &mut ctrl_c => {
                info!("Stopping watch");
                break;
            }
        }
    }

    Ok(())
}

fn wait_for_hardware(collector: &MetricsCollector) {
    let started = Instant::now();
    while collector.hardware().status() == ScanStatus::Pending {
        if started.elapsed() >= HARDWARE_WAIT_LIMIT {
            debug!("Hardware scan still pending, printing without it");
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    debug!(
        "Hardware scan ready after {} ms",
        started.elapsed().as_millis()
    );
}

fn default_limit(metric: &str, config: &Config) -> usize {
    if metric == "connections" {
        config.default_connection_limit
    } else {
        config.default_process_limit
    }
}

fn limit_value(matches: &ArgMatches, default: usize) -> i64 {
    matches
        .try_get_one::<i64>("limit")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(default as i64)
}

fn pid_value(matches: &ArgMatches) -> Result<i64> {
    matches
        .get_one::<i64>("pid")
        .copied()
        .context("pid is required")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
