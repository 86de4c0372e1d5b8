use serde::Serialize;
use serde_json::{json, Value};
use sysinfo::{Networks, Pid, System};

use crate::env::{env_or, APP_ENV};

/// Source of the host facts embedded in production records under the
/// `inferred` field.
///
/// Implementations must be synchronous and must not fail: on internal
/// trouble they return an error-shaped mapping (`{"error": ..,
/// "message": ..}`) instead of panicking. The snapshot is requested
/// fresh for every record that wants one; nothing is cached.
///
/// The default implementation is [`HostSystemInfo`]. Tests substitute
/// a fixed source to keep records deterministic.
pub trait SystemInfoSource: Send + Sync {
    /// Hostname stamped on every record.
    fn hostname(&self) -> String;

    /// Fresh five-section snapshot: `system`, `process`, `env`,
    /// `hardware`, `network`.
    fn snapshot(&self) -> Value;
}

#[derive(Debug, Clone, Serialize)]
struct Snapshot {
    system: SystemSection,
    process: ProcessSection,
    env: EnvSection,
    hardware: HardwareSection,
    network: NetworkSection,
}

#[derive(Debug, Clone, Serialize)]
struct SystemSection {
    platform: String,
    arch: String,
    os_name: String,
    os_version: String,
    hostname: String,
}

#[derive(Debug, Clone, Serialize)]
struct ProcessSection {
    version: String,
    pid: u32,
    uptime_secs: u64,
    memory: MemorySection,
}

#[derive(Debug, Clone, Serialize)]
struct MemorySection {
    rss_bytes: u64,
    virtual_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
struct EnvSection {
    app_env: String,
    timezone: String,
    locale: String,
}

#[derive(Debug, Clone, Serialize)]
struct HardwareSection {
    cpu_count: usize,
    cpu_model: String,
    total_memory_bytes: u64,
    free_memory_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
struct NetworkSection {
    addresses: Vec<String>,
    primary: String,
}

/// Default [`SystemInfoSource`] backed by the operating system.
#[derive(Clone, Copy, Default)]
pub struct HostSystemInfo;

impl SystemInfoSource for HostSystemInfo {
    fn hostname(&self) -> String {
        System::host_name().unwrap_or_else(|| "unknown".to_string())
    }

    fn snapshot(&self) -> Value {
        let snapshot = capture();
        serde_json::to_value(&snapshot).unwrap_or_else(|e| {
            json!({
                "error": "system info capture failed",
                "message": e.to_string(),
            })
        })
    }
}

fn capture() -> Snapshot {
    let mut sys = System::new_all();
    sys.refresh_all();

    let pid = std::process::id();
    let proc_info = sys.process(Pid::from_u32(pid));
    let (addresses, primary) = interface_addresses();

    Snapshot {
        system: SystemSection {
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            os_name: System::name().unwrap_or_else(|| "unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        },
        process: ProcessSection {
            version: env!("CARGO_PKG_VERSION").to_string(),
            pid,
            uptime_secs: proc_info.map(|p| p.run_time()).unwrap_or(0),
            memory: MemorySection {
                rss_bytes: proc_info.map(|p| p.memory()).unwrap_or(0),
                virtual_bytes: proc_info.map(|p| p.virtual_memory()).unwrap_or(0),
            },
        },
        env: EnvSection {
            app_env: env_or(APP_ENV, "unknown"),
            timezone: timezone(),
            locale: locale(),
        },
        hardware: HardwareSection {
            cpu_count: num_cpus::get(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            total_memory_bytes: sys.total_memory(),
            free_memory_bytes: sys.free_memory(),
        },
        network: NetworkSection { addresses, primary },
    }
}

fn timezone() -> String {
    std::env::var("TZ").unwrap_or_else(|_| chrono::Local::now().format("%:z").to_string())
}

fn locale() -> String {
    std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Non-loopback IPv4 addresses bound to the host, sorted for a stable
/// order, plus the designated primary (first) address. `["none"]` when
/// no interface qualifies.
fn interface_addresses() -> (Vec<String>, String) {
    let networks = Networks::new_with_refreshed_list();
    let mut addresses: Vec<String> = Vec::new();

    for (_name, data) in networks.list() {
        for ip in data.ip_networks() {
            match ip.addr {
                std::net::IpAddr::V4(v4) if !v4.is_loopback() => addresses.push(v4.to_string()),
                _ => {}
            }
        }
    }

    addresses.sort();
    addresses.dedup();
    if addresses.is_empty() {
        addresses.push("none".to_string());
    }
    let primary = addresses[0].clone();

    (addresses, primary)
}
