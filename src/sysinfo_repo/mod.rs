// System probes via sysinfo, /proc and statvfs. One method per subsystem query.

mod linux;

use crate::models::*;
use std::sync::{Arc, Mutex};
use sysinfo::{CpuRefreshKind, Networks, ProcessesToUpdate, RefreshKind, System};
use tracing::instrument;

/// Delay between the two CPU refreshes; sysinfo needs at least this long for a usage delta.
pub const CPU_SAMPLE_INTERVAL: std::time::Duration = sysinfo::MINIMUM_CPU_UPDATE_INTERVAL;

/// Each subsystem has its own handle so a slow probe (CPU sampling sleeps) never
/// holds a lock another group needs.
pub struct SysinfoRepo {
    cpu_usage: Arc<Mutex<System>>,
    cpu_info: Arc<Mutex<System>>,
    memory: Arc<Mutex<System>>,
    processes: Arc<Mutex<System>>,
    networks: Arc<Mutex<Networks>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let cpu_kind = RefreshKind::nothing().with_cpu(CpuRefreshKind::everything());
        Self {
            cpu_usage: Arc::new(Mutex::new(System::new_with_specifics(cpu_kind))),
            cpu_info: Arc::new(Mutex::new(System::new_with_specifics(cpu_kind))),
            memory: Arc::new(Mutex::new(System::new())),
            processes: Arc::new(Mutex::new(System::new())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
        }
    }

    /// Blocks for [`CPU_SAMPLE_INTERVAL`] between two refreshes.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_cpu_usage"))]
    pub async fn get_cpu_usage(&self) -> anyhow::Result<CpuUsage> {
        let sys = self.cpu_usage.clone();
        blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_cpu_usage();
            std::thread::sleep(CPU_SAMPLE_INTERVAL);
            sys.refresh_cpu_usage();

            let per_core_percent: Vec<f64> = sys
                .cpus()
                .iter()
                .map(|c| (c.cpu_usage() as f64).clamp(0.0, 100.0))
                .collect();
            anyhow::ensure!(!per_core_percent.is_empty(), "no CPUs reported");
            Ok(CpuUsage {
                global_percent: (sys.global_cpu_usage() as f64).clamp(0.0, 100.0),
                per_core_percent,
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_cpu_info"))]
    pub async fn get_cpu_info(&self) -> anyhow::Result<CpuInfo> {
        let sys = self.cpu_info.clone();
        blocking(move || {
            let sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            let load = System::load_average();
            Ok(CpuInfo {
                logical_cores: sys.cpus().len() as u64,
                physical_cores: System::physical_core_count().map(|n| n as u64),
                load_1: load.one,
                load_5: load.five,
                load_15: load.fifteen,
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_memory_stats"))]
    pub async fn get_memory_stats(&self) -> anyhow::Result<MemoryStats> {
        let sys = self.memory.clone();
        blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();
            let total = sys.total_memory();
            anyhow::ensure!(total > 0, "total memory reported as zero");
            let (cached, buffers) = linux::read_cached_and_buffers();
            Ok(MemoryStats {
                total,
                available: sys.available_memory(),
                cached,
                buffers,
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_swap_stats"))]
    pub async fn get_swap_stats(&self) -> anyhow::Result<SwapStats> {
        let sys = self.memory.clone();
        blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();
            Ok(SwapStats {
                total: sys.total_swap(),
                used: sys.used_swap(),
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_disk_usage"))]
    pub async fn get_disk_usage(&self, mount: &str) -> anyhow::Result<DiskUsage> {
        let mount = mount.to_string();
        blocking(move || disk_usage(&mount)).await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_disk_io"))]
    pub async fn get_disk_io(&self) -> anyhow::Result<DiskIoCounters> {
        blocking(|| {
            linux::read_disk_io_counters()
                .ok_or_else(|| anyhow::anyhow!("disk I/O counters unavailable on this platform"))
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_network_io"))]
    pub async fn get_network_io(&self) -> anyhow::Result<NetIoCounters> {
        let networks = self.networks.clone();
        blocking(move || {
            let mut networks_guard = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks_guard.refresh(true);
            anyhow::ensure!(
                !networks_guard.list().is_empty(),
                "no network interfaces reported"
            );
            let mut counters = NetIoCounters {
                bytes_sent: 0,
                bytes_recv: 0,
                packets_sent: 0,
                packets_recv: 0,
                errors_in: 0,
                errors_out: 0,
            };
            for data in networks_guard.list().values() {
                counters.bytes_sent += data.total_transmitted();
                counters.bytes_recv += data.total_received();
                counters.packets_sent += data.total_packets_transmitted();
                counters.packets_recv += data.total_packets_received();
                counters.errors_in += data.total_errors_on_received();
                counters.errors_out += data.total_errors_on_transmitted();
            }
            Ok(counters)
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_connection_count"))]
    pub async fn get_connection_count(&self) -> anyhow::Result<u64> {
        blocking(|| {
            linux::count_sockets()
                .ok_or_else(|| anyhow::anyhow!("socket tables unavailable on this platform"))
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_process_count"))]
    pub async fn get_process_count(&self) -> anyhow::Result<u64> {
        let sys = self.processes.clone();
        blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_processes(ProcessesToUpdate::All, true);
            Ok(sys.processes().len() as u64)
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_host_info"))]
    pub async fn get_host_info(&self) -> anyhow::Result<HostInfo> {
        blocking(|| {
            let platform = System::distribution_id();
            Ok(HostInfo {
                uptime_secs: System::uptime(),
                boot_time: System::boot_time(),
                platform: (!platform.is_empty()).then_some(platform),
                platform_version: System::os_version(),
                hostname: System::host_name(),
                kernel_version: System::kernel_version(),
            })
        })
        .await
    }
}

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
}

#[cfg(unix)]
fn disk_usage(mount: &str) -> anyhow::Result<DiskUsage> {
    let st = nix::sys::statvfs::statvfs(mount)
        .map_err(|e| anyhow::anyhow!("statvfs {} failed: {}", mount, e))?;
    let frsize = st.fragment_size() as u64;
    let blocks = st.blocks() as u64;
    Ok(DiskUsage {
        total: blocks * frsize,
        free: st.blocks_available() as u64 * frsize,
        used: blocks.saturating_sub(st.blocks_free() as u64) * frsize,
        inodes_total: Some(st.files() as u64),
        inodes_free: Some(st.files_free() as u64),
    })
}

#[cfg(not(unix))]
fn disk_usage(mount: &str) -> anyhow::Result<DiskUsage> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new(mount))
        .ok_or_else(|| anyhow::anyhow!("no disk mounted at {}", mount))?;
    let total = disk.total_space();
    let free = disk.available_space();
    Ok(DiskUsage {
        total,
        free,
        used: total.saturating_sub(free),
        inodes_total: None,
        inodes_free: None,
    })
}
