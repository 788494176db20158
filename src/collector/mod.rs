// System metric collection: one concurrent probe per requested group, merged into one map.

mod cache;
mod rates;

pub use cache::{CacheEntry, SampleCache, SnapshotSource};
pub use rates::{CounterSample, RateTracker, per_second};

use crate::models::*;
use crate::sysinfo_repo::SysinfoRepo;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Runs the probes needed by a fixed [`RequestSet`] and derives metrics from them.
pub struct SystemCollector {
    repo: Arc<SysinfoRepo>,
    requests: Arc<RequestSet>,
    disk_mount: Arc<str>,
    rates: Mutex<RateTracker>,
}

/// Metrics of one group plus the counters it read, if it is a rate-bearing group.
#[derive(Debug, Default)]
struct GroupOutput {
    metrics: MetricMap,
    disk: Option<CounterSample>,
    network: Option<CounterSample>,
}

impl SystemCollector {
    pub fn new(repo: Arc<SysinfoRepo>, requests: RequestSet, disk_mount: &str) -> Self {
        Self {
            repo,
            requests: Arc::new(requests),
            disk_mount: Arc::from(disk_mount),
            rates: Mutex::new(RateTracker::new()),
        }
    }

    pub fn requests(&self) -> &RequestSet {
        &self.requests
    }

    /// One physical collection. Advances the rate state exactly once.
    pub async fn collect(&self) -> MetricMap {
        // Held for the whole collection so deltas always pair with the previous collection.
        let mut rates = self.rates.lock().await;
        let previous = *rates;
        let now = Instant::now();

        let mut tasks = JoinSet::new();
        for group in self.requests.groups() {
            let repo = self.repo.clone();
            let requests = self.requests.clone();
            let mount = self.disk_mount.clone();
            tasks.spawn(async move {
                let result = probe_group(group, &repo, &requests, &mount, previous, now).await;
                (group, result)
            });
        }

        let mut metrics = MetricMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(output))) => {
                    metrics.extend(output.metrics);
                    if let Some(sample) = output.disk {
                        rates.record_disk(sample);
                    }
                    if let Some(sample) = output.network {
                        rates.record_network(sample);
                    }
                }
                Ok((group, Err(e))) => {
                    warn!(
                        group = group.as_str(),
                        error = %e,
                        "probe failed, group metrics omitted"
                    );
                }
                Err(e) => {
                    warn!(error = %e, operation = "collect", "probe task failed to join");
                }
            }
        }
        debug!(metrics = metrics.len(), "system collection finished");
        metrics
    }
}

async fn probe_group(
    group: MetricGroup,
    repo: &SysinfoRepo,
    req: &RequestSet,
    disk_mount: &str,
    previous: RateTracker,
    now: Instant,
) -> anyhow::Result<GroupOutput> {
    let metrics = match group {
        MetricGroup::CpuUsage => cpu_usage_metrics(req, &repo.get_cpu_usage().await?),
        MetricGroup::CpuInfo => cpu_info_metrics(req, &repo.get_cpu_info().await?),
        MetricGroup::Memory => memory_metrics(req, &repo.get_memory_stats().await?),
        MetricGroup::Swap => swap_metrics(req, &repo.get_swap_stats().await?),
        MetricGroup::DiskUsage => {
            disk_usage_metrics(req, &repo.get_disk_usage(disk_mount).await?)
        }
        MetricGroup::DiskIo => {
            let counters = repo.get_disk_io().await?;
            let (metrics, sample) = disk_io_metrics(req, &counters, previous.disk(), now);
            return Ok(GroupOutput {
                metrics,
                disk: Some(sample),
                network: None,
            });
        }
        MetricGroup::Network => {
            let counters = repo.get_network_io().await?;
            let (metrics, sample) = network_metrics(req, &counters, previous.network(), now);
            return Ok(GroupOutput {
                metrics,
                disk: None,
                network: Some(sample),
            });
        }
        MetricGroup::Connections => {
            let mut out = Emitter::new(req);
            out.put("active_connections", repo.get_connection_count().await?);
            out.finish()
        }
        MetricGroup::ProcessCount => {
            let mut out = Emitter::new(req);
            out.put("process_count", repo.get_process_count().await?);
            out.finish()
        }
        MetricGroup::HostInfo => host_metrics(req, &repo.get_host_info().await?),
    };
    Ok(GroupOutput::from(metrics))
}

impl From<MetricMap> for GroupOutput {
    fn from(metrics: MetricMap) -> Self {
        GroupOutput {
            metrics,
            ..Default::default()
        }
    }
}

/// Inserts only requested keys, so a group never leaks metrics nobody asked for.
struct Emitter<'a> {
    req: &'a RequestSet,
    out: MetricMap,
}

impl<'a> Emitter<'a> {
    fn new(req: &'a RequestSet) -> Self {
        Self {
            req,
            out: MetricMap::new(),
        }
    }

    fn put(&mut self, key: &str, value: impl Into<MetricValue>) {
        if self.req.contains(key) {
            self.out.insert(key.to_string(), value.into());
        }
    }

    fn put_opt(&mut self, key: &str, value: Option<impl Into<MetricValue>>) {
        if let Some(v) = value {
            self.put(key, v);
        }
    }

    fn finish(self) -> MetricMap {
        self.out
    }
}

/// With per-core figures requested, the overall percent is their mean, so the two
/// metrics always agree.
fn cpu_usage_metrics(req: &RequestSet, usage: &CpuUsage) -> MetricMap {
    let mut out = Emitter::new(req);
    if req.contains("cpu_usage_per_core") && !usage.per_core_percent.is_empty() {
        let per_core: Vec<f64> = usage
            .per_core_percent
            .iter()
            .map(|p| round_to(*p, 2))
            .collect();
        let mean = per_core.iter().sum::<f64>() / per_core.len() as f64;
        out.put("cpu_usage_percent", round_to(mean, 2));
        out.put("cpu_usage_per_core", per_core);
    } else {
        out.put("cpu_usage_percent", round_to(usage.global_percent, 2));
    }
    out.finish()
}

fn cpu_info_metrics(req: &RequestSet, info: &CpuInfo) -> MetricMap {
    let mut out = Emitter::new(req);
    out.put("cpu_count", info.logical_cores);
    out.put_opt("cpu_count_physical", info.physical_cores);
    out.put("cpu_load_1min", round_to(info.load_1, 2));
    out.put("cpu_load_5min", round_to(info.load_5, 2));
    out.put("cpu_load_15min", round_to(info.load_15, 2));
    out.finish()
}

fn memory_metrics(req: &RequestSet, mem: &MemoryStats) -> MetricMap {
    let mut out = Emitter::new(req);
    out.put("ram_usage_percent", round_to(mem.used_percent(), 2));
    out.put("available_ram_mb", bytes_to_mb(mem.available));
    out.put("total_ram_mb", bytes_to_mb(mem.total));
    out.put_opt("ram_cached_mb", mem.cached.map(bytes_to_mb));
    out.put_opt("ram_buffers_mb", mem.buffers.map(bytes_to_mb));
    out.finish()
}

fn swap_metrics(req: &RequestSet, swap: &SwapStats) -> MetricMap {
    let mut out = Emitter::new(req);
    out.put("swap_usage_percent", round_to(swap.used_percent(), 2));
    out.put("swap_total_mb", bytes_to_mb(swap.total));
    out.put("swap_used_mb", bytes_to_mb(swap.used));
    out.finish()
}

fn disk_usage_metrics(req: &RequestSet, usage: &DiskUsage) -> MetricMap {
    let mut out = Emitter::new(req);
    out.put("disk_usage_percent", round_to(usage.used_percent(), 2));
    out.put("available_disk_gb", bytes_to_gb(usage.free));
    out.put("total_disk_gb", bytes_to_gb(usage.total));
    out.put_opt(
        "inode_usage_percent",
        usage.inode_used_percent().map(|p| round_to(p, 2)),
    );
    out.finish()
}

fn disk_io_metrics(
    req: &RequestSet,
    io: &DiskIoCounters,
    previous: Option<CounterSample>,
    now: Instant,
) -> (MetricMap, CounterSample) {
    let mut out = Emitter::new(req);
    out.put("disk_read_bytes", io.read_bytes);
    out.put("disk_write_bytes", io.write_bytes);
    out.put("disk_read_count", io.read_count);
    out.put("disk_write_count", io.write_count);

    let current = [io.read_bytes, io.write_bytes];
    if let Some(prev) = previous {
        let [read, write] = prev.rates_to(current, now);
        out.put_opt("disk_read_bytes_per_sec", read.map(|r| round_to(r, 2)));
        out.put_opt("disk_write_bytes_per_sec", write.map(|r| round_to(r, 2)));
    }
    (out.finish(), CounterSample::new(current, now))
}

fn network_metrics(
    req: &RequestSet,
    io: &NetIoCounters,
    previous: Option<CounterSample>,
    now: Instant,
) -> (MetricMap, CounterSample) {
    let mut out = Emitter::new(req);
    out.put("network_bytes_sent", io.bytes_sent);
    out.put("network_bytes_recv", io.bytes_recv);
    out.put("network_packets_sent", io.packets_sent);
    out.put("network_packets_recv", io.packets_recv);
    out.put("network_errors_in", io.errors_in);
    out.put("network_errors_out", io.errors_out);

    let current = [io.bytes_sent, io.bytes_recv];
    if let Some(prev) = previous {
        let [sent, recv] = prev.rates_to(current, now);
        out.put_opt("network_bytes_sent_per_sec", sent.map(|r| round_to(r, 2)));
        out.put_opt("network_bytes_recv_per_sec", recv.map(|r| round_to(r, 2)));
    }
    (out.finish(), CounterSample::new(current, now))
}

fn host_metrics(req: &RequestSet, host: &HostInfo) -> MetricMap {
    let mut out = Emitter::new(req);
    out.put("system_uptime_seconds", host.uptime_secs as f64);
    out.put("boot_time_unix", host.boot_time);
    out.put_opt("os_platform", host.platform.clone());
    out.put_opt("os_version", host.platform_version.clone());
    out.put_opt("hostname", host.hostname.clone());
    out.put_opt("kernel_version", host.kernel_version.clone());
    out.finish()
}
