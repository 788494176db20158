// Requested system metrics and the probe groups they require

use std::collections::{BTreeSet, HashSet};

/// A subsystem probe. Every metric in a group is derived from one query of that subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricGroup {
    CpuUsage,
    CpuInfo,
    Memory,
    Swap,
    DiskUsage,
    DiskIo,
    Network,
    Connections,
    ProcessCount,
    HostInfo,
}

impl MetricGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricGroup::CpuUsage => "cpu_usage",
            MetricGroup::CpuInfo => "cpu_info",
            MetricGroup::Memory => "memory",
            MetricGroup::Swap => "swap",
            MetricGroup::DiskUsage => "disk_usage",
            MetricGroup::DiskIo => "disk_io",
            MetricGroup::Network => "network_io",
            MetricGroup::Connections => "connections",
            MetricGroup::ProcessCount => "process_count",
            MetricGroup::HostInfo => "host_info",
        }
    }
}

/// Every requestable system metric and the group that produces it.
pub const SYSTEM_METRICS: &[(&str, MetricGroup)] = &[
    ("cpu_usage_percent", MetricGroup::CpuUsage),
    ("cpu_usage_per_core", MetricGroup::CpuUsage),
    ("cpu_count", MetricGroup::CpuInfo),
    ("cpu_count_physical", MetricGroup::CpuInfo),
    ("cpu_load_1min", MetricGroup::CpuInfo),
    ("cpu_load_5min", MetricGroup::CpuInfo),
    ("cpu_load_15min", MetricGroup::CpuInfo),
    ("ram_usage_percent", MetricGroup::Memory),
    ("available_ram_mb", MetricGroup::Memory),
    ("total_ram_mb", MetricGroup::Memory),
    ("ram_cached_mb", MetricGroup::Memory),
    ("ram_buffers_mb", MetricGroup::Memory),
    ("swap_usage_percent", MetricGroup::Swap),
    ("swap_total_mb", MetricGroup::Swap),
    ("swap_used_mb", MetricGroup::Swap),
    ("disk_usage_percent", MetricGroup::DiskUsage),
    ("available_disk_gb", MetricGroup::DiskUsage),
    ("total_disk_gb", MetricGroup::DiskUsage),
    ("inode_usage_percent", MetricGroup::DiskUsage),
    ("disk_read_bytes", MetricGroup::DiskIo),
    ("disk_write_bytes", MetricGroup::DiskIo),
    ("disk_read_count", MetricGroup::DiskIo),
    ("disk_write_count", MetricGroup::DiskIo),
    ("disk_read_bytes_per_sec", MetricGroup::DiskIo),
    ("disk_write_bytes_per_sec", MetricGroup::DiskIo),
    ("network_bytes_sent", MetricGroup::Network),
    ("network_bytes_recv", MetricGroup::Network),
    ("network_packets_sent", MetricGroup::Network),
    ("network_packets_recv", MetricGroup::Network),
    ("network_errors_in", MetricGroup::Network),
    ("network_errors_out", MetricGroup::Network),
    ("network_bytes_sent_per_sec", MetricGroup::Network),
    ("network_bytes_recv_per_sec", MetricGroup::Network),
    ("active_connections", MetricGroup::Connections),
    ("process_count", MetricGroup::ProcessCount),
    ("system_uptime_seconds", MetricGroup::HostInfo),
    ("boot_time_unix", MetricGroup::HostInfo),
    ("os_platform", MetricGroup::HostInfo),
    ("os_version", MetricGroup::HostInfo),
    ("hostname", MetricGroup::HostInfo),
    ("kernel_version", MetricGroup::HostInfo),
];

/// Group of a known system metric name.
pub fn group_of(name: &str) -> Option<MetricGroup> {
    SYSTEM_METRICS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, g)| *g)
}

/// Requested system metrics, fixed at startup. Unknown names are dropped here;
/// config validation rejects them before we get this far.
#[derive(Debug, Clone, Default)]
pub struct RequestSet {
    names: HashSet<String>,
    groups: BTreeSet<MetricGroup>,
}

impl RequestSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = RequestSet::default();
        for name in names {
            let name = name.into();
            if let Some(group) = group_of(&name) {
                set.groups.insert(group);
                set.names.insert(name);
            }
        }
        set
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether any metric of `group` was requested.
    pub fn needs(&self, group: MetricGroup) -> bool {
        self.groups.contains(&group)
    }

    pub fn groups(&self) -> impl Iterator<Item = MetricGroup> + '_ {
        self.groups.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
