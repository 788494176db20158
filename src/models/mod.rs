// Domain models: metric values, requested metric set, raw probe results

mod metric;
mod request;
mod system;

pub use metric::{
    BYTES_PER_GB, BYTES_PER_MB, MetricMap, MetricValue, bytes_to_gb, bytes_to_mb, round_to,
};
pub use request::{MetricGroup, RequestSet, SYSTEM_METRICS, group_of};
pub use system::{
    CpuInfo, CpuUsage, DiskIoCounters, DiskUsage, HostInfo, MemoryStats, NetIoCounters, SwapStats,
};
