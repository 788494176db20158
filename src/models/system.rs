// Raw probe results from the sysinfo repo, one struct per subsystem query

/// CPU usage after a sampling interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuUsage {
    pub global_percent: f64,
    pub per_core_percent: Vec<f64>,
}

/// Core counts plus load averages.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuInfo {
    pub logical_cores: u64,
    pub physical_cores: Option<u64>,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
}

/// Byte values. `cached` and `buffers` are only known where the OS exposes them.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStats {
    pub total: u64,
    pub available: u64,
    pub cached: Option<u64>,
    pub buffers: Option<u64>,
}

impl MemoryStats {
    pub fn used_percent(&self) -> f64 {
        percent(self.total.saturating_sub(self.available), self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapStats {
    pub total: u64,
    pub used: u64,
}

impl SwapStats {
    pub fn used_percent(&self) -> f64 {
        percent(self.used, self.total)
    }
}

/// Filesystem usage for one mount point (bytes and inode counts).
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub inodes_total: Option<u64>,
    pub inodes_free: Option<u64>,
}

impl DiskUsage {
    /// Used share of the space visible to unprivileged users.
    pub fn used_percent(&self) -> f64 {
        percent(self.used, self.used + self.free)
    }

    pub fn inode_used_percent(&self) -> Option<f64> {
        let total = self.inodes_total?;
        let free = self.inodes_free?;
        Some(percent(total.saturating_sub(free), total))
    }
}

/// Cumulative block device counters summed over all physical disks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskIoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
}

/// Cumulative counters summed over all interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetIoCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errors_in: u64,
    pub errors_out: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    pub uptime_secs: u64,
    pub boot_time: u64,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub hostname: Option<String>,
    pub kernel_version: Option<String>,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}
