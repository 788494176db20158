// Linux-specific helpers: /proc/meminfo, /proc/diskstats, /proc/net socket tables.

use crate::models::DiskIoCounters;

/// Bytes per sector as reported by /proc/diskstats (fixed by the kernel, not the device).
const DISKSTATS_SECTOR_SIZE: u64 = 512;

/// Socket tables counted for `active_connections` (inet v4/v6 TCP and UDP, unix).
const SOCKET_TABLES: &[&str] = &[
    "/proc/net/tcp",
    "/proc/net/tcp6",
    "/proc/net/udp",
    "/proc/net/udp6",
    "/proc/net/unix",
];

/// Read (cached, buffers) in bytes from /proc/meminfo. sysinfo does not expose these.
pub(super) fn read_cached_and_buffers() -> (Option<u64>, Option<u64>) {
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/proc/meminfo") {
            return parse_meminfo(&content);
        }
    }
    (None, None)
}

/// Sum disk counters from /proc/diskstats over whole devices. `None` off Linux.
pub(super) fn read_disk_io_counters() -> Option<DiskIoCounters> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/diskstats").ok()?;
        return Some(parse_diskstats(&content, is_whole_disk));
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Count open sockets across the /proc/net tables. `None` when no table is readable.
pub(super) fn count_sockets() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let mut found = false;
        let mut total = 0u64;
        for path in SOCKET_TABLES {
            if let Ok(content) = std::fs::read_to_string(path) {
                found = true;
                total += count_table_entries(&content);
            }
        }
        if found {
            return Some(total);
        }
    }
    None
}

/// Partitions and virtual devices would double count the bytes of their parent disk.
#[cfg(target_os = "linux")]
fn is_whole_disk(name: &str) -> bool {
    if name.starts_with("loop") || name.starts_with("ram") {
        return false;
    }
    std::path::Path::new("/sys/block").join(name).exists()
}

pub(super) fn parse_meminfo(content: &str) -> (Option<u64>, Option<u64>) {
    let mut cached = None;
    let mut buffers = None;
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let kib = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok());
        match key.trim() {
            "Cached" => cached = kib.map(|v| v * 1024),
            "Buffers" => buffers = kib.map(|v| v * 1024),
            _ => {}
        }
    }
    (cached, buffers)
}

pub(super) fn parse_diskstats(content: &str, include: impl Fn(&str) -> bool) -> DiskIoCounters {
    let mut counters = DiskIoCounters {
        read_bytes: 0,
        write_bytes: 0,
        read_count: 0,
        write_count: 0,
    };
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 || !include(fields[2]) {
            continue;
        }
        let field = |i: usize| fields[i].parse::<u64>().unwrap_or(0);
        counters.read_count += field(3);
        counters.read_bytes += field(5) * DISKSTATS_SECTOR_SIZE;
        counters.write_count += field(7);
        counters.write_bytes += field(9) * DISKSTATS_SECTOR_SIZE;
    }
    counters
}

/// Every /proc/net table has a single header line.
pub(super) fn count_table_entries(content: &str) -> u64 {
    content
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .count() as u64
}
