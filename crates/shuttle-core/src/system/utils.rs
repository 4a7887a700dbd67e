//! Disk space lookup and size formatting.

use crate::error::{Result, ShuttleError};
use serde::Serialize;
use std::path::Path;

/// Decimal size units, as `du --si` prints them.
const SIZE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Disk space information.
#[derive(Debug, Clone, Serialize)]
pub struct DiskSpaceInfo {
    /// Total space in bytes.
    pub total: u64,
    /// Used space in bytes.
    pub used: u64,
    /// Free space in bytes.
    pub free: u64,
    /// Usage percentage (0.0 - 100.0).
    pub percent: f32,
}

impl DiskSpaceInfo {
    fn from_disk(disk: &sysinfo::Disk) -> Self {
        let total = disk.total_space();
        let free = disk.available_space();
        let used = total.saturating_sub(free);
        let percent = if total > 0 {
            (used as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        Self {
            total,
            used,
            free,
            percent: (percent * 10.0).round() / 10.0, // Round to 1 decimal
        }
    }
}

/// Get disk space information for the filesystem containing `path`.
///
/// Picks the disk with the longest mount point that prefixes the path.
pub fn disk_space_for_path(path: &Path) -> Result<DiskSpaceInfo> {
    use sysinfo::Disks;

    let disks = Disks::new_with_refreshed_list();
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    let best_match = disks
        .list()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len());

    if let Some(disk) = best_match.or_else(|| disks.list().first()) {
        return Ok(DiskSpaceInfo::from_disk(disk));
    }

    Err(ShuttleError::Other(format!(
        "Could not determine disk space for {}",
        path.display()
    )))
}

/// Format a byte count with decimal units, rounded to two decimals.
///
/// ```
/// use shuttle_core::system::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1_500_000_000), "1.5 GB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }

    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}
