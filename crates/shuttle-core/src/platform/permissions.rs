//! Platform-specific file permission checks.
//!
//! Deletion checks every target up front so a model is never left half
//! deleted because of a permission gap discovered midway.

use serde::Serialize;
use std::path::Path;

/// Check whether the current process may write to `path`.
///
/// # Platform Behavior
/// - **Linux/macOS**: `access(2)` with `W_OK`, honouring the effective ids
/// - **Windows**: the file exists and is not read-only
pub fn is_writable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{access, AccessFlags};
        access(path, AccessFlags::W_OK).is_ok()
    }

    #[cfg(not(unix))]
    {
        std::fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }
}

/// Check whether `dir` can be listed and traversed.
pub fn is_searchable_dir(dir: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{access, AccessFlags};
        dir.is_dir() && access(dir, AccessFlags::R_OK | AccessFlags::X_OK).is_ok()
    }

    #[cfg(not(unix))]
    {
        dir.is_dir()
    }
}

/// Check whether `path` can be removed (or recreated).
///
/// True if the file itself is writable, or if its parent directory is both
/// writable and searchable.
pub fn can_remove(path: &Path) -> bool {
    if is_writable(path) {
        return true;
    }

    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return false,
    };
    is_searchable_dir(parent) && is_writable(parent)
}

/// Permission bits and effective access for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessSummary {
    /// Unix mode bits (`None` on platforms without them)
    pub mode: Option<u32>,
    pub readable: bool,
    pub writable: bool,
}

impl std::fmt::Display for AccessSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let access = match (self.readable, self.writable) {
            (true, true) => "read/write",
            (true, false) => "read-only",
            (false, true) => "write-only",
            (false, false) => "no access",
        };
        match self.mode {
            Some(mode) => write!(f, "{:o} ({})", mode & 0o7777, access),
            None => write!(f, "{}", access),
        }
    }
}

/// Describe the permission bits and effective access of `path`.
pub fn describe_access(path: &Path) -> AccessSummary {
    #[cfg(unix)]
    {
        use nix::unistd::{access, AccessFlags};
        use std::os::unix::fs::PermissionsExt;

        AccessSummary {
            mode: std::fs::metadata(path).ok().map(|m| m.permissions().mode()),
            readable: access(path, AccessFlags::R_OK).is_ok(),
            writable: access(path, AccessFlags::W_OK).is_ok(),
        }
    }

    #[cfg(not(unix))]
    {
        let metadata = std::fs::metadata(path).ok();
        AccessSummary {
            mode: None,
            readable: metadata.is_some(),
            writable: metadata.map(|m| !m.permissions().readonly()).unwrap_or(false),
        }
    }
}
