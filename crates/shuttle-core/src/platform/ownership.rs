//! Destination ownership policy.
//!
//! Files copied into the system-wide Ollama install must belong to the
//! service account or the daemon cannot read them. Everywhere else copied
//! files keep the ownership of the invoking user.

use crate::config::ManagedInstallConfig;
use crate::error::Result;
use crate::registry::RegistryLayout;
use std::path::Path;
use tracing::debug;

/// Applies ownership and permissions to files written into a registry.
pub trait OwnershipPolicy {
    /// Called for every copied file.
    fn apply_to_file(&self, path: &Path) -> Result<()>;

    /// Called for the directory a copied file was written into.
    fn apply_to_dir(&self, path: &Path) -> Result<()>;
}

/// Leaves ownership untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOwnership;

impl OwnershipPolicy for NoopOwnership {
    fn apply_to_file(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn apply_to_dir(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Resets ownership to a fixed user/group and normalizes permission bits.
#[derive(Debug, Clone)]
pub struct ServiceAccountOwnership {
    user: String,
    group: String,
    file_mode: u32,
    dir_mode: u32,
}

impl ServiceAccountOwnership {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
            file_mode: ManagedInstallConfig::FILE_MODE,
            dir_mode: ManagedInstallConfig::DIR_MODE,
        }
    }

    /// The `ollama:ollama` identity used by the system-wide install.
    pub fn managed_install() -> Self {
        Self::new(ManagedInstallConfig::USER, ManagedInstallConfig::GROUP)
    }

    #[cfg(unix)]
    fn apply(&self, path: &Path, mode: u32) -> Result<()> {
        use crate::error::ShuttleError;
        use nix::unistd::{chown, Group, User};
        use std::os::unix::fs::PermissionsExt;
        use tracing::warn;

        let to_io = |e: nix::Error| ShuttleError::io_with_path(std::io::Error::from(e), path);

        let Some(user) = User::from_name(&self.user).map_err(to_io)? else {
            warn!(
                "User '{}' not found, leaving ownership of {} unchanged",
                self.user,
                path.display()
            );
            return Ok(());
        };
        let Some(group) = Group::from_name(&self.group).map_err(to_io)? else {
            warn!(
                "Group '{}' not found, leaving ownership of {} unchanged",
                self.group,
                path.display()
            );
            return Ok(());
        };

        chown(path, Some(user.uid), Some(group.gid)).map_err(to_io)?;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| ShuttleError::io_with_path(e, path))?;
        debug!(
            "Set owner {}:{} mode {:o} on {}",
            self.user,
            self.group,
            mode,
            path.display()
        );
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply(&self, path: &Path, _mode: u32) -> Result<()> {
        debug!(
            "Skipping ownership reset on this platform for: {}",
            path.display()
        );
        Ok(())
    }
}

impl OwnershipPolicy for ServiceAccountOwnership {
    fn apply_to_file(&self, path: &Path) -> Result<()> {
        self.apply(path, self.file_mode)
    }

    fn apply_to_dir(&self, path: &Path) -> Result<()> {
        self.apply(path, self.dir_mode)
    }
}

/// Pick the ownership policy for a destination registry.
pub fn ownership_policy_for(destination: &RegistryLayout) -> Box<dyn OwnershipPolicy> {
    if destination.is_managed_install() {
        debug!(
            "Destination {} is the managed install, resetting ownership to {}:{}",
            destination.root().display(),
            ManagedInstallConfig::USER,
            ManagedInstallConfig::GROUP
        );
        Box::new(ServiceAccountOwnership::managed_install())
    } else {
        Box::new(NoopOwnership)
    }
}
