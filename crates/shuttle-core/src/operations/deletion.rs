//! Reference-aware model deletion.
//!
//! A blob is only removed when no other model in the [`RegistryIndex`] still
//! references it. Permissions for every file are checked before anything is
//! removed.

use crate::error::{Result, ShuttleError};
use crate::platform::can_remove;
use crate::registry::{ModelFile, RegistryIndex, RegistryLayout, ResolvedModel};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// What happened to one file during deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalStatus {
    Removed,
    /// Still referenced by the listed models.
    SkippedShared { holders: Vec<String> },
    /// `remove_file` failed; deletion carried on with the remaining files.
    Failed { message: String },
}

/// One file's deletion record.
#[derive(Debug, Clone)]
pub struct FileRemoval {
    pub file: ModelFile,
    pub path: PathBuf,
    pub status: RemovalStatus,
}

/// Result of deleting one model.
#[derive(Debug, Clone)]
pub struct DeletionResult {
    pub model: String,
    pub files: Vec<FileRemoval>,
    /// The manifest directory, if it ended up empty and was removed.
    pub pruned_dir: Option<PathBuf>,
}

impl DeletionResult {
    pub fn removed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == RemovalStatus::Removed)
            .count()
    }

    /// Files kept because other models still reference them.
    pub fn shared(&self) -> impl Iterator<Item = &FileRemoval> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, RemovalStatus::SkippedShared { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, RemovalStatus::Failed { .. }))
            .count()
    }
}

/// Delete a model's manifest and every blob no other model references.
///
/// The index must describe `layout` as it was before this deletion. Only
/// `model` itself is excluded when checking references, so models deleted
/// earlier in the same batch still count as holders.
///
/// # Errors
///
/// [`ShuttleError::PermissionDenied`] if any file fails the preflight check;
/// nothing is removed in that case.
pub fn delete_model(
    layout: &RegistryLayout,
    model: &ResolvedModel,
    index: &RegistryIndex,
) -> Result<DeletionResult> {
    let descriptor = &model.descriptor;
    let targets: Vec<(ModelFile, PathBuf)> = model
        .files()
        .into_iter()
        .map(|file| {
            let path = file.path_in(layout, descriptor);
            (file, path)
        })
        .collect();

    if let Some((_, path)) = targets.iter().find(|(_, path)| !can_remove(path)) {
        warn!("Permission denied: {}", path.display());
        warn!("Lacking necessary permissions to delete all files of {}", model.display_name());
        return Err(ShuttleError::PermissionDenied(path.clone()));
    }

    let mut files = Vec::with_capacity(targets.len());
    for (file, path) in targets {
        let holders: Vec<String> = match &file.digest {
            Some(digest) => index
                .references_excluding(digest, model.display_name())
                .into_iter()
                .collect(),
            None => Vec::new(),
        };

        let status = if !holders.is_empty() {
            info!("Skipped: {} is also used by [{}]", file.name, holders.join(", "));
            RemovalStatus::SkippedShared { holders }
        } else {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Deleted: {}", path.display());
                    RemovalStatus::Removed
                }
                Err(e) => {
                    warn!("Error deleting {}: {}", path.display(), e);
                    RemovalStatus::Failed {
                        message: e.to_string(),
                    }
                }
            }
        };

        files.push(FileRemoval { file, path, status });
    }

    let pruned_dir = prune_manifest_dir(descriptor.manifest_path.parent().map(PathBuf::from));

    info!("Deleted model {}", model.display_name());
    Ok(DeletionResult {
        model: model.display_name().to_string(),
        files,
        pruned_dir,
    })
}

/// Remove the model's manifest directory if nothing is left in it.
fn prune_manifest_dir(dir: Option<PathBuf>) -> Option<PathBuf> {
    let dir = dir?;
    let is_empty = match fs::read_dir(&dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => return None,
    };
    if !is_empty {
        return None;
    }

    match fs::remove_dir(&dir) {
        Ok(()) => {
            info!("Deleted empty directory: {}", dir.display());
            Some(dir)
        }
        Err(e) => {
            warn!("Error deleting directory {}: {}", dir.display(), e);
            None
        }
    }
}
