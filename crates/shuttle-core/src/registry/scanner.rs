//! Registry discovery.
//!
//! Enumerates every `<namespace>/<model>/<version>` manifest under
//! `manifests/registry.ollama.ai`.

use crate::error::{Result, ShuttleError};
use crate::registry::layout::RegistryLayout;
use crate::registry::types::ModelDescriptor;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Depth of a manifest file below the manifests directory.
const MANIFEST_DEPTH: usize = 3;

/// List the namespace directories of a registry.
pub fn list_namespaces(layout: &RegistryLayout) -> Result<Vec<String>> {
    let manifests_dir = layout.manifests_dir();
    if !manifests_dir.is_dir() {
        return Err(ShuttleError::ManifestsNotFound(manifests_dir));
    }

    let entries = std::fs::read_dir(&manifests_dir)
        .map_err(|e| ShuttleError::io_with_path(e, &manifests_dir))?;

    let mut namespaces = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ShuttleError::io_with_path(e, &manifests_dir))?;
        if entry.path().is_dir() {
            namespaces.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(namespaces)
}

/// Scan a registry for model versions.
///
/// Descriptors come back in filesystem listing order; sort by
/// `display_name` when a stable order matters.
///
/// # Errors
///
/// - [`ShuttleError::ManifestsNotFound`] if the manifests directory is absent
/// - [`ShuttleError::EmptyRegistry`] if there are no namespaces or no models
pub fn scan(layout: &RegistryLayout) -> Result<Vec<ModelDescriptor>> {
    let namespaces = list_namespaces(layout)?;
    if namespaces.is_empty() {
        return Err(ShuttleError::EmptyRegistry {
            root: layout.root().to_path_buf(),
            reason: "no namespaces found".to_string(),
        });
    }

    let manifests_dir = layout.manifests_dir();
    let mut models = Vec::new();
    // Every manifest must be seen: the index built from this scan decides
    // which blobs deletion may remove.
    for entry in WalkDir::new(&manifests_dir)
        .follow_links(true)
        .min_depth(MANIFEST_DEPTH)
        .max_depth(MANIFEST_DEPTH)
    {
        let entry = entry.map_err(|e| walk_error(e, &manifests_dir))?;
        if !entry.file_type().is_file() {
            debug!("Ignoring non-file manifest entry: {}", entry.path().display());
            continue;
        }
        if let Some(descriptor) = descriptor_for(layout, &manifests_dir, entry.path()) {
            models.push(descriptor);
        }
    }

    if models.is_empty() {
        return Err(ShuttleError::EmptyRegistry {
            root: layout.root().to_path_buf(),
            reason: "no models found".to_string(),
        });
    }

    info!("Namespaces: {:?}", namespaces);
    info!("Total models: {}", models.len());
    Ok(models)
}

/// Turn a walk failure (unreadable directory, broken link, link loop) into an error.
fn walk_error(err: walkdir::Error, manifests_dir: &Path) -> ShuttleError {
    let path = err.path().unwrap_or(manifests_dir).to_path_buf();
    let message = err.to_string();
    match err.into_io_error() {
        Some(io) => ShuttleError::io_with_path(io, path),
        None => ShuttleError::Io {
            message,
            path: Some(path),
            source: None,
        },
    }
}

fn descriptor_for(
    layout: &RegistryLayout,
    manifests_dir: &Path,
    manifest_path: &Path,
) -> Option<ModelDescriptor> {
    let relative = manifest_path.strip_prefix(manifests_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    match parts.as_slice() {
        [namespace, model, version] => {
            Some(ModelDescriptor::new(layout, namespace, model, version))
        }
        _ => {
            debug!("Ignoring unexpected manifest path: {}", manifest_path.display());
            None
        }
    }
}
