//! Deduplication accounting across a whole registry.
//!
//! The index maps each blob digest to the display names of every model that
//! references it. Deletion consults it before removing any blob, so it is
//! rebuilt from disk before every delete or move and passed around as a value.

use crate::error::Result;
use crate::registry::layout::{digest_to_filename, RegistryLayout};
use crate::registry::manifest::ManifestResolver;
use crate::registry::scanner::scan;
use crate::registry::types::ResolvedModel;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

/// A model whose manifest could not be resolved while building the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedManifest {
    pub model: String,
    pub reason: String,
}

/// Reverse blob references and deduplicated size for one registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    /// digest → display names referencing it
    references: HashMap<String, BTreeSet<String>>,
    /// digest → size, first size seen wins
    blob_sizes: HashMap<String, u64>,
    deduplicated_size: u64,
    summed_size: u64,
    model_count: usize,
    skipped: Vec<SkippedManifest>,
}

impl RegistryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one model's blobs into the index.
    pub fn insert(&mut self, model: &ResolvedModel) {
        let name = model.display_name();
        for blob in &model.blobs {
            self.references
                .entry(blob.digest.clone())
                .or_default()
                .insert(name.to_string());

            if !self.blob_sizes.contains_key(&blob.digest) {
                self.blob_sizes.insert(blob.digest.clone(), blob.size);
                self.deduplicated_size += blob.size;
            }
        }
        self.summed_size += model.total_size();
        self.model_count += 1;
    }

    /// Record a model left out of the index.
    pub fn record_skipped(&mut self, model: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedManifest {
            model: model.into(),
            reason: reason.into(),
        });
    }

    /// Display names of every model referencing `digest`.
    ///
    /// Accepts either digest spelling (`sha256:` or `sha256-`).
    pub fn references(&self, digest: &str) -> Option<&BTreeSet<String>> {
        self.references.get(&digest_to_filename(digest))
    }

    /// Models other than `exclude_model` that still reference `digest`.
    ///
    /// A non-empty result means the blob must not be deleted.
    pub fn references_excluding(&self, digest: &str, exclude_model: &str) -> BTreeSet<String> {
        self.references(digest)
            .map(|names| {
                names
                    .iter()
                    .filter(|name| name.as_str() != exclude_model)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total size counting each distinct blob once.
    pub fn deduplicated_size(&self) -> u64 {
        self.deduplicated_size
    }

    /// Total size if every model's blobs were stored separately.
    pub fn summed_size(&self) -> u64 {
        self.summed_size
    }

    /// Number of distinct blobs referenced.
    pub fn blob_count(&self) -> usize {
        self.blob_sizes.len()
    }

    /// Number of models folded into the index.
    pub fn model_count(&self) -> usize {
        self.model_count
    }

    /// Digests referenced by more than one model.
    pub fn shared_digests(&self) -> Vec<&str> {
        let mut shared: Vec<&str> = self
            .references
            .iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(digest, _)| digest.as_str())
            .collect();
        shared.sort_unstable();
        shared
    }

    /// Models whose manifests could not be read.
    pub fn skipped(&self) -> &[SkippedManifest] {
        &self.skipped
    }
}

/// Scan `layout` and index every model in it.
///
/// Scanner failures are fatal; an unreadable manifest only drops that model
/// from the index with a warning.
pub fn build_index(layout: &RegistryLayout) -> Result<RegistryIndex> {
    let resolver = ManifestResolver::for_delete();
    let mut index = RegistryIndex::new();

    for descriptor in scan(layout)? {
        match resolver.resolve(&descriptor) {
            Ok(model) => index.insert(&model),
            Err(e) => {
                warn!("Error reading manifest for {}: {}", descriptor.display_name, e);
                index.record_skipped(descriptor.display_name, e.to_string());
            }
        }
    }

    info!(
        "Indexed {} models, {} blobs ({} bytes deduplicated)",
        index.model_count(),
        index.blob_count(),
        index.deduplicated_size()
    );
    Ok(index)
}
