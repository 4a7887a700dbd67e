//! Manifest parsing and resolution into blob references.

use crate::config::RegistryConfig;
use crate::error::{Result, ShuttleError};
use crate::registry::layout::digest_to_filename;
use crate::registry::types::{BlobReference, BlobRole, ModelDescriptor, ResolvedModel};
use serde::Deserialize;
use std::path::Path;

/// The parts of an Ollama manifest this tool reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub media_type: Option<String>,
    pub config: ManifestEntry,
    pub layers: Vec<ManifestEntry>,
}

/// A digest/size pair from `config` or `layers[]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub digest: String,
    pub size: u64,
}

impl Manifest {
    /// Read and parse a manifest file.
    ///
    /// A missing file and malformed JSON both surface as
    /// [`ShuttleError::ManifestParse`].
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ShuttleError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
            source: None,
        })?;

        serde_json::from_str(&contents).map_err(|e| ShuttleError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
            source: Some(e),
        })
    }

    pub fn is_supported_media_type(&self) -> bool {
        self.media_type
            .as_deref()
            .is_some_and(|mt| RegistryConfig::SUPPORTED_MEDIA_TYPES.contains(&mt))
    }
}

/// Order in which layer blobs are listed after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOrder {
    /// Keep the manifest's own order.
    Manifest,
    /// Largest layer first, so big transfers start immediately.
    LargestFirst,
}

/// Turns a descriptor into a [`ResolvedModel`].
#[derive(Debug, Clone, Copy)]
pub struct ManifestResolver {
    layer_order: LayerOrder,
    validate_media_type: bool,
}

impl ManifestResolver {
    pub fn new(layer_order: LayerOrder, validate_media_type: bool) -> Self {
        Self {
            layer_order,
            validate_media_type,
        }
    }

    /// Resolver for copy and move: largest layers first, media type checked.
    pub fn for_copy() -> Self {
        Self::new(LayerOrder::LargestFirst, true)
    }

    /// Resolver for deletion and index building: manifest order, no media type check.
    pub fn for_delete() -> Self {
        Self::new(LayerOrder::Manifest, false)
    }

    /// Resolve a model's manifest into its blob list.
    ///
    /// The config blob always comes first.
    pub fn resolve(&self, descriptor: &ModelDescriptor) -> Result<ResolvedModel> {
        let manifest = Manifest::read(&descriptor.manifest_path)?;

        if self.validate_media_type && !manifest.is_supported_media_type() {
            return Err(ShuttleError::UnsupportedMediaType {
                model: descriptor.display_name.clone(),
                media_type: manifest
                    .media_type
                    .clone()
                    .unwrap_or_else(|| "<missing>".to_string()),
            });
        }

        let mut layers = manifest.layers;
        if self.layer_order == LayerOrder::LargestFirst {
            // Stable, so equal-sized layers keep manifest order.
            layers.sort_by(|a, b| b.size.cmp(&a.size));
        }

        let mut blobs = Vec::with_capacity(layers.len() + 1);
        blobs.push(BlobReference {
            digest: digest_to_filename(&manifest.config.digest),
            size: manifest.config.size,
            role: BlobRole::Config,
        });
        blobs.extend(layers.into_iter().map(|layer| BlobReference {
            digest: digest_to_filename(&layer.digest),
            size: layer.size,
            role: BlobRole::Layer,
        }));

        Ok(ResolvedModel {
            descriptor: descriptor.clone(),
            media_type: manifest.media_type,
            blobs,
        })
    }
}
