//! Registry fixtures for unit tests.

use crate::config::RegistryConfig;
use crate::registry::{ModelDescriptor, RegistryLayout};
use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::TempDir;

/// A throwaway registry in a temp directory with real content digests.
pub(crate) struct RegistryFixture {
    _dir: TempDir,
    layout: RegistryLayout,
}

impl RegistryFixture {
    /// Create an empty registry with `blobs/` and `manifests/registry.ollama.ai/`.
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout = RegistryLayout::new(dir.path().join("models"));
        std::fs::create_dir_all(layout.blobs_dir()).unwrap();
        std::fs::create_dir_all(layout.manifests_dir()).unwrap();
        Self { _dir: dir, layout }
    }

    pub(crate) fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    pub(crate) fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Store `content` as a blob and return its manifest-style digest.
    pub(crate) fn add_blob(&self, content: &[u8]) -> String {
        let digest = format!("sha256:{}", hex::encode(Sha256::digest(content)));
        std::fs::write(self.layout.blob_path(&digest), content).unwrap();
        digest
    }

    /// Write a manifest file verbatim.
    pub(crate) fn write_manifest(
        &self,
        namespace: &str,
        model: &str,
        version: &str,
        body: &str,
    ) -> ModelDescriptor {
        let descriptor = ModelDescriptor::new(&self.layout, namespace, model, version);
        std::fs::create_dir_all(descriptor.manifest_path.parent().unwrap()).unwrap();
        std::fs::write(&descriptor.manifest_path, body).unwrap();
        descriptor
    }

    /// Store the config and layer blobs and write a manifest referencing them.
    pub(crate) fn add_model(
        &self,
        namespace: &str,
        model: &str,
        version: &str,
        config: &[u8],
        layers: &[&[u8]],
    ) -> ModelDescriptor {
        let config_digest = self.add_blob(config);
        let layers: Vec<serde_json::Value> = layers
            .iter()
            .map(|content| {
                serde_json::json!({
                    "mediaType": "application/vnd.ollama.image.model",
                    "digest": self.add_blob(content),
                    "size": content.len(),
                })
            })
            .collect();
        let manifest = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": RegistryConfig::SUPPORTED_MEDIA_TYPES[0],
            "config": {
                "mediaType": RegistryConfig::SUPPORTED_MEDIA_TYPES[1],
                "digest": config_digest,
                "size": config.len(),
            },
            "layers": layers,
        });
        self.write_manifest(namespace, model, version, &manifest.to_string())
    }
}
