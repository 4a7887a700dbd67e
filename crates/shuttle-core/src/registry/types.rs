//! Types describing models and their blobs.

use crate::config::RegistryConfig;
use crate::registry::layout::RegistryLayout;
use serde::Serialize;
use std::path::PathBuf;

/// One model version found in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub namespace: String,
    pub model: String,
    /// Tag, e.g. `latest` or `8b-instruct-q4_0`
    pub version: String,
    /// `{namespace/}{model}:{version}`, namespace omitted for `library`
    pub display_name: String,
    pub manifest_path: PathBuf,
}

impl ModelDescriptor {
    /// Build a descriptor for a model version inside `layout`.
    pub fn new(
        layout: &RegistryLayout,
        namespace: impl Into<String>,
        model: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        let model = model.into();
        let version = version.into();
        let manifest_path = layout.manifest_path(&namespace, &model, &version);
        let display_name = Self::display_name_for(&namespace, &model, &version);

        Self {
            namespace,
            model,
            version,
            display_name,
            manifest_path,
        }
    }

    /// Canonical display name for a (namespace, model, version) triple.
    pub fn display_name_for(namespace: &str, model: &str, version: &str) -> String {
        if namespace == RegistryConfig::DEFAULT_NAMESPACE {
            format!("{}:{}", model, version)
        } else {
            format!("{}/{}:{}", namespace, model, version)
        }
    }
}

/// Whether a blob is the model config or one of its layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobRole {
    Config,
    Layer,
}

/// A content-addressed dependency of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobReference {
    /// Digest in filename form (`sha256-...`)
    pub digest: String,
    /// Size declared by the manifest
    pub size: u64,
    pub role: BlobRole,
}

impl BlobReference {
    pub fn is_config_blob(&self) -> bool {
        self.role == BlobRole::Config
    }
}

/// A model descriptor together with its resolved blob list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModel {
    pub descriptor: ModelDescriptor,
    /// Media type declared by the manifest, if any.
    pub media_type: Option<String>,
    /// Config blob first, then layers in resolver order.
    pub blobs: Vec<BlobReference>,
}

impl ResolvedModel {
    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    /// Sum of config and layer sizes as declared by the manifest.
    pub fn total_size(&self) -> u64 {
        self.blobs.iter().map(|b| b.size).sum()
    }

    /// The config blob, if the manifest declared one.
    pub fn config(&self) -> Option<&BlobReference> {
        self.blobs.iter().find(|b| b.is_config_blob())
    }

    pub fn layers(&self) -> impl Iterator<Item = &BlobReference> {
        self.blobs.iter().filter(|b| !b.is_config_blob())
    }

    /// Every file belonging to the model: the manifest, then each blob in order.
    pub fn files(&self) -> Vec<ModelFile> {
        let mut files = Vec::with_capacity(self.blobs.len() + 1);
        files.push(ModelFile {
            kind: ModelFileKind::Manifest,
            name: self.descriptor.version.clone(),
            digest: None,
        });
        files.extend(self.blobs.iter().map(|blob| ModelFile {
            kind: match blob.role {
                BlobRole::Config => ModelFileKind::Config,
                BlobRole::Layer => ModelFileKind::Layer,
            },
            name: blob.digest.clone(),
            digest: Some(blob.digest.clone()),
        }));
        files
    }
}

/// Kind of file a model consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFileKind {
    Manifest,
    Config,
    Layer,
}

/// One file of a model, independent of which registry it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelFile {
    pub kind: ModelFileKind,
    /// Filename on disk (the version tag for manifests, the digest for blobs)
    pub name: String,
    /// Digest for blob files; manifests have none.
    pub digest: Option<String>,
}

impl ModelFile {
    pub fn is_manifest(&self) -> bool {
        self.kind == ModelFileKind::Manifest
    }

    /// Location of this file for `descriptor` inside `layout`.
    pub fn path_in(&self, layout: &RegistryLayout, descriptor: &ModelDescriptor) -> PathBuf {
        match &self.digest {
            Some(digest) => layout.blob_path(digest),
            None => layout.manifest_path(
                &descriptor.namespace,
                &descriptor.model,
                &descriptor.version,
            ),
        }
    }
}
