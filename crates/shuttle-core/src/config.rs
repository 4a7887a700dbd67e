//! Centralized configuration for shuttle-core.
//!
//! The registry layout is fixed by Ollama, so everything here is a constant.

/// On-disk registry layout.
pub struct RegistryConfig;

impl RegistryConfig {
    pub const MANIFESTS_DIR_NAME: &'static str = "manifests";
    pub const REGISTRY_HOST: &'static str = "registry.ollama.ai";
    pub const BLOBS_DIR_NAME: &'static str = "blobs";
    /// Namespace elided from display names.
    pub const DEFAULT_NAMESPACE: &'static str = "library";
    pub const DEFAULT_TAG: &'static str = "latest";
    /// Manifest media types the tool understands.
    pub const SUPPORTED_MEDIA_TYPES: &'static [&'static str] = &[
        "application/vnd.docker.distribution.manifest.v2+json",
        "application/vnd.docker.container.image.v1+json",
    ];
}

/// Blob copy tuning.
pub struct TransferConfig;

impl TransferConfig {
    pub const COPY_CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB
}

/// The system-wide Ollama install whose files belong to a service account.
pub struct ManagedInstallConfig;

impl ManagedInstallConfig {
    pub const MODELS_DIR: &'static str = "/usr/share/ollama/.ollama/models";
    pub const USER: &'static str = "ollama";
    pub const GROUP: &'static str = "ollama";
    pub const FILE_MODE: u32 = 0o644;
    pub const DIR_MODE: u32 = 0o755;
}
