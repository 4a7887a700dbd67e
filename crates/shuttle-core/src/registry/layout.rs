//! Path construction for one registry root.
//!
//! ```text
//! <root>/
//!   manifests/registry.ollama.ai/<namespace>/<model>/<version>
//!   blobs/<digest-with-dashes>
//! ```

use crate::config::{ManagedInstallConfig, RegistryConfig};
use std::path::{Path, PathBuf};

/// Convert a manifest digest (`sha256:abc`) into its blob filename (`sha256-abc`).
pub fn digest_to_filename(digest: &str) -> String {
    digest.replace(':', "-")
}

/// Paths inside a single registry root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLayout {
    root: PathBuf,
}

impl RegistryLayout {
    /// Create a layout rooted at `root` (the directory holding `blobs/` and `manifests/`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the registry root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/manifests`
    pub fn manifests_root(&self) -> PathBuf {
        self.root.join(RegistryConfig::MANIFESTS_DIR_NAME)
    }

    /// `<root>/manifests/registry.ollama.ai`, the directory holding namespaces.
    pub fn manifests_dir(&self) -> PathBuf {
        self.manifests_root().join(RegistryConfig::REGISTRY_HOST)
    }

    /// `<root>/blobs`
    pub fn blobs_dir(&self) -> PathBuf {
        self.root.join(RegistryConfig::BLOBS_DIR_NAME)
    }

    /// Path of a blob file. Accepts either digest spelling.
    pub fn blob_path(&self, digest: &str) -> PathBuf {
        self.blobs_dir().join(digest_to_filename(digest))
    }

    /// Path of the manifest file for one model version.
    pub fn manifest_path(&self, namespace: &str, model: &str, version: &str) -> PathBuf {
        self.manifests_dir().join(namespace).join(model).join(version)
    }

    /// Returns true if both layouts point at the same directory on disk.
    ///
    /// Falls back to comparing the paths as given when either side cannot be
    /// canonicalized (for example, a destination that does not exist yet).
    pub fn is_same_registry(&self, other: &RegistryLayout) -> bool {
        match (self.root.canonicalize(), other.root.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => normalize_components(&self.root) == normalize_components(&other.root),
        }
    }

    /// Returns true if this registry is the system-wide managed install.
    pub fn is_managed_install(&self) -> bool {
        let managed = Path::new(ManagedInstallConfig::MODELS_DIR);
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| normalize_components(&self.root));
        root == managed
    }
}

/// Drops interior `.` components; trailing separators are already ignored by `Path` equality.
fn normalize_components(path: &Path) -> PathBuf {
    path.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_to_filename() {
        assert_eq!(digest_to_filename("sha256:abc123"), "sha256-abc123");
        assert_eq!(digest_to_filename("sha256-abc123"), "sha256-abc123");
    }

    #[test]
    fn test_layout_paths() {
        let layout = RegistryLayout::new("/data/models");
        assert_eq!(
            layout.manifests_dir(),
            PathBuf::from("/data/models/manifests/registry.ollama.ai")
        );
        assert_eq!(
            layout.blob_path("sha256:ff"),
            PathBuf::from("/data/models/blobs/sha256-ff")
        );
        assert_eq!(
            layout.manifest_path("library", "llama3", "8b"),
            PathBuf::from("/data/models/manifests/registry.ollama.ai/library/llama3/8b")
        );
    }

    #[test]
    fn test_same_registry_with_trailing_slash() {
        let a = RegistryLayout::new("/nonexistent/models/");
        let b = RegistryLayout::new("/nonexistent/models");
        assert!(a.is_same_registry(&b));
        assert!(!a.is_same_registry(&RegistryLayout::new("/nonexistent/other")));
    }

    #[test]
    fn test_same_registry_through_dot_components() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let a = RegistryLayout::new(temp_dir.path());
        let b = RegistryLayout::new(temp_dir.path().join("."));
        assert!(a.is_same_registry(&b));
    }

    #[test]
    fn test_managed_install_detection() {
        if !Path::new(ManagedInstallConfig::MODELS_DIR).exists() {
            assert!(RegistryLayout::new("/usr/share/ollama/.ollama/models/").is_managed_install());
        }
        assert!(!RegistryLayout::new("/tmp/some/models").is_managed_install());
    }
}
