//! End-to-end tests of copy, move and delete on real registries in temp dirs.
//!
//! Fixtures are content-addressed: every blob is stored under the sha256 of
//! its bytes, so shared layers share a digest exactly as Ollama lays them out.

use sha2::{Digest, Sha256};
use shuttle_core::operations::{FileAction, RemovalStatus};
use shuttle_core::registry::{build_index, scan, ManifestResolver, ResolvedModel};
use shuttle_core::selection::select_models;
use shuttle_core::{delete_model, move_model, BlobTransfer, RegistryLayout, ShuttleError};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use walkdir::WalkDir;

struct Registry {
    _dir: TempDir,
    layout: RegistryLayout,
}

impl Registry {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let layout = RegistryLayout::new(dir.path().join("models"));
        fs::create_dir_all(layout.blobs_dir()).unwrap();
        fs::create_dir_all(layout.manifests_dir()).unwrap();
        Self { _dir: dir, layout }
    }

    fn blob(&self, content: &[u8]) -> String {
        let digest = format!("sha256:{}", hex::encode(Sha256::digest(content)));
        fs::write(self.layout.blob_path(&digest), content).unwrap();
        digest
    }

    fn model(&self, namespace: &str, name: &str, version: &str, config: &[u8], layers: &[&[u8]]) {
        let config_digest = self.blob(config);
        let layers: Vec<serde_json::Value> = layers
            .iter()
            .map(|l| serde_json::json!({ "digest": self.blob(l), "size": l.len() }))
            .collect();
        let manifest = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
            "config": { "digest": config_digest, "size": config.len() },
            "layers": layers,
        });
        let path = self.layout.manifest_path(namespace, name, version);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, manifest.to_string()).unwrap();
    }

    fn resolve(&self, display_name: &str, resolver: ManifestResolver) -> ResolvedModel {
        let descriptor = scan(&self.layout)
            .unwrap()
            .into_iter()
            .find(|d| d.display_name == display_name)
            .unwrap_or_else(|| panic!("{} not in registry", display_name));
        resolver.resolve(&descriptor).unwrap()
    }

    /// Relative path → contents of every file under the registry root.
    fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(self.layout.root())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(self.layout.root()).unwrap().to_path_buf();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }
}

#[test]
fn test_deduplicated_size_never_exceeds_sum() {
    let registry = Registry::new();
    registry.model("library", "a", "latest", b"cfg-a", &[b"unique-a"]);
    registry.model("library", "b", "latest", b"cfg-b", &[b"unique-b"]);

    let index = build_index(&registry.layout).unwrap();
    assert_eq!(index.deduplicated_size(), index.summed_size());

    registry.model("library", "c", "latest", b"cfg-c", &[b"unique-a"]);
    let index = build_index(&registry.layout).unwrap();
    assert!(index.deduplicated_size() < index.summed_size());
    assert_eq!(
        index.summed_size() - index.deduplicated_size(),
        b"unique-a".len() as u64
    );
}

#[test]
fn test_shared_layer_survives_until_last_holder_is_deleted() {
    let registry = Registry::new();
    registry.model("library", "a", "latest", b"cfg-a", &[b"shared-layer"]);
    registry.model("library", "b", "latest", b"cfg-b", &[b"shared-layer"]);

    let index = build_index(&registry.layout).unwrap();
    let a = registry.resolve("a:latest", ManifestResolver::for_delete());
    let shared = a.layers().next().unwrap().digest.clone();
    let a_config = a.config().unwrap().digest.clone();
    assert!(!index.references_excluding(&shared, "a:latest").is_empty());

    let result = delete_model(&registry.layout, &a, &index).unwrap();
    assert_eq!(result.shared().count(), 1);
    assert!(registry.layout.blob_path(&shared).exists());
    assert!(!registry.layout.blob_path(&a_config).exists());

    // Fresh index: b is now the only holder.
    let index = build_index(&registry.layout).unwrap();
    let b = registry.resolve("b:latest", ManifestResolver::for_delete());
    let result = delete_model(&registry.layout, &b, &index).unwrap();
    assert_eq!(result.shared().count(), 0);
    assert!(result
        .files
        .iter()
        .all(|f| f.status == RemovalStatus::Removed));
    assert!(!registry.layout.blob_path(&shared).exists());
}

#[test]
fn test_batch_delete_with_one_index_keeps_shared_blob() {
    let registry = Registry::new();
    registry.model("library", "a", "latest", b"cfg-a", &[b"shared-layer"]);
    registry.model("library", "b", "latest", b"cfg-b", &[b"shared-layer"]);

    let index = build_index(&registry.layout).unwrap();
    let a = registry.resolve("a:latest", ManifestResolver::for_delete());
    let b = registry.resolve("b:latest", ManifestResolver::for_delete());
    let shared = a.layers().next().unwrap().digest.clone();

    delete_model(&registry.layout, &a, &index).unwrap();
    delete_model(&registry.layout, &b, &index).unwrap();

    assert!(registry.layout.blob_path(&shared).exists());
}

#[cfg(unix)]
#[test]
fn test_symlinked_model_dir_still_protects_shared_layer() {
    use std::os::unix::fs::symlink;

    let registry = Registry::new();
    registry.model("library", "a", "latest", b"cfg-a", &[b"shared-layer"]);
    registry.model("library", "b", "latest", b"cfg-b", &[b"shared-layer"]);

    // b's model directory lives outside the registry and is linked back in.
    let b_dir = registry.layout.manifests_dir().join("library").join("b");
    let elsewhere = registry._dir.path().join("linked-b");
    fs::rename(&b_dir, &elsewhere).unwrap();
    symlink(&elsewhere, &b_dir).unwrap();

    let index = build_index(&registry.layout).unwrap();
    assert_eq!(index.model_count(), 2);

    let a = registry.resolve("a:latest", ManifestResolver::for_delete());
    let shared = a.layers().next().unwrap().digest.clone();
    let result = delete_model(&registry.layout, &a, &index).unwrap();

    assert_eq!(result.shared().count(), 1);
    assert!(registry.layout.blob_path(&shared).exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_model_dir_blocks_index() {
    use std::os::unix::fs::PermissionsExt;

    // Root bypasses permission bits.
    if nix::unistd::geteuid().is_root() {
        return;
    }

    let registry = Registry::new();
    registry.model("library", "a", "latest", b"cfg-a", &[b"shared-layer"]);
    registry.model("library", "b", "latest", b"cfg-b", &[b"shared-layer"]);
    let b_dir = registry.layout.manifests_dir().join("library").join("b");
    fs::set_permissions(&b_dir, fs::Permissions::from_mode(0o000)).unwrap();

    let result = build_index(&registry.layout);

    fs::set_permissions(&b_dir, fs::Permissions::from_mode(0o755)).unwrap();
    assert!(matches!(result, Err(ShuttleError::PermissionDenied(_))));
}

#[test]
fn test_repeated_copy_is_idempotent() {
    let source = Registry::new();
    let dest = Registry::new();
    source.model("library", "mistral", "latest", b"cfg", &[b"weights", b"params"]);
    let model = source.resolve("mistral:latest", ManifestResolver::for_copy());

    let mut transfer = BlobTransfer::new(false);
    transfer.transfer(&source.layout, &dest.layout, &model).unwrap();
    let first = dest.snapshot();

    let second_run = transfer.transfer(&source.layout, &dest.layout, &model).unwrap();
    assert!(second_run
        .files
        .iter()
        .all(|f| f.action == FileAction::AlreadyPresent));
    assert_eq!(second_run.bytes_copied(), 0);
    assert_eq!(dest.snapshot(), first);
}

#[test]
fn test_always_replace_overwrites_stale_files() {
    let source = Registry::new();
    let dest = Registry::new();
    source.model("library", "mistral", "latest", b"cfg", &[b"full-length-weights"]);
    let model = source.resolve("mistral:latest", ManifestResolver::for_copy());
    let layer = model.layers().next().unwrap().digest.clone();

    fs::write(dest.layout.blob_path(&layer), b"stale").unwrap();
    BlobTransfer::new(true)
        .transfer(&source.layout, &dest.layout, &model)
        .unwrap();

    for file in model.files() {
        let from = fs::metadata(file.path_in(&source.layout, &model.descriptor)).unwrap();
        let to = fs::metadata(file.path_in(&dest.layout, &model.descriptor)).unwrap();
        assert_eq!(from.len(), to.len());
    }
}

#[test]
fn test_move_round_trip() {
    let source = Registry::new();
    let dest = Registry::new();
    source.model("jmorgan", "phi", "latest", b"cfg-phi", &[b"phi-weights"]);
    source.model("library", "other", "latest", b"cfg-other", &[b"other-weights"]);
    let before = source.snapshot();

    let index = build_index(&source.layout).unwrap();
    let model = source.resolve("jmorgan/phi:latest", ManifestResolver::for_copy());
    let result = move_model(
        &mut BlobTransfer::new(false),
        &source.layout,
        &dest.layout,
        &model,
        &index,
    )
    .unwrap();
    assert!(result.is_moved());

    let after_dest = dest.snapshot();
    for file in model.files() {
        let rel = file
            .path_in(&source.layout, &model.descriptor)
            .strip_prefix(source.layout.root())
            .unwrap()
            .to_path_buf();
        assert_eq!(after_dest.get(&rel), before.get(&rel));
        assert!(!source.layout.root().join(&rel).exists());
    }
    assert!(!source.layout.manifests_dir().join("jmorgan").join("phi").exists());
    assert!(source.layout.manifest_path("library", "other", "latest").exists());
}

#[test]
fn test_move_into_same_registry_is_refused() {
    let source = Registry::new();
    source.model("library", "mistral", "latest", b"cfg", &[b"weights"]);
    let before = source.snapshot();
    let index = build_index(&source.layout).unwrap();
    let model = source.resolve("mistral:latest", ManifestResolver::for_copy());

    let same_root = RegistryLayout::new(source.layout.root().join("blobs").join(".."));
    let err = move_model(
        &mut BlobTransfer::new(true),
        &source.layout,
        &same_root,
        &model,
        &index,
    )
    .unwrap_err();

    assert!(matches!(err, ShuttleError::Validation { .. }));
    assert_eq!(source.snapshot(), before);
}

#[test]
fn test_scan_without_manifests_dir() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("models");
    fs::create_dir_all(root.join("blobs")).unwrap();
    fs::write(root.join("blobs").join("sha256-00"), b"orphan").unwrap();
    let layout = RegistryLayout::new(&root);

    assert!(matches!(scan(&layout), Err(ShuttleError::ManifestsNotFound(_))));
    assert!(matches!(
        build_index(&layout),
        Err(ShuttleError::ManifestsNotFound(_))
    ));
    assert_eq!(fs::read(root.join("blobs").join("sha256-00")).unwrap(), b"orphan");
    assert!(!root.join("manifests").exists());
}

#[test]
fn test_untagged_name_selects_latest() {
    let registry = Registry::new();
    registry.model("library", "mistral", "latest", b"cfg-1", &[b"w1"]);
    registry.model("library", "mistral", "7b", b"cfg-2", &[b"w2"]);

    let models = scan(&registry.layout).unwrap();
    let selection = select_models(&models, &["mistral".to_string()]);

    assert_eq!(selection.matched.len(), 1);
    assert_eq!(selection.matched[0].display_name, "mistral:latest");
    assert!(selection.unmatched.is_empty());
}

#[test]
fn test_unsupported_media_type_blocks_copy_but_not_index() {
    let registry = Registry::new();
    registry.model("library", "good", "latest", b"cfg", &[b"w"]);
    let path = registry.layout.manifest_path("library", "odd", "latest");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let manifest = serde_json::json!({
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "config": { "digest": "sha256:aa", "size": 1 },
        "layers": [],
    });
    fs::write(&path, manifest.to_string()).unwrap();

    let descriptor = scan(&registry.layout)
        .unwrap()
        .into_iter()
        .find(|d| d.display_name == "odd:latest")
        .unwrap();
    assert!(matches!(
        ManifestResolver::for_copy().resolve(&descriptor),
        Err(ShuttleError::UnsupportedMediaType { .. })
    ));
    assert!(ManifestResolver::for_delete().resolve(&descriptor).is_ok());

    let index = build_index(&registry.layout).unwrap();
    assert_eq!(index.model_count(), 2);
}
