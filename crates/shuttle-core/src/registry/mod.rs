//! Local Ollama registry - discovery, manifest resolution and blob accounting.
//!
//! # Architecture
//!
//! ```text
//! RegistryLayout (paths under one registry root)
//!     │
//!     ├── scanner  - enumerate <namespace>/<model>/<version> manifests
//!     │
//!     ├── manifest - resolve a manifest into its config + layer blobs
//!     │
//!     └── index    - reverse digest → model references, deduplicated size
//! ```
//!
//! Nothing here is cached between invocations: every descriptor, resolved
//! model and index is rebuilt from the filesystem.

mod index;
mod layout;
mod manifest;
mod scanner;
mod types;

pub use index::{build_index, RegistryIndex, SkippedManifest};
pub use layout::{digest_to_filename, RegistryLayout};
pub use manifest::{LayerOrder, Manifest, ManifestEntry, ManifestResolver};
pub use scanner::{list_namespaces, scan};
pub use types::{
    BlobReference, BlobRole, ModelDescriptor, ModelFile, ModelFileKind, ResolvedModel,
};
