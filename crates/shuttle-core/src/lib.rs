//! Shuttle Core - headless library for managing local Ollama model registries.
//!
//! Copies, moves and deletes models between two registries on disk while
//! keeping blob sharing intact: a blob is never deleted while another model
//! still references it.
//!
//! # Example
//!
//! ```rust,no_run
//! use shuttle_core::operations::BlobTransfer;
//! use shuttle_core::registry::{scan, ManifestResolver, RegistryLayout};
//!
//! fn main() -> shuttle_core::Result<()> {
//!     let source = RegistryLayout::new("/usr/share/ollama/.ollama/models");
//!     let backup = RegistryLayout::new("/mnt/backup/models");
//!
//!     let mut transfer = BlobTransfer::for_destination(&backup, false);
//!     for descriptor in scan(&source)? {
//!         let model = ManifestResolver::for_copy().resolve(&descriptor)?;
//!         transfer.transfer(&source, &backup, &model)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod operations;
pub mod platform;
pub mod registry;
pub mod selection;
pub mod system;

#[cfg(test)]
mod testing;

pub use error::{ErrorClass, Result, ShuttleError};
pub use operations::{
    delete_model, move_model, Action, BlobTransfer, DeletionResult, MoveResult, TransferResult,
};
pub use registry::{
    build_index, scan, ManifestResolver, RegistryIndex, RegistryLayout, ResolvedModel,
};
