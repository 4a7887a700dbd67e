//! Move: transfer to the destination, then delete from the source.

use crate::error::Result;
use crate::operations::deletion::{delete_model, DeletionResult};
use crate::operations::transfer::{BlobTransfer, TransferResult};
use crate::registry::{RegistryIndex, RegistryLayout, ResolvedModel};
use tracing::{info, warn};

/// Result of moving one model.
#[derive(Debug, Clone)]
pub struct MoveResult {
    pub transfer: TransferResult,
    /// `None` when the transfer did not complete and the source was kept.
    pub deletion: Option<DeletionResult>,
}

impl MoveResult {
    /// True once the model is at the destination and gone from the source.
    pub fn is_moved(&self) -> bool {
        self.transfer.is_completed() && self.deletion.is_some()
    }
}

/// Move one model from `source` to `destination`.
///
/// The index must describe `source`. There is no rollback: a deletion
/// failure after a completed transfer leaves the model in both registries.
pub fn move_model(
    transfer: &mut BlobTransfer,
    source: &RegistryLayout,
    destination: &RegistryLayout,
    model: &ResolvedModel,
    index: &RegistryIndex,
) -> Result<MoveResult> {
    let transferred = transfer.transfer(source, destination, model)?;

    if !transferred.is_completed() {
        warn!(
            "Not deleting {} from {}: it was not copied",
            model.display_name(),
            source.root().display()
        );
        return Ok(MoveResult {
            transfer: transferred,
            deletion: None,
        });
    }

    let deletion = delete_model(source, model, index)?;
    info!(
        "Model {} moved to {}",
        model.display_name(),
        destination.root().display()
    );

    Ok(MoveResult {
        transfer: transferred,
        deletion: Some(deletion),
    })
}
