//! Registry mutations: copy, delete and move.
//!
//! Each operation works on one [`ResolvedModel`](crate::registry::ResolvedModel)
//! at a time. Deletion and move also take the source's
//! [`RegistryIndex`](crate::registry::RegistryIndex) so shared blobs survive.

mod deletion;
mod progress;
mod relocate;
mod transfer;

pub use deletion::{delete_model, DeletionResult, FileRemoval, RemovalStatus};
pub use progress::{CopyProgress, ProgressCallback};
pub use relocate::{move_model, MoveResult};
pub use transfer::{BlobTransfer, FileAction, FileTransfer, TransferOutcome, TransferResult};

use crate::error::ShuttleError;
use std::fmt;
use std::str::FromStr;

/// Operation requested on the selected models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Copy,
    Delete,
    Move,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Copy => "copy",
            Action::Delete => "delete",
            Action::Move => "move",
        }
    }

    /// Whether the action writes into a destination registry.
    pub fn needs_destination(&self) -> bool {
        matches!(self, Action::Copy | Action::Move)
    }

    /// Whether the action removes blobs and so needs a reference index.
    pub fn needs_index(&self) -> bool {
        matches!(self, Action::Delete | Action::Move)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ShuttleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(Action::Copy),
            "delete" => Ok(Action::Delete),
            "move" => Ok(Action::Move),
            other => Err(ShuttleError::Validation {
                field: "action".to_string(),
                message: format!("unknown action '{}', expected copy, delete or move", other),
            }),
        }
    }
}
