//! Blob transfer between two registries.
//!
//! Copies a model's manifest and blobs byte-for-byte:
//! - Whole-model preflight, so a partial blob set is never copied
//! - Manifest, then config, then layers largest-first
//! - Size-based skip/replace of files already at the destination
//! - Chunked streaming with per-chunk progress

use crate::config::TransferConfig;
use crate::error::{Result, ShuttleError};
use crate::operations::progress::{CopyProgress, ProgressCallback};
use crate::platform::{ownership_policy_for, NoopOwnership, OwnershipPolicy};
use crate::registry::{ModelFile, RegistryLayout, ResolvedModel};
use crate::system::format_size;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to one file during a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Destination did not exist.
    Copied,
    /// Same size at the destination, replaced because `always_replace` was set.
    Replaced,
    /// Different size at the destination, treated as a stale partial copy.
    SizeMismatchReplaced,
    /// Same size at the destination, left alone.
    AlreadyPresent,
}

/// One file's transfer record.
#[derive(Debug, Clone)]
pub struct FileTransfer {
    pub file: ModelFile,
    pub destination: PathBuf,
    pub action: FileAction,
    /// Size of the source file.
    pub size: u64,
}

/// Overall outcome of a model transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    /// Source files were missing; nothing was copied.
    SkippedMissingSource { missing: Vec<PathBuf> },
}

/// Result of transferring one model.
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub model: String,
    pub outcome: TransferOutcome,
    pub files: Vec<FileTransfer>,
}

impl TransferResult {
    pub fn is_completed(&self) -> bool {
        self.outcome == TransferOutcome::Completed
    }

    /// Bytes actually written to the destination.
    pub fn bytes_copied(&self) -> u64 {
        self.files
            .iter()
            .filter(|f| f.action != FileAction::AlreadyPresent)
            .map(|f| f.size)
            .sum()
    }

    /// Number of files left untouched because they were already present.
    pub fn already_present_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.action == FileAction::AlreadyPresent)
            .count()
    }

    /// The skip as an error value, for callers that want to surface it.
    pub fn missing_source_error(&self) -> Option<ShuttleError> {
        match &self.outcome {
            TransferOutcome::SkippedMissingSource { missing } => {
                missing.first().map(|path| ShuttleError::MissingBlob {
                    model: self.model.clone(),
                    path: path.clone(),
                })
            }
            TransferOutcome::Completed => None,
        }
    }
}

/// Copies models into a destination registry.
pub struct BlobTransfer {
    always_replace: bool,
    chunk_size: usize,
    ownership: Box<dyn OwnershipPolicy>,
    progress: Option<ProgressCallback>,
}

impl BlobTransfer {
    /// Create a transfer engine that leaves destination ownership untouched.
    pub fn new(always_replace: bool) -> Self {
        Self {
            always_replace,
            chunk_size: TransferConfig::COPY_CHUNK_SIZE,
            ownership: Box::new(NoopOwnership),
            progress: None,
        }
    }

    /// Create a transfer engine with the ownership policy matching `destination`.
    pub fn for_destination(destination: &RegistryLayout, always_replace: bool) -> Self {
        Self::new(always_replace).with_ownership(ownership_policy_for(destination))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_ownership(mut self, ownership: Box<dyn OwnershipPolicy>) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(&CopyProgress) + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Copy one model from `source` into `destination`.
    ///
    /// # Errors
    ///
    /// - [`ShuttleError::Validation`] if both registries are the same directory
    /// - [`ShuttleError::PermissionDenied`] on any permission failure
    /// - [`ShuttleError::Io`] on any other I/O failure
    ///
    /// Missing source files are not an error: the model is skipped whole and
    /// the outcome says so.
    pub fn transfer(
        &mut self,
        source: &RegistryLayout,
        destination: &RegistryLayout,
        model: &ResolvedModel,
    ) -> Result<TransferResult> {
        if source.is_same_registry(destination) {
            return Err(ShuttleError::Validation {
                field: "to".to_string(),
                message: format!(
                    "source and destination are the same registry: {}",
                    source.root().display()
                ),
            });
        }

        let descriptor = &model.descriptor;
        let files = model.files();

        let missing: Vec<PathBuf> = files
            .iter()
            .map(|f| f.path_in(source, descriptor))
            .filter(|path| !path.is_file())
            .collect();
        if !missing.is_empty() {
            for path in &missing {
                warn!("{} does not exist", path.display());
            }
            warn!("Skipping model {}", model.display_name());
            return Ok(TransferResult {
                model: model.display_name().to_string(),
                outcome: TransferOutcome::SkippedMissingSource { missing },
                files: Vec::new(),
            });
        }

        info!("Copying model {}", model.display_name());

        let mut transfers = Vec::with_capacity(files.len());
        for file in files {
            let from = file.path_in(source, descriptor);
            let to = file.path_in(destination, descriptor);
            transfers.push(self.transfer_file(file, &from, to)?);
        }

        info!(
            "Model {} is copied to {}",
            model.display_name(),
            destination.root().display()
        );
        Ok(TransferResult {
            model: model.display_name().to_string(),
            outcome: TransferOutcome::Completed,
            files: transfers,
        })
    }

    fn transfer_file(
        &mut self,
        file: ModelFile,
        from: &Path,
        to: PathBuf,
    ) -> Result<FileTransfer> {
        let size = fs::metadata(from)
            .map_err(|e| ShuttleError::io_with_path(e, from))?
            .len();

        let action = match fs::metadata(&to) {
            Ok(existing) if existing.len() == size => {
                if self.always_replace {
                    info!("Replacing {}", to.display());
                    FileAction::Replaced
                } else {
                    info!(
                        "Skipped: {} ({}) already exists in destination.",
                        file.name,
                        format_size(size)
                    );
                    FileAction::AlreadyPresent
                }
            }
            Ok(_) => {
                info!("Soft Replacing {}", to.display());
                FileAction::SizeMismatchReplaced
            }
            Err(e) if e.kind() == ErrorKind::NotFound => FileAction::Copied,
            Err(e) => return Err(ShuttleError::io_with_path(e, &to)),
        };

        if action != FileAction::AlreadyPresent {
            let parent = to.parent().unwrap_or_else(|| Path::new("."));
            fs::create_dir_all(parent).map_err(|e| ShuttleError::io_with_path(e, parent))?;

            info!(" Copying: {} {} ({} bytes)", file.name, format_size(size), size);
            self.copy_chunked(&file.name, from, &to, size)?;

            if let Err(e) = self.ownership.apply_to_file(&to) {
                warn!("Could not reset ownership of {}: {}", to.display(), e);
            }
            if let Err(e) = self.ownership.apply_to_dir(parent) {
                warn!("Could not reset ownership of {}: {}", parent.display(), e);
            }
        }

        Ok(FileTransfer {
            file,
            destination: to,
            action,
            size,
        })
    }

    /// Stream `from` into `to`, reporting progress after each chunk.
    fn copy_chunked(
        &mut self,
        file_name: &str,
        from: &Path,
        to: &Path,
        size: u64,
    ) -> Result<u64> {
        let mut reader = File::open(from).map_err(|e| ShuttleError::io_with_path(e, from))?;
        let mut writer = File::create(to).map_err(|e| ShuttleError::io_with_path(e, to))?;

        let mut buffer = vec![0u8; self.chunk_size];
        let started = Instant::now();
        let mut bytes_copied: u64 = 0;

        loop {
            let chunk_started = Instant::now();
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ShuttleError::io_with_path(e, from)),
            };
            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| ShuttleError::io_with_path(e, to))?;
            bytes_copied += bytes_read as u64;

            let chunk_secs = chunk_started.elapsed().as_secs_f64();
            let speed = if chunk_secs > 0.0 {
                bytes_read as f64 / chunk_secs
            } else {
                0.0
            };
            self.report(CopyProgress {
                file_name: file_name.to_string(),
                bytes_copied,
                // The source may have grown since it was measured.
                total_bytes: size.max(bytes_copied),
                elapsed: started.elapsed(),
                speed_bytes_per_sec: speed,
            });
        }

        writer.flush().map_err(|e| ShuttleError::io_with_path(e, to))?;
        writer.sync_all().map_err(|e| ShuttleError::io_with_path(e, to))?;

        if bytes_copied == 0 {
            self.report(CopyProgress {
                file_name: file_name.to_string(),
                bytes_copied: 0,
                total_bytes: 0,
                elapsed: started.elapsed(),
                speed_bytes_per_sec: 0.0,
            });
        }

        debug!(
            "Copied {} bytes from {} to {} in {:?}",
            bytes_copied,
            from.display(),
            to.display(),
            started.elapsed()
        );
        Ok(bytes_copied)
    }

    fn report(&mut self, progress: CopyProgress) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&progress);
        }
    }
}
