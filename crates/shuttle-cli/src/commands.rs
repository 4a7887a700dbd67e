//! Command dispatch: validation, selection and the per-model loop.

use crate::progress;
use crate::prompt::{choose_models, print_model_list};
use anyhow::Result;
use shuttle_core::operations::{DeletionResult, RemovalStatus, TransferResult};
use shuttle_core::platform::describe_access;
use shuttle_core::registry::{list_namespaces, ModelDescriptor};
use shuttle_core::selection::select_models;
use shuttle_core::system::{disk_space_for_path, format_size};
use shuttle_core::{
    build_index, delete_model, move_model, scan, Action, BlobTransfer, ManifestResolver,
    RegistryLayout, ShuttleError,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything one invocation needs, decoupled from clap.
#[derive(Debug, Clone)]
pub struct Options {
    pub from: PathBuf,
    pub to: PathBuf,
    pub action: Action,
    pub all: bool,
    pub models: Vec<String>,
    pub always_replace: bool,
    pub show: bool,
}

/// Run one invocation, reading answers from `input` and listings to `out`.
pub fn run<R: BufRead, W: Write>(options: &Options, input: &mut R, out: &mut W) -> Result<()> {
    let source = RegistryLayout::new(&options.from);
    let destination = RegistryLayout::new(&options.to);

    validate_source(&source)?;
    if options.action.needs_destination() && !options.show {
        validate_destination(&source, &destination)?;
    }

    if options.show {
        return show(&source, out);
    }

    if options.all && !options.models.is_empty() {
        return Err(ShuttleError::Validation {
            field: "models".to_string(),
            message: "cannot use --all and --models together".to_string(),
        }
        .into());
    }

    let models = sorted_models(&source)?;
    let targets = if options.all {
        models
    } else if !options.models.is_empty() {
        let selection = select_models(&models, &options.models);
        for name in &selection.unmatched {
            warn!("No model named {} in {}", name, source.root().display());
        }
        selection.matched
    } else {
        choose_models(input, out, &models, options.action)?
    };

    if targets.is_empty() {
        writeln!(out, "\nNo models found matching your selection. Please try again.")?;
        return Ok(());
    }

    info!("{} {} model(s)", options.action, targets.len());
    match options.action {
        Action::Copy => copy_models(&source, &destination, &targets, options.always_replace, out),
        Action::Delete => delete_models(&source, &targets, out),
        Action::Move => move_models(&source, &destination, &targets, options.always_replace, out),
    }
}

fn copy_models<W: Write>(
    source: &RegistryLayout,
    destination: &RegistryLayout,
    targets: &[ModelDescriptor],
    always_replace: bool,
    out: &mut W,
) -> Result<()> {
    let resolver = ManifestResolver::for_copy();
    let mut transfer = transfer_engine(destination, always_replace);

    for descriptor in targets {
        let model = resolver.resolve(descriptor)?;
        let result = transfer.transfer(source, destination, &model)?;
        report_transfer(out, &result)?;
    }
    Ok(())
}

fn delete_models<W: Write>(
    source: &RegistryLayout,
    targets: &[ModelDescriptor],
    out: &mut W,
) -> Result<()> {
    let resolver = ManifestResolver::for_delete();
    let index = build_index(source)?;

    for descriptor in targets {
        let model = resolver.resolve(descriptor)?;
        let result = delete_model(source, &model, &index)?;
        report_deletion(out, &result)?;
    }
    Ok(())
}

fn move_models<W: Write>(
    source: &RegistryLayout,
    destination: &RegistryLayout,
    targets: &[ModelDescriptor],
    always_replace: bool,
    out: &mut W,
) -> Result<()> {
    let resolver = ManifestResolver::for_copy();
    let index = build_index(source)?;
    let mut transfer = transfer_engine(destination, always_replace);

    for descriptor in targets {
        let model = resolver.resolve(descriptor)?;
        let result = move_model(&mut transfer, source, destination, &model, &index)?;
        report_transfer(out, &result.transfer)?;
        if let Some(deletion) = &result.deletion {
            report_deletion(out, deletion)?;
        }
    }
    Ok(())
}

fn transfer_engine(destination: &RegistryLayout, always_replace: bool) -> BlobTransfer {
    BlobTransfer::for_destination(destination, always_replace).with_progress(progress::reporter())
}

/// Print the source listing, sizes, disk space and access bits.
fn show<W: Write>(source: &RegistryLayout, out: &mut W) -> Result<()> {
    writeln!(out, "\nShowing models found in {}", source.root().display())?;

    let namespaces = list_namespaces(source)?;
    let models = sorted_models(source)?;
    print_model_list(out, &models)?;

    let index = build_index(source)?;
    writeln!(out)?;
    writeln!(out, "Namespaces:        {}", namespaces.join(", "))?;
    writeln!(out, "Models:            {}", index.model_count())?;
    writeln!(out, "Blobs:             {}", index.blob_count())?;
    writeln!(out, "Shared blobs:      {}", index.shared_digests().len())?;
    writeln!(out, "Total size:        {}", format_size(index.summed_size()))?;
    writeln!(out, "Deduplicated size: {}", format_size(index.deduplicated_size()))?;
    for skipped in index.skipped() {
        writeln!(out, "Unreadable:        {} ({})", skipped.model, skipped.reason)?;
    }

    match disk_space_for_path(source.root()) {
        Ok(disk) => writeln!(
            out,
            "Disk:              {} free of {} ({}% used)",
            format_size(disk.free),
            format_size(disk.total),
            disk.percent
        )?,
        Err(e) => warn!("{}", e),
    }
    writeln!(out, "Access:            {}", describe_access(source.root()))?;
    Ok(())
}

fn sorted_models(source: &RegistryLayout) -> Result<Vec<ModelDescriptor>> {
    let mut models = scan(source)?;
    models.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(models)
}

fn report_transfer<W: Write>(out: &mut W, result: &TransferResult) -> Result<()> {
    if let Some(err) = result.missing_source_error() {
        writeln!(out, "{}: skipped ({})", result.model, err)?;
        return Ok(());
    }
    writeln!(
        out,
        "{}: {} file(s), {} copied, {} already present",
        result.model,
        result.files.len(),
        format_size(result.bytes_copied()),
        result.already_present_count()
    )?;
    Ok(())
}

fn report_deletion<W: Write>(out: &mut W, result: &DeletionResult) -> Result<()> {
    writeln!(
        out,
        "{}: {} removed, {} kept (shared), {} failed",
        result.model,
        result.removed_count(),
        result.shared().count(),
        result.failed_count()
    )?;
    for file in result.shared() {
        if let RemovalStatus::SkippedShared { holders } = &file.status {
            writeln!(out, "  {} is used by {}", file.file.name, holders.join(", "))?;
        }
    }
    if let Some(dir) = &result.pruned_dir {
        writeln!(out, "  removed empty directory {}", dir.display())?;
    }
    Ok(())
}

fn validate_source(source: &RegistryLayout) -> Result<(), ShuttleError> {
    for dir in [source.blobs_dir(), source.manifests_root()] {
        if !dir.is_dir() {
            return Err(ShuttleError::Validation {
                field: "from".to_string(),
                message: format!("{} does not exist", dir.display()),
            });
        }
    }
    Ok(())
}

fn validate_destination(
    source: &RegistryLayout,
    destination: &RegistryLayout,
) -> Result<(), ShuttleError> {
    if !destination.root().is_dir() {
        return Err(ShuttleError::Validation {
            field: "to".to_string(),
            message: format!("{} is not an existing directory", destination.root().display()),
        });
    }
    if source.is_same_registry(destination) {
        return Err(ShuttleError::Validation {
            field: "to".to_string(),
            message: "source and destination are the same registry".to_string(),
        });
    }
    Ok(())
}
