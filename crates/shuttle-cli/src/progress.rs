//! Copy progress drawn on stderr.

use shuttle_core::operations::CopyProgress;
use shuttle_core::system::format_size;
use std::io::{self, IsTerminal, Write};

/// Render one progress line, without the leading carriage return.
pub fn render(progress: &CopyProgress) -> String {
    format!(
        "  {} {:>5.1}% {}/{} {}/s",
        short_name(&progress.file_name),
        progress.percent(),
        format_size(progress.bytes_copied),
        format_size(progress.total_bytes),
        format_size(progress.speed_bytes_per_sec as u64)
    )
}

/// Progress callback for a [`BlobTransfer`](shuttle_core::BlobTransfer).
///
/// Draws nothing when stderr is not a terminal.
pub fn reporter() -> impl FnMut(&CopyProgress) + 'static {
    let interactive = io::stderr().is_terminal();
    move |progress| {
        if !interactive {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r\x1b[2K{}", render(progress));
        if progress.is_complete() {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

/// Shorten `sha256-<64 hex>` to its first 12 hex digits.
fn short_name(name: &str) -> &str {
    match name.split_once(['-', ':']) {
        // Cut on a char boundary; names come from the filesystem.
        Some((algo, hash)) if algo == "sha256" => match hash.char_indices().nth(12) {
            Some((cut, _)) => &name[..algo.len() + 1 + cut],
            None => name,
        },
        _ => name,
    }
}
