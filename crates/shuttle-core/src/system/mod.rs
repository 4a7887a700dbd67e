//! System utilities module.
//!
//! Provides disk space information and human-readable size formatting for
//! the registry summaries the binary prints.
//!
//! # Example
//!
//! ```rust,no_run
//! use shuttle_core::system::{disk_space_for_path, format_size};
//! use std::path::Path;
//!
//! let info = disk_space_for_path(Path::new("/usr/share/ollama/.ollama/models")).unwrap();
//! println!("Free space: {}", format_size(info.free));
//! ```

mod utils;

pub use utils::{disk_space_for_path, format_size, DiskSpaceInfo};
