//! Model name normalization and operator selection parsing.

use crate::config::RegistryConfig;
use crate::error::{Result, ShuttleError};
use crate::registry::ModelDescriptor;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Digits and commas only, checked after spaces are stripped.
static SELECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9,]+$").unwrap());

/// Append the default tag to names that carry none.
///
/// ```
/// use shuttle_core::selection::normalize_model_name;
///
/// assert_eq!(normalize_model_name("mistral"), "mistral:latest");
/// assert_eq!(normalize_model_name("llama3:8b"), "llama3:8b");
/// ```
pub fn normalize_model_name(name: &str) -> String {
    let name = name.trim();
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{}:{}", name, RegistryConfig::DEFAULT_TAG)
    }
}

/// Parse a comma-separated list of 1-based indices into 0-based ones.
///
/// Spaces are ignored. Duplicates collapse to their first occurrence.
///
/// # Errors
///
/// [`ShuttleError::InvalidSelection`] for characters other than digits and
/// commas, empty entries, or indices outside `1..=count`.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = |message: String| ShuttleError::InvalidSelection {
        input: input.trim().to_string(),
        message,
    };

    if !SELECTION_PATTERN.is_match(&cleaned) {
        return Err(invalid(
            "only numbers separated by commas are allowed".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut indices = Vec::new();
    for part in cleaned.split(',') {
        if part.is_empty() {
            return Err(invalid("empty entry in selection".to_string()));
        }
        let index: usize = part
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a valid number", part)))?;
        if index < 1 || index > count {
            return Err(invalid(format!(
                "{} is out of range, choose between 1 and {}",
                index, count
            )));
        }
        if seen.insert(index) {
            indices.push(index - 1);
        }
    }
    Ok(indices)
}

/// Models matched by explicit names.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Matching models, in listing order.
    pub matched: Vec<ModelDescriptor>,
    /// Normalized names that matched nothing.
    pub unmatched: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// Pick the models whose display names match `names` after normalization.
pub fn select_models(models: &[ModelDescriptor], names: &[String]) -> Selection {
    let wanted: Vec<String> = names.iter().map(|n| normalize_model_name(n)).collect();

    let matched: Vec<ModelDescriptor> = models
        .iter()
        .filter(|m| wanted.contains(&m.display_name))
        .cloned()
        .collect();

    let mut unmatched = Vec::new();
    for name in wanted {
        if !matched.iter().any(|m| m.display_name == name) && !unmatched.contains(&name) {
            unmatched.push(name);
        }
    }

    Selection { matched, unmatched }
}

/// Pick models by the 0-based indices [`parse_selection`] returns.
pub fn select_by_indices(models: &[ModelDescriptor], indices: &[usize]) -> Vec<ModelDescriptor> {
    indices
        .iter()
        .filter_map(|&i| models.get(i).cloned())
        .collect()
}
