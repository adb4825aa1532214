//! Category domain model.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_SLUG_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Category document key.
pub type CategoryId = String;

/// Display category that feedback items can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Slug-like stable id, doubling as the storage document key.
    pub id: CategoryId,
    /// Human-readable label.
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Derives a slug id from a display name.
///
/// Lowercases the name, collapses every run of non-alphanumeric ASCII into a
/// single `-` and trims dashes at both ends, so `"Assessment & Feedback"`
/// becomes `"assessment-feedback"`. Returns an empty string when the name has
/// no ASCII alphanumerics.
pub fn category_slug(name: &str) -> String {
    let lowered = name.trim().to_ascii_lowercase();
    NON_SLUG_RUN_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
