//! Engine version catalog and target selections.
//!
//! The catalog is a JSON document listing the engine versions a user can
//! build for:
//!
//! ```json
//! {"versions": [{"id": "ue54", "label": "UE 5.4", "engine_path": "C:/Program Files/Epic Games/UE_5.4"}]}
//! ```
//!
//! A build run receives [`TargetSelection`]s, either resolved from the
//! catalog or built ad hoc from bare labels.

use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;

/// One requested output archive.
///
/// Only `label` influences the build; `engine_path` is carried for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSelection {
    /// Stable version identifier, such as `ue54`.
    pub version_id: String,
    /// Display label, such as `UE 5.4`.
    pub label: String,
    /// Engine installation path reference.
    pub engine_path: String,
}

impl TargetSelection {
    /// Builds a selection from a bare label, deriving the identifier from
    /// the label's alphanumeric characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use uepack_packager::catalog::TargetSelection;
    ///
    /// let selection = TargetSelection::from_label("UE 5.4");
    /// assert_eq!(selection.version_id, "ue54");
    /// assert_eq!(selection.label, "UE 5.4");
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self {
            version_id: label
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|ch| ch.to_ascii_lowercase())
                .collect(),
            label: label.to_owned(),
            engine_path: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    versions: Vec<CatalogEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogEntry {
    id: String,
    label: String,
    engine_path: String,
}

/// The list of known engine versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCatalog {
    versions: Vec<TargetSelection>,
}

impl VersionCatalog {
    /// Returns the catalog shipped with the tool: UE 5.4, 5.5 and 5.6 at
    /// their default Windows install locations.
    #[must_use]
    pub fn builtin() -> Self {
        let versions = ["5.4", "5.5", "5.6"]
            .into_iter()
            .map(|version| TargetSelection {
                version_id: format!("ue{}", version.replace('.', "")),
                label: format!("UE {version}"),
                engine_path: format!("C:/Program Files/Epic Games/UE_{version}"),
            })
            .collect();
        Self { versions }
    }

    /// Parses a catalog document.
    ///
    /// Entries with a blank `id` or `label` are skipped; values are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Catalog`] when the JSON is malformed or two
    /// entries share an `id`.
    pub fn from_json(source: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(source).map_err(|err| PackagerError::Catalog {
                reason: err.to_string(),
            })?;

        let mut seen = HashSet::new();
        let mut versions = Vec::with_capacity(file.versions.len());
        for entry in file.versions {
            let version_id = entry.id.trim();
            let label = entry.label.trim();
            if version_id.is_empty() || label.is_empty() {
                continue;
            }
            if !seen.insert(version_id.to_owned()) {
                return Err(PackagerError::Catalog {
                    reason: format!("duplicate version id {version_id}"),
                });
            }
            versions.push(TargetSelection {
                version_id: version_id.to_owned(),
                label: label.to_owned(),
                engine_path: entry.engine_path.trim().to_owned(),
            });
        }
        Ok(Self { versions })
    }

    /// Loads the catalog at `path`.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from reading the file and the errors of
    /// [`Self::from_json`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        debug!(target: "uepack::catalog", "loaded version catalog from {path}");
        Self::from_json(&source)
    }

    /// Loads the catalog at `path`, or the built-in catalog when no path is
    /// configured.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_or_builtin(path: Option<&Utf8Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::builtin()), Self::load)
    }

    /// Returns every version in catalog order.
    #[must_use]
    pub fn versions(&self) -> &[TargetSelection] {
        &self.versions
    }

    /// Looks up a version by identifier.
    #[must_use]
    pub fn find(&self, version_id: &str) -> Option<&TargetSelection> {
        self.versions
            .iter()
            .find(|version| version.version_id == version_id)
    }

    /// Resolves a command-line version argument.
    ///
    /// A catalog identifier or label (ignoring case and surrounding
    /// whitespace) selects that catalog entry; anything else becomes an ad-hoc
    /// selection built with [`TargetSelection::from_label`].
    #[must_use]
    pub fn selection_for(&self, requested: &str) -> TargetSelection {
        let requested = requested.trim();
        self.versions
            .iter()
            .find(|version| {
                version.version_id.eq_ignore_ascii_case(requested)
                    || version.label.eq_ignore_ascii_case(requested)
            })
            .cloned()
            .unwrap_or_else(|| TargetSelection::from_label(requested))
    }
}
