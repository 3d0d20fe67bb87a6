//! Saved build profiles.
//!
//! A profile remembers the inputs of a build: template and output
//! directories, naming pattern, the catalog versions to build and the
//! plugins to strip. Only the fields a build consumes are modelled.

use crate::catalog::{TargetSelection, VersionCatalog};
use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use serde::Deserialize;
use std::fs;

fn default_checked() -> bool {
    true
}

fn default_pattern() -> String {
    uepack::DEFAULT_NAME_PATTERN.to_owned()
}

/// A profile's reference to a catalog version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileVersion {
    /// Catalog identifier.
    pub version_id: String,
    /// Engine path override; blank means the catalog's path.
    #[serde(default)]
    pub engine_path: String,
    /// Whether the version is built.
    #[serde(default = "default_checked")]
    pub checked: bool,
}

/// A saved build profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Profile name.
    #[serde(default)]
    pub name: String,
    /// Project template directory.
    #[serde(default)]
    pub template_dir: String,
    /// Directory receiving the archives.
    #[serde(default)]
    pub output_dir: String,
    /// Archive naming pattern.
    #[serde(default = "default_pattern")]
    pub zip_pattern: String,
    /// Versions known to the profile, in build order.
    #[serde(default)]
    pub versions: Vec<ProfileVersion>,
    /// Plugin names removed from every manifest.
    #[serde(default)]
    pub plugins_to_strip: Vec<String>,
    /// Top-level names excluded in addition to the defaults.
    #[serde(default)]
    pub root_excludes: Vec<String>,
}

impl Profile {
    /// Parses a profile document.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Profile`] when the JSON is malformed.
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| PackagerError::Profile {
            reason: err.to_string(),
        })
    }

    /// Loads the profile at `path`.
    ///
    /// # Errors
    ///
    /// Returns I/O errors and the errors of [`Self::from_json`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Resolves the checked versions against `catalog`, in profile order.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Profile`] when a checked version is missing
    /// from the catalog.
    pub fn selections(&self, catalog: &VersionCatalog) -> Result<Vec<TargetSelection>> {
        self.versions
            .iter()
            .filter(|version| version.checked && !version.version_id.trim().is_empty())
            .map(|version| {
                let id = version.version_id.trim();
                let known = catalog.find(id).ok_or_else(|| PackagerError::Profile {
                    reason: format!("version {id} is not in the catalog"),
                })?;
                let override_path = version.engine_path.trim();
                Ok(TargetSelection {
                    engine_path: if override_path.is_empty() {
                        known.engine_path.clone()
                    } else {
                        override_path.to_owned()
                    },
                    ..known.clone()
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "name": "Release",
        "template_dir": "/projects/MyGame",
        "output_dir": "/dist",
        "versions": [
            {"version_id": "ue56", "engine_path": "/opt/ue56"},
            {"version_id": "ue55", "checked": false},
            {"version_id": "ue54", "engine_path": "  "}
        ],
        "plugins_to_strip": ["Foo"]
    }"#;

    #[test]
    fn defaults_fill_missing_fields() {
        let profile = Profile::from_json("{}").expect("valid");
        assert_eq!(profile.zip_pattern, "{project}_{ueversion}");
        assert!(profile.versions.is_empty());
        assert!(profile.root_excludes.is_empty());
    }

    #[test]
    fn selections_follow_profile_order_and_skip_unchecked() {
        let profile = Profile::from_json(PROFILE).expect("valid");
        let selections = profile
            .selections(&VersionCatalog::builtin())
            .expect("all versions known");

        let summary: Vec<(&str, &str)> = selections
            .iter()
            .map(|s| (s.label.as_str(), s.engine_path.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("UE 5.6", "/opt/ue56"),
                ("UE 5.4", "C:/Program Files/Epic Games/UE_5.4"),
            ]
        );
    }

    #[test]
    fn unknown_version_is_an_error() {
        let profile =
            Profile::from_json(r#"{"versions": [{"version_id": "ue99"}]}"#).expect("valid");
        let err = profile
            .selections(&VersionCatalog::builtin())
            .expect_err("unknown id");
        assert!(err.to_string().contains("ue99"));
    }

    #[test]
    fn malformed_profile_is_reported() {
        let err = Profile::from_json("{\"versions\": 3}").expect_err("bad shape");
        assert!(matches!(err, PackagerError::Profile { .. }));
    }
}
