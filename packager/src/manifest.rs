//! Project manifest (`.uproject`) discovery and mutation.
//!
//! The manifest is handled as an insertion-ordered JSON object so fields the
//! packager does not understand survive a rewrite untouched. Only two keys
//! are ever modified: `EngineAssociation` and `Plugins`.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::trace;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;

/// File extension identifying a project manifest.
pub const MANIFEST_EXTENSION: &str = "uproject";

const ENGINE_ASSOCIATION_KEY: &str = "EngineAssociation";
const PLUGINS_KEY: &str = "Plugins";
const PLUGIN_NAME_KEY: &str = "Name";
const PLUGIN_ENABLED_KEY: &str = "Enabled";

/// Plugin names removed from every manifest produced by a run.
pub type PluginStripSet = BTreeSet<String>;

/// A plugin declaration read from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginEntry {
    /// Trimmed plugin name.
    pub name: String,
    /// Declared `Enabled` flag; `true` when the manifest omits it.
    pub enabled: bool,
}

/// A parsed project manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectManifest {
    fields: Map<String, Value>,
}

impl ProjectManifest {
    /// Parses manifest bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidManifest`] when the bytes are not JSON
    /// or the top-level value is not an object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(PackagerError::InvalidManifest {
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// Returns the current `EngineAssociation`, if it is a string.
    #[must_use]
    pub fn engine_association(&self) -> Option<&str> {
        self.fields.get(ENGINE_ASSOCIATION_KEY).and_then(Value::as_str)
    }

    /// Sets `EngineAssociation` verbatim, keeping its position when present.
    pub fn set_engine_association(&mut self, association: &str) {
        self.fields.insert(
            ENGINE_ASSOCIATION_KEY.to_owned(),
            Value::String(association.to_owned()),
        );
    }

    /// Removes plugin declarations whose trimmed `Name` is in `strip`.
    ///
    /// Entries without a usable name are kept. When nothing remains the
    /// `Plugins` key is removed altogether. The manifest is untouched when
    /// `strip` is empty or `Plugins` is missing or not a list.
    pub fn strip_plugins(&mut self, strip: &PluginStripSet) {
        if strip.is_empty() {
            return;
        }
        let Some(Value::Array(entries)) = self.fields.get_mut(PLUGINS_KEY) else {
            return;
        };

        let before = entries.len();
        entries.retain(|entry| plugin_name(entry).is_none_or(|name| !strip.contains(name)));
        trace!(
            target: "uepack::manifest",
            "stripped {} plugin declaration(s)",
            before.saturating_sub(entries.len())
        );

        if entries.is_empty() {
            self.fields.shift_remove(PLUGINS_KEY);
        }
    }

    /// Lists the named plugin declarations, sorted case-insensitively.
    #[must_use]
    pub fn plugins(&self) -> Vec<PluginEntry> {
        let Some(Value::Array(entries)) = self.fields.get(PLUGINS_KEY) else {
            return Vec::new();
        };
        let mut plugins: Vec<PluginEntry> = entries
            .iter()
            .filter_map(|entry| {
                let name = plugin_name(entry)?;
                let enabled = entry
                    .get(PLUGIN_ENABLED_KEY)
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                Some(PluginEntry {
                    name: name.to_owned(),
                    enabled,
                })
            })
            .collect();
        plugins.sort_by_cached_key(|plugin| plugin.name.to_lowercase());
        plugins
    }

    /// Returns the serialised bytes of a copy with `engine_association` set
    /// and `plugins_to_strip` removed, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// See [`Self::to_bytes`].
    pub fn mutated(
        &self,
        engine_association: &str,
        plugins_to_strip: &PluginStripSet,
    ) -> Result<Vec<u8>> {
        let mut copy = self.clone();
        copy.set_engine_association(engine_association);
        copy.strip_plugins(plugins_to_strip);
        copy.to_bytes()
    }

    /// Serialises the manifest as two-space indented UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidManifest`] if serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.fields)?)
    }
}

/// Applies a version's changes to the original manifest bytes.
///
/// # Errors
///
/// Returns [`PackagerError::InvalidManifest`] when `bytes` is not a JSON
/// object.
///
/// # Examples
///
/// ```
/// use uepack_packager::manifest::{PluginStripSet, mutate_manifest};
///
/// let original = br#"{"EngineAssociation": "", "Plugins": [{"Name": "Foo"}]}"#;
/// let strip: PluginStripSet = ["Foo".to_owned()].into_iter().collect();
/// let mutated = mutate_manifest(original, "5.4", &strip)?;
/// let json: serde_json::Value = serde_json::from_slice(&mutated)?;
/// assert_eq!(json, serde_json::json!({"EngineAssociation": "5.4"}));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn mutate_manifest(
    bytes: &[u8],
    engine_association: &str,
    plugins_to_strip: &PluginStripSet,
) -> Result<Vec<u8>> {
    ProjectManifest::from_slice(bytes)?.mutated(engine_association, plugins_to_strip)
}

/// Finds the single manifest at the root of `source_dir`.
///
/// # Errors
///
/// Returns [`PackagerError::ManifestNotFound`] when there is none and
/// [`PackagerError::AmbiguousManifest`] when there is more than one.
pub fn locate_manifest(source_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let mut candidates = Vec::new();
    for entry in source_dir.read_dir_utf8()? {
        let entry = entry?;
        let is_manifest = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION));
        if is_manifest && entry.path().is_file() {
            candidates.push(entry.into_path());
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Err(PackagerError::ManifestNotFound {
            dir: source_dir.to_owned(),
        }),
        1 => Ok(candidates.swap_remove(0)),
        _ => Err(PackagerError::AmbiguousManifest {
            dir: source_dir.to_owned(),
            candidates: candidates
                .iter()
                .filter_map(|path| path.file_name().map(str::to_owned))
                .collect(),
        }),
    }
}

/// Locates, reads and parses the manifest of `source_dir`.
///
/// # Errors
///
/// Propagates the failures of [`locate_manifest`] and
/// [`ProjectManifest::from_slice`], plus I/O errors from reading the file.
pub fn load_manifest(source_dir: &Utf8Path) -> Result<(Utf8PathBuf, ProjectManifest)> {
    let path = locate_manifest(source_dir)?;
    let manifest = ProjectManifest::from_slice(&fs::read(&path)?)?;
    Ok((path, manifest))
}

fn plugin_name(entry: &Value) -> Option<&str> {
    entry
        .get(PLUGIN_NAME_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
