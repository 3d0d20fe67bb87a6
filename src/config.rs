//! Tool configuration loaded from `uepack.toml`.
//!
//! `PackagerConfig` captures the settings that persist between build runs:
//! where the external compressor lives, the default archive naming pattern,
//! extra top-level exclusions and the version catalog location. Every field
//! falls back to a default when omitted so an empty file is valid.
//!
//! Discovery walks an explicit path first, then the `UEPACK_CONFIG`
//! environment variable, then the platform configuration directory. Only the
//! last step tolerates a missing file.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::io;
use thiserror::Error;

/// File name looked up in the platform configuration directory.
pub const CONFIG_FILE_NAME: &str = "uepack.toml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "UEPACK_CONFIG";

/// Naming pattern used when neither the config nor the caller supplies one.
pub const DEFAULT_NAME_PATTERN: &str = "{project}_{ueversion}";

/// Errors raised while locating or parsing `uepack.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file {path} not found")]
    NotFound {
        /// Path that was requested.
        path: Utf8PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {path}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or violates the schema.
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        #[source]
        source: toml::de::Error,
    },
}

/// Persistent packager settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Explicit location of the 7-Zip executable.
    ///
    /// When absent or blank the packager probes `PATH` for the conventional
    /// executable names and falls back to the built-in zip writer when none
    /// responds.
    pub seven_zip_path: Option<Utf8PathBuf>,
    /// Archive naming pattern with `{project}` and `{ueversion}` placeholders.
    pub name_pattern: String,
    /// Top-level entry names excluded in addition to the built-in defaults.
    pub extra_excludes: Vec<String>,
    /// Location of the engine version catalog JSON file.
    pub catalog_path: Option<Utf8PathBuf>,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            seven_zip_path: None,
            name_pattern: DEFAULT_NAME_PATTERN.to_owned(),
            extra_excludes: Vec::new(),
            catalog_path: None,
        }
    }
}

impl PackagerConfig {
    /// Parses configuration from TOML source text.
    ///
    /// # Errors
    ///
    /// Returns the TOML diagnostic when the text is malformed or contains
    /// unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use uepack::PackagerConfig;
    ///
    /// let config = PackagerConfig::from_toml_str("name_pattern = \"{project}-{ueversion}\"\n")?;
    /// assert_eq!(config.name_pattern, "{project}-{ueversion}");
    /// # Ok::<(), toml::de::Error>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when the file is missing,
    /// [`ConfigError::Read`] on other I/O failures and [`ConfigError::Parse`]
    /// when the contents are invalid.
    pub fn load_from(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_owned(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        debug!(target: "uepack::config", "loaded configuration from {path}");
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Resolves and loads the configuration.
    ///
    /// `explicit` wins over `UEPACK_CONFIG`, which wins over the platform
    /// default location. Missing explicit or environment-selected files are
    /// errors; a missing default file yields [`PackagerConfig::default`].
    ///
    /// # Errors
    ///
    /// Propagates the failures of [`Self::load_from`].
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Some(path) = env_config_path() {
            return Self::load_from(&path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads configuration through the supplied loader.
    ///
    /// Lets tests and embedding front ends substitute their own source
    /// without touching the file system.
    ///
    /// # Errors
    ///
    /// Returns whatever the loader returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use uepack::PackagerConfig;
    ///
    /// let config = PackagerConfig::load_with(|| Ok(PackagerConfig::default()))?;
    /// assert_eq!(config.name_pattern, "{project}_{ueversion}");
    /// # Ok::<(), uepack::ConfigError>(())
    /// ```
    pub fn load_with<F>(loader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce() -> Result<Self, ConfigError>,
    {
        loader()
    }

    /// Returns the configured compressor path, ignoring blank values.
    #[must_use]
    pub fn seven_zip_path(&self) -> Option<&Utf8Path> {
        self.seven_zip_path
            .as_deref()
            .filter(|path| !path.as_str().trim().is_empty())
    }

    /// Returns the naming pattern, substituting the default for blank values.
    #[must_use]
    pub fn name_pattern(&self) -> &str {
        let trimmed = self.name_pattern.trim();
        if trimmed.is_empty() {
            DEFAULT_NAME_PATTERN
        } else {
            trimmed
        }
    }
}

/// Returns the platform-specific default location of `uepack.toml`.
///
/// Resolves to `~/.config/uepack/uepack.toml` on most Linux systems, the
/// Application Support directory on macOS and the roaming AppData directory on
/// Windows.
#[must_use]
pub fn default_config_path() -> Option<Utf8PathBuf> {
    directories_next::ProjectDirs::from("", "", "uepack")
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok())
        .map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn env_config_path() -> Option<Utf8PathBuf> {
    std::env::var(CONFIG_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(Utf8PathBuf::from)
}
