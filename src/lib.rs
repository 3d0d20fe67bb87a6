//! Shared configuration for the uepack project packager.
//!
//! The packager keeps its tool settings in `uepack.toml`. This crate owns the
//! schema and the discovery rules so that the CLI and any embedding front end
//! resolve the same values.

pub mod config;

pub use config::{
    CONFIG_ENV_VAR, CONFIG_FILE_NAME, ConfigError, DEFAULT_NAME_PATTERN, PackagerConfig,
    default_config_path,
};
