//! Command-line interface definitions for the packager.
//!
//! This module defines the CLI structure using clap's derive API, and the
//! resolution of `build` arguments, a saved profile and `uepack.toml` into a
//! single [`BuildRun`].

use crate::catalog::VersionCatalog;
use crate::error::{PackagerError, Result};
use crate::exclude::ExcludeSet;
use crate::manifest::PluginStripSet;
use crate::pipeline::BuildRun;
use crate::profile::Profile;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use uepack::PackagerConfig;

/// Build per-engine-version archives from an Unreal project template.
#[derive(Parser, Debug)]
#[command(name = "uepack")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build per-engine-version archives from an Unreal project template.\n\n",
    "The template directory is compressed once into a base archive. For each ",
    "requested engine version the .uproject manifest is rewritten with the ",
    "matching EngineAssociation and stripped plugins, and a final archive is ",
    "produced from the base. 7-Zip is used when available; otherwise a ",
    "built-in zip writer is used.",
))]
#[command(after_help = concat!(
    "Examples:\n",
    "  uepack build --source ./MyGame --output ./dist --version \"UE 5.4\" --version \"UE 5.5\"\n",
    "  uepack build --profile release.json --strip-plugin Foo\n",
    "  uepack plugins --source ./MyGame\n",
    "  uepack preview --source ./MyGame --pattern \"{project}-{ueversion}\" --version \"UE 5.4\"\n",
    "  uepack versions --json",
))]
pub struct Cli {
    /// Path to a uepack.toml configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build one archive per requested engine version.
    Build(BuildArgs),
    /// List the plugins declared by a project's manifest.
    Plugins(PluginsArgs),
    /// Print the archive names a build would produce.
    Preview(PreviewArgs),
    /// List the engine version catalog.
    Versions(VersionsArgs),
}

/// Arguments for `uepack build`.
///
/// Explicit flags take precedence over the profile, which takes precedence
/// over `uepack.toml`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    /// Project template directory.
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<Utf8PathBuf>,

    /// Directory receiving the archives.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<Utf8PathBuf>,

    /// Archive naming pattern using {project} and {ueversion}.
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Engine version to build, by catalog id or label (can be repeated).
    #[arg(long = "version", value_name = "LABEL")]
    pub versions: Vec<String>,

    /// Saved build profile (JSON).
    #[arg(long, value_name = "FILE")]
    pub profile: Option<Utf8PathBuf>,

    /// Engine version catalog (JSON).
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<Utf8PathBuf>,

    /// Plugin to remove from every manifest (can be repeated).
    #[arg(long = "strip-plugin", value_name = "NAME")]
    pub strip_plugins: Vec<String>,

    /// Additional top-level name to leave out (can be repeated).
    #[arg(long = "exclude", value_name = "NAME")]
    pub excludes: Vec<String>,

    /// Path to the 7-Zip executable.
    #[arg(long = "seven-zip", value_name = "PATH")]
    pub seven_zip: Option<Utf8PathBuf>,

    /// Cancel the build after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Suppress build log and progress output.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for `uepack plugins`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginsArgs {
    /// Project template directory.
    #[arg(short, long, value_name = "DIR")]
    pub source: Utf8PathBuf,

    /// Output as JSON instead of human-readable format.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `uepack preview`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewArgs {
    /// Project template directory.
    #[arg(short, long, value_name = "DIR")]
    pub source: Utf8PathBuf,

    /// Archive naming pattern; defaults to the configured pattern.
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Engine version label (can be repeated).
    #[arg(long = "version", value_name = "LABEL", required = true)]
    pub versions: Vec<String>,
}

/// Arguments for `uepack versions`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionsArgs {
    /// Engine version catalog (JSON); defaults to the built-in catalog.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<Utf8PathBuf>,

    /// Output as JSON instead of human-readable format.
    #[arg(long)]
    pub json: bool,
}

impl BuildArgs {
    /// Returns the timeout as a duration.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Returns the 7-Zip path from the flag or the configuration.
    #[must_use]
    pub fn seven_zip_path<'a>(&'a self, config: &'a PackagerConfig) -> Option<&'a Utf8Path> {
        self.seven_zip.as_deref().or_else(|| config.seven_zip_path())
    }

    /// Merges these arguments with the profile they name and `config`.
    ///
    /// Versions given with `--version` replace the profile's selection.
    /// Exclusions and stripped plugins accumulate across all three sources.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::MissingInput`] when no source, output or
    /// version is available, and the load errors of the profile and catalog.
    pub fn resolve(&self, config: &PackagerConfig) -> Result<BuildRun> {
        let profile = self.profile.as_deref().map(Profile::load).transpose()?;
        let catalog_path = self
            .catalog
            .as_deref()
            .or(config.catalog_path.as_deref());
        let catalog = VersionCatalog::load_or_builtin(catalog_path)?;

        let source_dir = self
            .source
            .clone()
            .or_else(|| profile_path(profile.as_ref(), |p| &p.template_dir))
            .ok_or(PackagerError::MissingInput { what: "--source" })?;
        let output_dir = self
            .output
            .clone()
            .or_else(|| profile_path(profile.as_ref(), |p| &p.output_dir))
            .ok_or(PackagerError::MissingInput { what: "--output" })?;

        let selections = if self.versions.is_empty() {
            profile
                .as_ref()
                .map_or_else(|| Ok(Vec::new()), |p| p.selections(&catalog))?
        } else {
            self.versions
                .iter()
                .filter(|label| !label.trim().is_empty())
                .map(|label| catalog.selection_for(label))
                .collect()
        };
        if selections.is_empty() {
            return Err(PackagerError::MissingInput { what: "--version" });
        }

        let mut excludes = ExcludeSet::with_defaults();
        excludes.extend(&config.extra_excludes);
        if let Some(p) = &profile {
            excludes.extend(&p.root_excludes);
        }
        excludes.extend(&self.excludes);

        let profile_plugins = profile.iter().flat_map(|p| p.plugins_to_strip.iter());
        let plugins_to_strip: PluginStripSet = profile_plugins
            .chain(&self.strip_plugins)
            .map(String::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        let name_pattern = self
            .pattern
            .clone()
            .or_else(|| profile.as_ref().map(|p| p.zip_pattern.clone()))
            .unwrap_or_else(|| config.name_pattern().to_owned());

        Ok(BuildRun {
            source_dir,
            output_dir,
            name_pattern,
            selections,
            excludes,
            plugins_to_strip,
        })
    }
}

fn profile_path(
    profile: Option<&Profile>,
    field: impl Fn(&Profile) -> &String,
) -> Option<Utf8PathBuf> {
    profile
        .map(field)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(Utf8PathBuf::from)
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
