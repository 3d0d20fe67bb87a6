//! Build orchestration.
//!
//! A run builds one base archive from the source tree, then derives one
//! final archive per selected engine version by replacing the manifest
//! entry. Steps run strictly in sequence:
//!
//! ```text
//! Preparing -> BuildingBase -> (Mutating -> Patching -> Emitted)* -> Cleanup -> Done
//! ```
//!
//! Cancellation is polled between steps and ends the run with
//! [`BuildOutcome::Canceled`]. The base archive is removed whatever the
//! outcome.

use crate::archive::patch::{PatchRequest, patch_archive};
use crate::archive::{absolute_utf8, discard_file, ensure_source_dir, select_strategy};
use crate::catalog::TargetSelection;
use crate::error::{PackagerError, Result};
use crate::events::{BuildObserver, CancellationToken};
use crate::exclude::ExcludeSet;
use crate::manifest::{PluginStripSet, ProjectManifest, load_manifest};
use crate::naming::{archive_file_name, engine_association, project_name};
use crate::tool::{CommandExecutor, SevenZip};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use std::fmt;
use std::fs;

/// File name of the transient base archive inside the output directory.
pub const BASE_ARCHIVE_NAME: &str = "__UE_BASE___BASE.zip";

/// Everything one build needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRun {
    /// Project template directory.
    pub source_dir: Utf8PathBuf,
    /// Directory receiving the archives; created when missing.
    pub output_dir: Utf8PathBuf,
    /// Archive naming pattern.
    pub name_pattern: String,
    /// Versions to build, in output order.
    pub selections: Vec<TargetSelection>,
    /// Top-level names left out of the base archive.
    pub excludes: ExcludeSet,
    /// Plugin names removed from every manifest.
    pub plugins_to_strip: PluginStripSet,
}

impl BuildRun {
    /// Creates a run with the default pattern and exclusions and no
    /// selections.
    #[must_use]
    pub fn new(source_dir: impl Into<Utf8PathBuf>, output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            name_pattern: uepack::DEFAULT_NAME_PATTERN.to_owned(),
            selections: Vec::new(),
            excludes: ExcludeSet::with_defaults(),
            plugins_to_strip: PluginStripSet::new(),
        }
    }
}

/// External collaborators of a run.
#[derive(Clone, Copy)]
pub struct BuildTools<'a> {
    /// Runs the compressor.
    pub executor: &'a dyn CommandExecutor,
    /// The located compressor, if any.
    pub seven_zip: Option<&'a SevenZip>,
}

/// Steps of a run, reported in trace logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    /// Validating inputs and reading the manifest.
    Preparing,
    /// Writing the base archive.
    BuildingBase,
    /// Producing a version's manifest.
    Mutating,
    /// Producing a version's archive.
    Patching,
    /// A version's archive is complete.
    Emitted,
    /// Removing the base archive.
    Cleanup,
    /// Every archive is complete.
    Done,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preparing => "preparing",
            Self::BuildingBase => "building base archive",
            Self::Mutating => "mutating manifest",
            Self::Patching => "patching archive",
            Self::Emitted => "emitted",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Every selection produced an archive; paths follow selection order.
    Completed(Vec<Utf8PathBuf>),
    /// Cancellation was observed at a checkpoint.
    Canceled,
}

/// Rounds `100 * done / total` to the nearest integer, clamped to `0..=100`.
///
/// # Examples
///
/// ```
/// use uepack_packager::pipeline::progress_percent;
///
/// assert_eq!(progress_percent(1, 3), 33);
/// assert_eq!(progress_percent(2, 3), 67);
/// assert_eq!(progress_percent(0, 0), 100);
/// ```
#[must_use]
pub fn progress_percent(done: usize, total: usize) -> u8 {
    let scaled = done.saturating_mul(200).saturating_add(total);
    let percent = scaled.checked_div(total.saturating_mul(2)).unwrap_or(100);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

struct Prepared {
    source_dir: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    project: String,
    manifest_arc_path: String,
    manifest: ProjectManifest,
}

/// Runs a build to completion, cancellation or the first error.
///
/// Progress starts at 0, is reported after each version and ends at 100 on
/// success. Source and output directories are resolved to canonical paths,
/// so the project name comes from the real directory name. When a version
/// fails, its destination keeps whatever it held before the run while
/// archives from earlier versions stay on disk.
///
/// # Errors
///
/// Returns precondition errors ([`PackagerError::SourceNotFound`],
/// [`PackagerError::OutputNotWritable`], [`PackagerError::ManifestNotFound`],
/// [`PackagerError::AmbiguousManifest`]), [`PackagerError::InvalidManifest`]
/// for a malformed manifest, [`PackagerError::ToolFailed`] when the
/// compressor cannot create the base archive, and I/O or archive errors.
pub fn run_build(
    run: &BuildRun,
    tools: BuildTools<'_>,
    observer: &dyn BuildObserver,
    cancel: &CancellationToken,
) -> Result<BuildOutcome> {
    observer.on_log("Starting build...");
    observer.on_progress(0);
    if checkpoint(cancel, observer) {
        return Ok(BuildOutcome::Canceled);
    }

    enter(BuildStage::Preparing);
    let prepared = prepare(run)?;
    let base_archive = prepared.output_dir.join(BASE_ARCHIVE_NAME);

    let outcome = build_archives(run, tools, &prepared, &base_archive, observer, cancel);

    enter(BuildStage::Cleanup);
    if !discard_file(&base_archive) {
        observer.on_log(&format!("Could not remove temporary archive {base_archive}"));
    }

    if matches!(outcome, Ok(BuildOutcome::Completed(_))) {
        enter(BuildStage::Done);
        observer.on_log("All done.");
        observer.on_progress(100);
    }
    outcome
}

fn build_archives(
    run: &BuildRun,
    tools: BuildTools<'_>,
    prepared: &Prepared,
    base_archive: &Utf8Path,
    observer: &dyn BuildObserver,
    cancel: &CancellationToken,
) -> Result<BuildOutcome> {
    if checkpoint(cancel, observer) {
        return Ok(BuildOutcome::Canceled);
    }

    enter(BuildStage::BuildingBase);
    let strategy = select_strategy(tools.seven_zip, tools.executor);
    observer.on_log(&format!(
        "Creating base zip with {} (excluding {})...",
        strategy.name(),
        run.excludes.iter().collect::<Vec<_>>().join(", ")
    ));
    strategy.create_archive(&prepared.source_dir, base_archive, &run.excludes)?;
    observer.on_log("Base zip ready.");
    if checkpoint(cancel, observer) {
        return Ok(BuildOutcome::Canceled);
    }

    let total = run.selections.len();
    let mut produced = Vec::with_capacity(total);
    for (index, selection) in run.selections.iter().enumerate() {
        if checkpoint(cancel, observer) {
            return Ok(BuildOutcome::Canceled);
        }

        let archive = build_version(run, tools, prepared, base_archive, selection, observer)?;
        produced.push(archive);
        observer.on_progress(progress_percent(index.saturating_add(1), total));

        if checkpoint(cancel, observer) {
            return Ok(BuildOutcome::Canceled);
        }
    }
    Ok(BuildOutcome::Completed(produced))
}

fn build_version(
    run: &BuildRun,
    tools: BuildTools<'_>,
    prepared: &Prepared,
    base_archive: &Utf8Path,
    selection: &TargetSelection,
    observer: &dyn BuildObserver,
) -> Result<Utf8PathBuf> {
    let label = selection.label.as_str();

    enter(BuildStage::Mutating);
    observer.on_log(&format!("[{label}] Mutating .uproject (EngineAssociation)..."));
    let manifest_bytes = prepared
        .manifest
        .mutated(engine_association(label), &run.plugins_to_strip)?;

    let name = archive_file_name(&run.name_pattern, &prepared.project, label);
    if let Some(err) = &name.fallback {
        observer.on_log(&format!(
            "[{label}] Naming pattern {:?} is invalid ({err}); using {:?}",
            run.name_pattern,
            uepack::DEFAULT_NAME_PATTERN
        ));
    }
    let destination = prepared.output_dir.join(&name.file_name);

    enter(BuildStage::Patching);
    observer.on_log(&format!("[{label}] Writing final zip: {}", name.file_name));
    let request = PatchRequest {
        base_archive,
        output_archive: &destination,
        manifest_arc_path: &prepared.manifest_arc_path,
        manifest_bytes: &manifest_bytes,
    };
    let method = patch_archive(&request, tools.seven_zip, tools.executor)?;
    debug!(target: "uepack::pipeline", "{destination} written via {method:?}");

    enter(BuildStage::Emitted);
    observer.on_log(&format!("[{label}] Final zip ready: {}", name.file_name));
    Ok(destination)
}

fn prepare(run: &BuildRun) -> Result<Prepared> {
    ensure_source_dir(&absolute_utf8(&run.source_dir)?)?;
    let source_dir = run.source_dir.canonicalize_utf8()?;
    ensure_writable(&absolute_utf8(&run.output_dir)?)?;
    let output_dir = run.output_dir.canonicalize_utf8()?;

    let (manifest_path, manifest) = load_manifest(&source_dir)?;
    let manifest_arc_path = manifest_path
        .file_name()
        .map(str::to_owned)
        .ok_or_else(|| PackagerError::ManifestNotFound {
            dir: source_dir.clone(),
        })?;

    Ok(Prepared {
        project: project_name(&source_dir),
        source_dir,
        output_dir,
        manifest_arc_path,
        manifest,
    })
}

fn ensure_writable(output_dir: &Utf8Path) -> Result<()> {
    let not_writable = |err: std::io::Error| PackagerError::OutputNotWritable {
        path: output_dir.to_owned(),
        reason: err.to_string(),
    };
    fs::create_dir_all(output_dir).map_err(not_writable)?;
    tempfile::Builder::new()
        .prefix(".uepack-probe-")
        .tempfile_in(output_dir)
        .map(drop)
        .map_err(not_writable)
}

fn checkpoint(cancel: &CancellationToken, observer: &dyn BuildObserver) -> bool {
    let cancelled = cancel.is_cancelled();
    if cancelled {
        observer.on_log("Canceled.");
    }
    cancelled
}

fn enter(stage: BuildStage) {
    trace!(target: "uepack::pipeline", "stage: {stage}");
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
