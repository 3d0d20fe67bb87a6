//! Archive creation, inspection, and manifest patching.
//!
//! The base archive is written by one of two interchangeable strategies:
//! the external 7-Zip compressor or the built-in deflate writer backed by the
//! `zip` crate. Both produce the same logical content (same entries under the
//! same forward-slash paths); compression levels differ.
//!
//! # Sub-modules
//!
//! - [`walk`] - Source tree traversal honouring top-level exclusions.
//! - [`builtin`] - In-process deflate writer.
//! - [`external`] - 7-Zip backed writer.
//! - [`entries`] - Read-side helpers for listing and extracting entries.
//! - [`patch`] - Per-version manifest replacement.

pub mod builtin;
pub mod entries;
pub mod external;
pub mod patch;
pub mod walk;

use crate::error::{PackagerError, Result};
use crate::exclude::ExcludeSet;
use crate::tool::{CommandExecutor, SevenZip};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::{fs, io};
use tempfile::NamedTempFile;

pub use builtin::BuiltinStrategy;
pub use external::SevenZipStrategy;

/// Creates a compressed archive of a directory tree.
pub trait ArchiveStrategy {
    /// Short human-readable name used in progress logs.
    fn name(&self) -> &'static str;

    /// Archives every file under `source_dir` except excluded top-level
    /// entries, writing the result to `output_path`.
    ///
    /// Returns the path of the written archive.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::SourceNotFound`] when `source_dir` is not a
    /// directory, [`PackagerError::ToolFailed`] when an external tool fails,
    /// and I/O or archive errors from the writer.
    fn create_archive(
        &self,
        source_dir: &Utf8Path,
        output_path: &Utf8Path,
        excludes: &ExcludeSet,
    ) -> Result<Utf8PathBuf>;
}

/// Picks the 7-Zip strategy when a compressor is available, otherwise the
/// built-in writer.
#[must_use]
pub fn select_strategy<'a>(
    seven_zip: Option<&'a SevenZip>,
    executor: &'a dyn CommandExecutor,
) -> Box<dyn ArchiveStrategy + 'a> {
    seven_zip.map_or_else(
        || Box::new(BuiltinStrategy) as Box<dyn ArchiveStrategy + 'a>,
        |tool| Box::new(SevenZipStrategy::new(tool, executor)),
    )
}

/// Fails with [`PackagerError::SourceNotFound`] unless `source_dir` is an
/// existing directory.
///
/// # Errors
///
/// See above.
pub fn ensure_source_dir(source_dir: &Utf8Path) -> Result<()> {
    if source_dir.is_dir() {
        Ok(())
    } else {
        Err(PackagerError::SourceNotFound {
            path: source_dir.to_owned(),
        })
    }
}

/// Converts a path using host separators into an archive path.
///
/// # Examples
///
/// ```
/// use uepack_packager::archive::normalize_arc_path;
///
/// assert_eq!(normalize_arc_path("Config\\DefaultGame.ini"), "Config/DefaultGame.ini");
/// ```
#[must_use]
pub fn normalize_arc_path(name: &str) -> String {
    name.replace('\\', "/")
}

/// Resolves `path` against the current directory unless it is already
/// absolute.
///
/// # Errors
///
/// Returns an I/O error when the current directory is unavailable or the
/// result is not valid UTF-8.
pub fn absolute_utf8(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let absolute = std::path::absolute(path)?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|p| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path is not valid UTF-8: {}", p.display()),
        )
        .into()
    })
}

/// Creates an empty temporary file in the directory of `destination`,
/// ready to be persisted over it once complete.
///
/// # Errors
///
/// Returns an I/O error when the directory cannot hold a new file.
pub(crate) fn stage_beside(destination: &Utf8Path, suffix: &str) -> Result<NamedTempFile> {
    let staged = tempfile::Builder::new()
        .prefix(".uepack-")
        .suffix(suffix)
        .tempfile_in(parent_dir(destination))?;
    Ok(staged)
}

/// Renames a finished temporary file over `destination`.
///
/// # Errors
///
/// Returns an I/O error when the rename fails; the temporary file is removed.
pub(crate) fn persist_staged(mut staged: NamedTempFile, destination: &Utf8Path) -> Result<()> {
    staged.as_file_mut().sync_all()?;
    staged
        .persist(destination)
        .map_err(|err| PackagerError::Io(err.error))?;
    Ok(())
}

fn parent_dir(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}

/// Removes `path`, treating a missing file as success and logging any other
/// failure instead of returning it.
pub(crate) fn discard_file(path: &Utf8Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            debug!(target: "uepack::archive", "could not remove {path}: {err}");
            false
        }
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
