//! Per-version manifest replacement.
//!
//! Each final archive is the base archive with one entry swapped: the
//! project manifest. Two routes produce it:
//!
//! 1. **In-place update**: copy the base archive to a temporary file next to
//!    the destination and let 7-Zip replace the entry by file name. Only
//!    attempted when the manifest sits at the archive root; the result is
//!    read back and renamed over the destination once it checks out.
//! 2. **Rewrite**: stream every other entry into a fresh archive next to
//!    the destination, append the new manifest under its exact archive path,
//!    then rename the finished file over the destination.
//!
//! Any failure of route 1 falls through to route 2. Neither route touches
//! the destination until its archive is complete.

use super::entries::read_entry;
use super::{normalize_arc_path, persist_staged, stage_beside};
use crate::error::{PackagerError, Result};
use crate::tool::{CommandExecutor, SevenZip};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io::{self, BufReader, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// How a final archive was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMethod {
    /// 7-Zip updated a copy of the base archive in place.
    InPlaceUpdate,
    /// The archive was rewritten entry by entry.
    Rewrite,
}

/// Inputs for a single patch operation.
#[derive(Debug, Clone, Copy)]
pub struct PatchRequest<'a> {
    /// The shared base archive.
    pub base_archive: &'a Utf8Path,
    /// Destination of the final archive.
    pub output_archive: &'a Utf8Path,
    /// Archive path of the manifest entry to replace.
    pub manifest_arc_path: &'a str,
    /// Replacement manifest contents.
    pub manifest_bytes: &'a [u8],
}

/// Produces `request.output_archive` from the base archive with the manifest
/// entry replaced.
///
/// The in-place route is attempted only when `seven_zip` is available and
/// the manifest has no directory component; otherwise, or when that route
/// fails or yields the wrong manifest, the archive is rewritten.
///
/// # Errors
///
/// Returns I/O or archive errors from the rewrite route. Errors from the
/// in-place route are logged and never surface.
pub fn patch_archive(
    request: &PatchRequest<'_>,
    seven_zip: Option<&SevenZip>,
    executor: &dyn CommandExecutor,
) -> Result<PatchMethod> {
    if let Some(tool) = seven_zip.filter(|_| is_root_entry(request.manifest_arc_path)) {
        match update_in_place(request, tool, executor) {
            Ok(()) => return Ok(PatchMethod::InPlaceUpdate),
            Err(err) => warn!(
                target: "uepack::patch",
                "7-Zip update of {} failed, rewriting instead: {err}",
                request.output_archive
            ),
        }
    }

    rewrite_archive(request)?;
    Ok(PatchMethod::Rewrite)
}

/// Rewrites the base archive with the manifest entry replaced.
///
/// The new archive is assembled in a temporary file inside the destination
/// directory and renamed into place only once complete, so the destination
/// is either the finished archive or untouched.
///
/// # Errors
///
/// Returns I/O or archive errors; the destination is left as it was.
pub fn rewrite_archive(request: &PatchRequest<'_>) -> Result<()> {
    let mut staged = stage_beside(request.output_archive, ".zip.part")?;
    copy_with_replacement(request, staged.as_file_mut())?;
    persist_staged(staged, request.output_archive)?;
    debug!(target: "uepack::patch", "rewrote {}", request.output_archive);
    Ok(())
}

fn copy_with_replacement(request: &PatchRequest<'_>, destination: &mut fs::File) -> Result<()> {
    let wanted = normalize_arc_path(request.manifest_arc_path);
    let mut base = ZipArchive::new(BufReader::new(fs::File::open(request.base_archive)?))?;
    let mut writer = ZipWriter::new(destination);

    for index in 0..base.len() {
        let entry = base.by_index_raw(index)?;
        if normalize_arc_path(entry.name()) == wanted {
            continue;
        }
        writer.raw_copy_file(entry)?;
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(wanted.as_str(), options)?;
    writer.write_all(request.manifest_bytes)?;
    writer.finish()?;
    Ok(())
}

fn update_in_place(
    request: &PatchRequest<'_>,
    tool: &SevenZip,
    executor: &dyn CommandExecutor,
) -> Result<()> {
    // 7-Zip picks the archive format from the extension, so the copy keeps
    // `.zip` as its suffix.
    let staged = stage_beside(request.output_archive, ".zip")?;
    let staged_path = Utf8Path::from_path(staged.path()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("temporary path is not valid UTF-8: {}", staged.path().display()),
        )
    })?;
    fs::copy(request.base_archive, staged_path)?;

    let scratch = tempfile::tempdir()?;
    let scratch_dir = Utf8PathBuf::from_path_buf(scratch.path().to_path_buf()).map_err(|p| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("temporary directory is not valid UTF-8: {}", p.display()),
        )
    })?;
    let replacement = scratch_dir.join(request.manifest_arc_path);
    fs::write(&replacement, request.manifest_bytes)?;

    tool.update_entry(executor, staged_path, &replacement)?;

    // The update matches by file name only; confirm the entry really changed.
    let stored = read_entry(staged_path, request.manifest_arc_path)?;
    if stored.as_deref() != Some(request.manifest_bytes) {
        return Err(PackagerError::ToolFailed {
            operation: "update",
            message: format!(
                "archive does not expose the new {} after update",
                request.manifest_arc_path
            ),
        });
    }
    persist_staged(staged, request.output_archive)
}

/// Returns true when `arc_path` has no directory component.
fn is_root_entry(arc_path: &str) -> bool {
    !arc_path.is_empty() && !arc_path.contains(['/', '\\'])
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
