//! Source tree traversal for the base archive.

use super::ensure_source_dir;
use crate::error::Result;
use crate::exclude::ExcludeSet;
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use walkdir::{DirEntry, WalkDir};

/// A file selected for archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Location on disk.
    pub path: Utf8PathBuf,
    /// Path inside the archive, relative to the source root with `/`
    /// separators.
    pub arc_path: String,
}

/// Collects every regular file under `source_dir`, skipping top-level
/// entries named in `excludes` together with their descendants.
///
/// Results are sorted by archive path so both archive strategies and tests
/// see a stable order.
///
/// # Errors
///
/// Returns [`crate::error::PackagerError::SourceNotFound`] when
/// `source_dir` is not a directory, and I/O errors from the traversal,
/// including paths that are not valid UTF-8.
pub fn collect_project_files(
    source_dir: &Utf8Path,
    excludes: &ExcludeSet,
) -> Result<Vec<ProjectFile>> {
    ensure_source_dir(source_dir)?;

    let walker = WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_top_level(entry, excludes));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(non_utf8)?;
        let arc_path = arc_path_for(source_dir, &path)?;
        files.push(ProjectFile { path, arc_path });
    }

    files.sort_by(|a, b| a.arc_path.cmp(&b.arc_path));
    Ok(files)
}

/// Returns the forward-slash archive path of `path` relative to `root`.
///
/// # Errors
///
/// Returns an I/O error of kind `InvalidInput` when `path` is not below
/// `root`.
pub fn arc_path_for(root: &Utf8Path, path: &Utf8Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{path} is not inside {root}"),
        )
    })?;
    let segments: Vec<&str> = relative.components().map(|c| c.as_str()).collect();
    Ok(segments.join("/"))
}

fn is_excluded_top_level(entry: &DirEntry, excludes: &ExcludeSet) -> bool {
    entry.depth() == 1
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

fn non_utf8(path: std::path::PathBuf) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("path is not valid UTF-8: {}", path.display()),
    )
}
