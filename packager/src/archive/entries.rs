//! Read-side helpers for inspecting archives.
//!
//! Used to verify patched archives and by tests comparing the logical
//! content of archives produced by different strategies.

use super::normalize_arc_path;
use crate::error::Result;
use camino::Utf8Path;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Read};
use zip::ZipArchive;

fn open(archive: &Utf8Path) -> Result<ZipArchive<BufReader<fs::File>>> {
    let file = fs::File::open(archive)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Lists the archive paths of every file entry, skipping directory entries.
///
/// # Errors
///
/// Returns I/O or archive errors when the archive cannot be read.
pub fn list_file_entries(archive: &Utf8Path) -> Result<Vec<String>> {
    let mut zip = open(archive)?;
    let mut names = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let entry = zip.by_index_raw(index)?;
        if !entry.is_dir() {
            names.push(normalize_arc_path(entry.name()));
        }
    }
    names.sort();
    Ok(names)
}

/// Reads the decompressed bytes of the entry at `arc_path`.
///
/// Separators are normalised before comparison. Returns `None` when no
/// such entry exists.
///
/// # Errors
///
/// Returns I/O or archive errors when the archive cannot be read.
pub fn read_entry(archive: &Utf8Path, arc_path: &str) -> Result<Option<Vec<u8>>> {
    let wanted = normalize_arc_path(arc_path);
    let mut zip = open(archive)?;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        if entry.is_dir() || normalize_arc_path(entry.name()) != wanted {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        return Ok(Some(contents));
    }
    Ok(None)
}

/// Reads every file entry into a map from archive path to decompressed
/// bytes.
///
/// # Errors
///
/// Returns I/O or archive errors when the archive cannot be read.
pub fn read_all_files(archive: &Utf8Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut zip = open(archive)?;
    let mut files = BTreeMap::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        files.insert(normalize_arc_path(entry.name()), contents);
    }
    Ok(files)
}
