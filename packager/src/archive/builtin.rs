//! In-process deflate archive writer.

use super::walk::{ProjectFile, collect_project_files};
use super::{ArchiveStrategy, persist_staged, stage_beside};
use crate::error::Result;
use crate::exclude::ExcludeSet;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::{self, BufWriter, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes the archive with the `zip` crate, deflating every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinStrategy;

impl ArchiveStrategy for BuiltinStrategy {
    fn name(&self) -> &'static str {
        "built-in zip writer"
    }

    fn create_archive(
        &self,
        source_dir: &Utf8Path,
        output_path: &Utf8Path,
        excludes: &ExcludeSet,
    ) -> Result<Utf8PathBuf> {
        let files = collect_project_files(source_dir, excludes)?;
        debug!(
            target: "uepack::archive",
            "writing {} file(s) from {source_dir} to {output_path}",
            files.len()
        );

        write_zip(output_path, &files)?;
        Ok(output_path.to_owned())
    }
}

/// Writes `files` into a new deflate-compressed archive at `output_path`.
///
/// The archive is assembled in a `.zip.part` file next to `output_path` and
/// renamed over it once finished, so a failed write leaves any existing file
/// untouched.
///
/// # Errors
///
/// Returns I/O errors from reading sources or writing the archive, and
/// archive errors from the zip writer.
pub fn write_zip(output_path: &Utf8Path, files: &[ProjectFile]) -> Result<()> {
    let mut staged = stage_beside(output_path, ".zip.part")?;
    write_entries(staged.as_file_mut(), files)?;
    persist_staged(staged, output_path)
}

fn write_entries(output: &mut fs::File, files: &[ProjectFile]) -> Result<()> {
    let mut writer = ZipWriter::new(BufWriter::new(output));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        let len = fs::metadata(&file.path)?.len();
        writer.start_file(
            file.arc_path.as_str(),
            options.large_file(len >= u64::from(u32::MAX)),
        )?;
        let mut source = fs::File::open(&file.path)?;
        io::copy(&mut source, &mut writer)?;
    }

    let mut inner = writer.finish()?;
    inner.flush()?;
    Ok(())
}
