//! 7-Zip backed archive writer.

use super::{ArchiveStrategy, absolute_utf8, ensure_source_dir};
use crate::error::Result;
use crate::exclude::ExcludeSet;
use crate::tool::{CommandExecutor, SevenZip};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Creates the archive by running `7z a` inside the source directory.
///
/// A non-zero exit is fatal; there is no fallback to the built-in writer
/// for archive creation.
pub struct SevenZipStrategy<'a> {
    tool: &'a SevenZip,
    executor: &'a dyn CommandExecutor,
}

impl<'a> SevenZipStrategy<'a> {
    /// Binds the strategy to a located compressor and an executor.
    #[must_use]
    pub const fn new(tool: &'a SevenZip, executor: &'a dyn CommandExecutor) -> Self {
        Self { tool, executor }
    }
}

impl ArchiveStrategy for SevenZipStrategy<'_> {
    fn name(&self) -> &'static str {
        "7-Zip"
    }

    fn create_archive(
        &self,
        source_dir: &Utf8Path,
        output_path: &Utf8Path,
        excludes: &ExcludeSet,
    ) -> Result<Utf8PathBuf> {
        ensure_source_dir(source_dir)?;
        // The tool runs inside `source_dir`, so a relative output would land
        // in the project tree.
        let output = absolute_utf8(output_path)?;
        // `7z a` appends to an existing archive.
        match fs::remove_file(&output) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        self.tool
            .create_archive(self.executor, source_dir, &output, excludes.iter())?;
        Ok(output)
    }
}
