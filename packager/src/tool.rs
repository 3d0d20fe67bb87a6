//! External compressor discovery and invocation.
//!
//! The packager prefers 7-Zip for building the base archive and for patching
//! root-level manifests. This module locates the executable and renders the
//! two command forms the pipeline needs, running them through a
//! [`CommandExecutor`] so tests can script the responses.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::process::{Command, Output};

/// Executable names probed on `PATH` when no explicit location is configured.
pub const SEVEN_ZIP_CANDIDATES: [&str; 3] = ["7z", "7z.exe", "7za"];

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// When `cwd` is set the child process runs with that working directory.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use uepack_packager::tool::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("7z", &["i"], None)?;
    /// assert!(output.status.success());
    /// # Ok::<(), uepack_packager::error::PackagerError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<Output> {
        let mut command = Command::new(cmd);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        command.output().map_err(PackagerError::from)
    }
}

/// A resolved 7-Zip executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SevenZip {
    program: Utf8PathBuf,
}

impl SevenZip {
    /// Wraps an executable path or bare command name.
    #[must_use]
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable path or command name.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Renders the arguments that create a zip archive of the working
    /// directory, leaving out each top-level name in `excludes`.
    ///
    /// Exclusions use `-xr-!`, which turns off recursive matching, so a
    /// nested directory sharing an excluded name is still archived.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use uepack_packager::tool::SevenZip;
    ///
    /// let args = SevenZip::create_args(Utf8Path::new("/out/base.zip"), ["Saved", ".git"]);
    /// assert_eq!(
    ///     args,
    ///     ["a", "-tzip", "-mx=5", "-y", "/out/base.zip", "-xr-!Saved", "-xr-!.git", "*"]
    /// );
    /// ```
    #[must_use]
    pub fn create_args<'a>(
        archive: &Utf8Path,
        excludes: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        let mut args: Vec<String> = ["a", "-tzip", "-mx=5", "-y"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        args.push(archive.as_str().to_owned());
        args.extend(excludes.into_iter().map(|name| format!("-xr-!{name}")));
        args.push("*".to_owned());
        args
    }

    /// Renders the arguments that update `archive` with `file`, matching the
    /// existing entry by file name.
    #[must_use]
    pub fn update_args(archive: &Utf8Path, file: &Utf8Path) -> Vec<String> {
        vec![
            "u".to_owned(),
            "-y".to_owned(),
            archive.as_str().to_owned(),
            file.as_str().to_owned(),
        ]
    }

    /// Creates `archive` from the contents of `source_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ToolFailed`] when the compressor exits
    /// unsuccessfully, or [`PackagerError::Io`] when it cannot be spawned.
    pub fn create_archive<'a>(
        &self,
        executor: &dyn CommandExecutor,
        source_dir: &Utf8Path,
        archive: &Utf8Path,
        excludes: impl IntoIterator<Item = &'a str>,
    ) -> Result<()> {
        let args = Self::create_args(archive, excludes);
        self.invoke(executor, "create", &args, Some(source_dir))
    }

    /// Replaces the entry named like `file` inside `archive`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ToolFailed`] when the compressor exits
    /// unsuccessfully, or [`PackagerError::Io`] when it cannot be spawned.
    pub fn update_entry(
        &self,
        executor: &dyn CommandExecutor,
        archive: &Utf8Path,
        file: &Utf8Path,
    ) -> Result<()> {
        let args = Self::update_args(archive, file);
        self.invoke(executor, "update", &args, None)
    }

    fn invoke(
        &self,
        executor: &dyn CommandExecutor,
        operation: &'static str,
        args: &[String],
        cwd: Option<&Utf8Path>,
    ) -> Result<()> {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        debug!(target: "uepack::tool", "{} {}", self.program, arg_refs.join(" "));
        let output = executor.run(self.program.as_str(), &arg_refs, cwd)?;
        ensure_success(operation, &output)
    }
}

/// Locates the 7-Zip executable.
///
/// An explicit path is used when it exists on disk. Otherwise each name in
/// [`SEVEN_ZIP_CANDIDATES`] is probed through `executor`; the first one that
/// runs successfully wins. Returns `None` when nothing responds, which
/// selects the built-in archive writer.
#[must_use]
pub fn locate_seven_zip(
    explicit: Option<&Utf8Path>,
    executor: &dyn CommandExecutor,
) -> Option<SevenZip> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Some(SevenZip::new(path));
        }
        warn!(target: "uepack::tool", "configured 7-Zip path {path} does not exist; probing PATH");
    }

    SEVEN_ZIP_CANDIDATES
        .into_iter()
        .find(|name| command_succeeds(executor, name, &["i"]))
        .map(SevenZip::new)
}

/// Returns true if the given command executes successfully.
fn command_succeeds(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> bool {
    executor
        .run(cmd, args, None)
        .is_ok_and(|output| output.status.success())
}

fn ensure_success(operation: &'static str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    let message = if trimmed.is_empty() {
        output.status.to_string()
    } else {
        trimmed.to_owned()
    };
    Err(PackagerError::ToolFailed { operation, message })
}

#[cfg(test)]
#[path = "tool_tests.rs"]
mod tests;
