//! Output formatting for the packager CLI.
//!
//! Listings are rendered either for people or as JSON. Build events are
//! turned into stderr lines so stdout carries only the produced archive
//! paths.

use crate::catalog::TargetSelection;
use crate::events::BuildEvent;
use crate::manifest::PluginEntry;
use camino::Utf8PathBuf;
use std::fmt::Display;
use std::io::Write;

/// Writes one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Writes one line of command output, ignoring write failures.
pub fn write_stdout_line(stdout: &mut dyn Write, message: impl Display) {
    if writeln!(stdout, "{message}").is_err() {
        // A closed pipe is not worth failing the command for.
    }
}

/// Renders a non-terminal build event as a stderr line.
///
/// Terminal events return `None`; the caller reports the outcome.
///
/// # Examples
///
/// ```
/// use uepack_packager::events::BuildEvent;
/// use uepack_packager::output::render_event;
///
/// assert_eq!(render_event(&BuildEvent::Progress(50)).as_deref(), Some("[ 50%]"));
/// assert_eq!(render_event(&BuildEvent::Canceled), None);
/// ```
#[must_use]
pub fn render_event(event: &BuildEvent) -> Option<String> {
    match event {
        BuildEvent::Log(line) => Some(line.clone()),
        BuildEvent::Progress(percent) => Some(format!("[{percent:>3}%]")),
        BuildEvent::Finished(_) | BuildEvent::Failed(_) | BuildEvent::Canceled => None,
    }
}

/// Summarises a completed build.
#[must_use]
pub fn success_message(archives: &[Utf8PathBuf]) -> String {
    match archives {
        [single] => format!("Built 1 archive: {single}"),
        _ => format!("Built {} archives.", archives.len()),
    }
}

/// Format plugin declarations for human-readable output.
#[must_use]
pub fn format_plugins_human(plugins: &[PluginEntry]) -> String {
    if plugins.is_empty() {
        return String::from("No plugins declared.");
    }
    let width = plugins
        .iter()
        .map(|plugin| plugin.name.chars().count())
        .max()
        .unwrap_or(0);
    plugins
        .iter()
        .map(|plugin| {
            let state = if plugin.enabled { "enabled" } else { "disabled" };
            format!("{:<width$}  {state}", plugin.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format plugin declarations as JSON.
#[must_use]
pub fn format_plugins_json(plugins: &[PluginEntry]) -> String {
    serde_json::to_string_pretty(plugins).unwrap_or_else(|_| "[]".to_owned())
}

/// Format catalog versions for human-readable output.
///
/// # Examples
///
/// ```
/// use uepack_packager::catalog::TargetSelection;
/// use uepack_packager::output::format_versions_human;
///
/// let versions = vec![TargetSelection::from_label("UE 5.4")];
/// assert_eq!(format_versions_human(&versions), "ue54  UE 5.4");
/// ```
#[must_use]
pub fn format_versions_human(versions: &[TargetSelection]) -> String {
    if versions.is_empty() {
        return String::from("No engine versions in the catalog.");
    }
    let id_width = column_width(versions, |v| &v.version_id);
    let label_width = column_width(versions, |v| &v.label);
    versions
        .iter()
        .map(|version| {
            let line = format!(
                "{:<id_width$}  {:<label_width$}  {}",
                version.version_id, version.label, version.engine_path
            );
            line.trim_end().to_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format catalog versions as JSON.
#[must_use]
pub fn format_versions_json(versions: &[TargetSelection]) -> String {
    serde_json::to_string_pretty(versions).unwrap_or_else(|_| "[]".to_owned())
}

fn column_width(versions: &[TargetSelection], field: impl Fn(&TargetSelection) -> &String) -> usize {
    versions
        .iter()
        .map(|version| field(version).chars().count())
        .max()
        .unwrap_or(0)
}
