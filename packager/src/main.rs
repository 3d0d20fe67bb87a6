//! uepack CLI entrypoint.
//!
//! This binary builds per-engine-version archives from an Unreal project
//! template. Build logs and progress go to stderr; the paths of the produced
//! archives go to stdout, one per line.

use clap::Parser;
use std::io::Write;
use uepack::PackagerConfig;
use uepack_packager::archive::{absolute_utf8, ensure_source_dir};
use uepack_packager::catalog::VersionCatalog;
use uepack_packager::cli::{BuildArgs, Cli, Command, PluginsArgs, PreviewArgs, VersionsArgs};
use uepack_packager::error::{PackagerError, Result};
use uepack_packager::events::BuildEvent;
use uepack_packager::manifest::load_manifest;
use uepack_packager::naming::{NamePattern, preview};
use uepack_packager::output::{
    format_plugins_human, format_plugins_json, format_versions_human, format_versions_json,
    render_event, success_message, write_stderr_line, write_stdout_line,
};
use uepack_packager::tool::{SystemCommandExecutor, locate_seven_zip};
use uepack_packager::worker::BuildWorker;

/// Exit code reported when a build is cancelled.
const EXIT_CANCELED: i32 = 130;

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStatus {
    Completed,
    Canceled,
}

fn main() {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<RunStatus> {
    let config = PackagerConfig::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Build(args) => run_build_command(&config, args, stdout, stderr),
        Command::Plugins(args) => run_plugins(args, stdout),
        Command::Preview(args) => run_preview(&config, args, stdout, stderr),
        Command::Versions(args) => run_versions(&config, args, stdout),
    }
}

/// Runs a build on a worker thread, streaming its events to stderr.
fn run_build_command(
    config: &PackagerConfig,
    args: &BuildArgs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<RunStatus> {
    let run = args.resolve(config)?;
    let executor = SystemCommandExecutor;
    let seven_zip = locate_seven_zip(args.seven_zip_path(config), &executor);

    if !args.quiet {
        let strategy = seven_zip.as_ref().map_or_else(
            || "7-Zip not found; using the built-in zip writer.".to_owned(),
            |tool| format!("Using 7-Zip at {}", tool.program()),
        );
        write_stderr_line(stderr, strategy);
    }

    let handle = BuildWorker::spawn(run, Box::new(executor), seven_zip)?;
    let terminal = handle.wait(args.timeout(), |event| {
        if args.quiet {
            return;
        }
        if let Some(line) = render_event(event) {
            write_stderr_line(stderr, line);
        }
    })?;

    match terminal {
        BuildEvent::Finished(archives) => {
            for archive in &archives {
                write_stdout_line(stdout, archive);
            }
            if !args.quiet {
                write_stderr_line(stderr, success_message(&archives));
            }
            Ok(RunStatus::Completed)
        }
        BuildEvent::Canceled => Ok(RunStatus::Canceled),
        BuildEvent::Failed(message) => Err(PackagerError::BuildFailed { message }),
        other => Err(PackagerError::BuildFailed {
            message: format!("unexpected final event {other:?}"),
        }),
    }
}

/// Lists the plugins declared by the project's manifest.
fn run_plugins(args: &PluginsArgs, stdout: &mut dyn Write) -> Result<RunStatus> {
    let source_dir = absolute_utf8(&args.source)?;
    ensure_source_dir(&source_dir)?;
    let (_, manifest) = load_manifest(&source_dir)?;
    let plugins = manifest.plugins();

    let text = if args.json {
        format_plugins_json(&plugins)
    } else {
        format_plugins_human(&plugins)
    };
    write_stdout_line(stdout, text);
    Ok(RunStatus::Completed)
}

/// Prints the archive names a build would produce.
fn run_preview(
    config: &PackagerConfig,
    args: &PreviewArgs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<RunStatus> {
    let pattern = args.pattern.as_deref().unwrap_or_else(|| config.name_pattern());
    if let Err(err) = NamePattern::parse(pattern) {
        write_stderr_line(
            stderr,
            format!(
                "Naming pattern {pattern:?} is invalid ({err}); using {:?}",
                uepack::DEFAULT_NAME_PATTERN
            ),
        );
    }

    let source_dir = args
        .source
        .canonicalize_utf8()
        .map_or_else(|_| absolute_utf8(&args.source), Ok)?;
    for name in preview(&source_dir, pattern, &args.versions) {
        write_stdout_line(stdout, name);
    }
    Ok(RunStatus::Completed)
}

/// Lists the engine version catalog.
fn run_versions(
    config: &PackagerConfig,
    args: &VersionsArgs,
    stdout: &mut dyn Write,
) -> Result<RunStatus> {
    let path = args.catalog.as_deref().or(config.catalog_path.as_deref());
    let catalog = VersionCatalog::load_or_builtin(path)?;

    let text = if args.json {
        format_versions_json(catalog.versions())
    } else {
        format_versions_human(catalog.versions())
    };
    write_stdout_line(stdout, text);
    Ok(RunStatus::Completed)
}

fn exit_code_for_run_result(result: Result<RunStatus>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(RunStatus::Completed) => 0,
        Ok(RunStatus::Canceled) => {
            write_stderr_line(stderr, "Build canceled.");
            EXIT_CANCELED
        }
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
