//! Unit tests for manifest patching.

use super::*;
use crate::archive::builtin::write_zip;
use crate::archive::entries::read_all_files;
use crate::archive::walk::ProjectFile;
use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;
use std::process::Output;
use tempfile::TempDir;

const OLD_MANIFEST: &[u8] = br#"{"EngineAssociation": ""}"#;
const NEW_MANIFEST: &[u8] = br#"{"EngineAssociation": "5.4"}"#;

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Builds a base archive containing `entries` and returns its path.
    fn base_archive(&self, entries: &[(&str, &[u8])]) -> Utf8PathBuf {
        let staging = self.path("staging");
        let files: Vec<ProjectFile> = entries
            .iter()
            .map(|(arc_path, body)| {
                let path = staging.join(arc_path);
                fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
                fs::write(&path, body).expect("write entry");
                ProjectFile {
                    path,
                    arc_path: (*arc_path).to_owned(),
                }
            })
            .collect();
        let archive = self.path("base.zip");
        write_zip(&archive, &files).expect("base archive");
        archive
    }

    /// Lists temporary archives left in the workspace root.
    fn staged_files(&self) -> Vec<String> {
        fs::read_dir(&self.root)
            .expect("list dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".uepack-"))
            .collect()
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8");
    Workspace { _dir: dir, root }
}

fn expected_after_patch(
    base: &Utf8Path,
    arc_path: &str,
    manifest: &[u8],
) -> BTreeMap<String, Vec<u8>> {
    let mut expected = read_all_files(base).expect("read base");
    expected.insert(arc_path.to_owned(), manifest.to_vec());
    expected
}

#[rstest]
fn rewrite_replaces_nested_manifest_and_keeps_the_rest(workspace: Workspace) {
    let base = workspace.base_archive(&[
        ("MyGame/MyGame.uproject", OLD_MANIFEST),
        ("MyGame/Config/DefaultGame.ini", b"[/Script/EngineSettings]"),
        ("MyGame/Content/Main.umap", &[0_u8, 1, 2, 3, 255]),
    ]);
    let output = workspace.path("MyGame_5_4.zip");
    let request = PatchRequest {
        base_archive: &base,
        output_archive: &output,
        manifest_arc_path: "MyGame/MyGame.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    rewrite_archive(&request).expect("rewrite succeeds");

    assert_eq!(
        read_all_files(&output).expect("read output"),
        expected_after_patch(&base, "MyGame/MyGame.uproject", NEW_MANIFEST)
    );
}

#[rstest]
fn rewrite_of_manifest_only_archive_holds_new_manifest(workspace: Workspace) {
    let base = workspace.base_archive(&[("Game.uproject", OLD_MANIFEST)]);
    let output = workspace.path("out.zip");
    let request = PatchRequest {
        base_archive: &base,
        output_archive: &output,
        manifest_arc_path: "Game.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    rewrite_archive(&request).expect("rewrite succeeds");

    let files = read_all_files(&output).expect("read output");
    assert_eq!(files.len(), 1);
    assert_eq!(files.get("Game.uproject").map(Vec::as_slice), Some(NEW_MANIFEST));
}

#[rstest]
fn failed_rewrite_leaves_destination_untouched(workspace: Workspace) {
    let output = workspace.path("existing.zip");
    fs::write(&output, b"previous build").expect("seed destination");
    let missing_base = workspace.path("missing.zip");
    let request = PatchRequest {
        base_archive: &missing_base,
        output_archive: &output,
        manifest_arc_path: "Game.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    rewrite_archive(&request).expect_err("missing base fails");

    assert_eq!(fs::read(&output).expect("destination"), b"previous build");
    assert!(workspace.staged_files().is_empty(), "temporary archive left behind");
}

#[rstest]
fn failed_patch_keeps_an_existing_archive(workspace: Workspace) {
    let output = workspace.path("Game_5_4.zip");
    fs::write(&output, b"previous build").expect("seed destination");
    let missing_base = workspace.path("missing.zip");
    let executor = StubExecutor::new(Vec::new());
    let tool = SevenZip::new("7z");
    let request = PatchRequest {
        base_archive: &missing_base,
        output_archive: &output,
        manifest_arc_path: "Game.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    patch_archive(&request, Some(&tool), &executor).expect_err("both routes fail");

    assert_eq!(fs::read(&output).expect("destination"), b"previous build");
    assert!(workspace.staged_files().is_empty(), "temporary archive left behind");
    executor.assert_finished();
}

#[rstest]
fn without_tool_the_archive_is_rewritten(workspace: Workspace) {
    let base = workspace.base_archive(&[("Game.uproject", OLD_MANIFEST), ("a.txt", b"a")]);
    let output = workspace.path("out.zip");
    let executor = StubExecutor::new(Vec::new());
    let request = PatchRequest {
        base_archive: &base,
        output_archive: &output,
        manifest_arc_path: "Game.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    let method = patch_archive(&request, None, &executor).expect("patch succeeds");

    assert_eq!(method, PatchMethod::Rewrite);
    assert_eq!(
        read_all_files(&output).expect("read"),
        expected_after_patch(&base, "Game.uproject", NEW_MANIFEST)
    );
}

#[rstest]
fn nested_manifest_never_uses_the_tool(workspace: Workspace) {
    let base = workspace.base_archive(&[("Sub/Game.uproject", OLD_MANIFEST)]);
    let output = workspace.path("out.zip");
    let executor = StubExecutor::new(Vec::new());
    let tool = SevenZip::new("7z");
    let request = PatchRequest {
        base_archive: &base,
        output_archive: &output,
        manifest_arc_path: "Sub/Game.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    let method = patch_archive(&request, Some(&tool), &executor).expect("patch succeeds");

    assert_eq!(method, PatchMethod::Rewrite);
    executor.assert_finished();
}

#[rstest]
#[case::tool_exits_non_zero(Ok(failure_output("cannot open archive")))]
#[case::tool_claims_success_without_updating(Ok(success_output()))]
fn tool_problems_fall_back_to_rewrite(workspace: Workspace, #[case] tool_result: Result<Output>) {
    let base = workspace.base_archive(&[("Game.uproject", OLD_MANIFEST), ("b.bin", b"bravo")]);
    let output = workspace.path("out.zip");
    let tool = SevenZip::new("7z");
    let executor = FileNameMatchingStub::new(tool_result);
    let request = PatchRequest {
        base_archive: &base,
        output_archive: &output,
        manifest_arc_path: "Game.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    let method = patch_archive(&request, Some(&tool), &executor).expect("patch succeeds");

    assert_eq!(method, PatchMethod::Rewrite);
    assert!(executor.was_invoked(|args| args.len() == 4));
    assert_eq!(
        read_all_files(&output).expect("read"),
        expected_after_patch(&base, "Game.uproject", NEW_MANIFEST)
    );
}

#[rstest]
fn verified_tool_update_is_accepted(workspace: Workspace) {
    let base = workspace.base_archive(&[("Game.uproject", OLD_MANIFEST), ("c.txt", b"charlie")]);
    let output = workspace.path("out.zip");
    let tool = SevenZip::new("7z");
    let request = PatchRequest {
        base_archive: &base,
        output_archive: &output,
        manifest_arc_path: "Game.uproject",
        manifest_bytes: NEW_MANIFEST,
    };

    let method = patch_archive(&request, Some(&tool), &UpdatingExecutor).expect("patch succeeds");

    assert_eq!(method, PatchMethod::InPlaceUpdate);
    assert_eq!(
        read_all_files(&output).expect("read"),
        expected_after_patch(&base, "Game.uproject", NEW_MANIFEST)
    );
    assert!(workspace.staged_files().is_empty(), "temporary archive left behind");
}

#[test]
fn root_entries_have_no_directory_component() {
    assert!(is_root_entry("Game.uproject"));
    assert!(!is_root_entry("Game/Game.uproject"));
    assert!(!is_root_entry("Game\\Game.uproject"));
    assert!(!is_root_entry(""));
}

#[test]
fn stub_executor_rejects_unexpected_update() {
    let executor = StubExecutor::new(vec![ExpectedCall::new("7z", ["i"])]);
    let result = SevenZip::new("7z").update_entry(
        &executor,
        Utf8Path::new("/a.zip"),
        Utf8Path::new("/b.uproject"),
    );
    assert!(matches!(result, Err(PackagerError::StubMismatch { .. })));
}

/// Answers a single `7z u` invocation whose scratch path is not known in
/// advance.
struct FileNameMatchingStub {
    result: std::cell::RefCell<Option<Result<Output>>>,
    seen: std::cell::RefCell<Vec<Vec<String>>>,
}

impl FileNameMatchingStub {
    fn new(result: Result<Output>) -> Self {
        Self {
            result: std::cell::RefCell::new(Some(result)),
            seen: std::cell::RefCell::new(Vec::new()),
        }
    }

    fn was_invoked(&self, predicate: impl Fn(&[String]) -> bool) -> bool {
        self.seen.borrow().iter().any(|args| predicate(args))
    }
}

impl CommandExecutor for FileNameMatchingStub {
    fn run(&self, cmd: &str, args: &[&str], _cwd: Option<&Utf8Path>) -> Result<Output> {
        assert_eq!(cmd, "7z");
        assert_eq!(args.first(), Some(&"u"));
        assert!(args.last().is_some_and(|file| file.ends_with("Game.uproject")));
        self.seen
            .borrow_mut()
            .push(args.iter().map(|arg| (*arg).to_owned()).collect());
        self.result
            .borrow_mut()
            .take()
            .expect("single invocation expected")
    }
}

/// Emulates `7z u -y <archive> <file>` by replacing the entry named like
/// `<file>`.
struct UpdatingExecutor;

impl CommandExecutor for UpdatingExecutor {
    fn run(&self, _cmd: &str, args: &[&str], _cwd: Option<&Utf8Path>) -> Result<Output> {
        let [_, _, archive, file] = args else {
            panic!("unexpected arguments {args:?}");
        };
        let archive = Utf8Path::new(archive);
        let file = Utf8Path::new(file);
        let contents = fs::read(file)?;
        let snapshot = archive.with_extension("snapshot");
        fs::copy(archive, &snapshot)?;
        rewrite_archive(&PatchRequest {
            base_archive: &snapshot,
            output_archive: archive,
            manifest_arc_path: file.file_name().expect("file name"),
            manifest_bytes: &contents,
        })?;
        fs::remove_file(&snapshot)?;
        Ok(success_output())
    }
}
