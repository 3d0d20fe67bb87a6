//! Unit tests for manifest mutation and discovery.

use super::*;
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

fn strip_set(names: &[&str]) -> PluginStripSet {
    names.iter().map(|name| (*name).to_owned()).collect()
}

fn mutate_to_json(original: &Value, association: &str, strip: &[&str]) -> Value {
    let bytes = serde_json::to_vec(original).expect("serialise input");
    let mutated = mutate_manifest(&bytes, association, &strip_set(strip)).expect("mutate");
    serde_json::from_slice(&mutated).expect("parse output")
}

#[test]
fn strips_named_plugin_and_sets_association() {
    let original = json!({
        "EngineAssociation": "",
        "Plugins": [{"Name": "Foo"}, {"Name": "Bar"}]
    });

    let mutated = mutate_to_json(&original, "5.4", &["Foo"]);

    assert_eq!(
        mutated,
        json!({"EngineAssociation": "5.4", "Plugins": [{"Name": "Bar"}]})
    );
}

#[test]
fn stripping_every_plugin_removes_the_key() {
    let original = json!({"Plugins": [{"Name": "Foo"}, {"Name": "Bar", "Enabled": false}]});

    let mutated = mutate_to_json(&original, "5.5", &["Foo", "Bar"]);

    assert_eq!(mutated, json!({"EngineAssociation": "5.5"}));
}

#[rstest]
#[case::empty_strip_set(json!({"Plugins": []}), &[][..])]
#[case::missing_plugins(json!({"Modules": [{"Name": "Game"}]}), &["Foo"][..])]
#[case::plugins_not_a_list(json!({"Plugins": {"Name": "Foo"}}), &["Foo"][..])]
fn plugins_left_alone(#[case] original: Value, #[case] strip: &[&str]) {
    let mutated = mutate_to_json(&original, "5.4", strip);

    let mut expected = original;
    expected
        .as_object_mut()
        .expect("object")
        .insert("EngineAssociation".to_owned(), json!("5.4"));
    assert_eq!(mutated, expected);
}

#[test]
fn unnamed_and_blank_entries_survive_stripping() {
    let original = json!({
        "Plugins": [
            {"Enabled": true},
            {"Name": "   "},
            {"Name": " Foo ", "Enabled": true},
            "not-an-object"
        ]
    });

    let mutated = mutate_to_json(&original, "5.4", &["Foo"]);

    assert_eq!(
        mutated.get("Plugins"),
        Some(&json!([{"Enabled": true}, {"Name": "   "}, "not-an-object"]))
    );
}

#[test]
fn unknown_fields_keep_their_order_and_values() {
    let original = br#"{
  "FileVersion": 3,
  "EngineAssociation": "5.3",
  "Category": "Samples",
  "Modules": [{"Name": "MyGame", "Type": "Runtime", "LoadingPhase": "Default"}],
  "TargetPlatforms": ["Windows"]
}"#;

    let mutated = mutate_manifest(original, "5.6", &PluginStripSet::new()).expect("mutate");
    let text = String::from_utf8(mutated).expect("utf8");

    let keys = [
        "FileVersion",
        "EngineAssociation",
        "Category",
        "Modules",
        "TargetPlatforms",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|key| text.find(&format!("\"{key}\"")).expect("key present"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{text}");
    assert!(text.contains("\"EngineAssociation\": \"5.6\""));
    assert!(text.contains("\"LoadingPhase\": \"Default\""));
}

#[test]
fn output_is_two_space_indented_utf8() {
    let mutated = mutate_manifest(
        "{\"Description\": \"Démo ✓\"}".as_bytes(),
        "5.4",
        &PluginStripSet::new(),
    )
    .expect("mutate");
    let text = String::from_utf8(mutated).expect("utf8");

    assert!(text.contains("\n  \"Description\": \"Démo ✓\""), "{text}");
}

#[test]
fn mutation_ignores_previous_association() {
    let original = json!({"EngineAssociation": "{A1B2C3}"});
    let once = mutate_to_json(&original, "5.4", &[]);
    let twice = mutate_to_json(&once, "5.4", &[]);
    assert_eq!(once, twice);
}

#[rstest]
#[case::truncated(b"{\"EngineAssociation\": ".as_slice())]
#[case::array(b"[1, 2]".as_slice())]
#[case::string(b"\"5.4\"".as_slice())]
fn malformed_manifest_is_rejected(#[case] bytes: &[u8]) {
    let err = mutate_manifest(bytes, "5.4", &PluginStripSet::new()).expect_err("rejected");
    assert!(matches!(err, PackagerError::InvalidManifest { .. }));
}

#[test]
fn plugins_are_listed_case_insensitively_with_enabled_default() {
    let manifest = ProjectManifest::from_slice(
        br#"{"Plugins": [
            {"Name": "zeta", "Enabled": false},
            {"Name": "Alpha"},
            {"Name": ""},
            {"Name": "beta", "Enabled": true}
        ]}"#,
    )
    .expect("parse");

    assert_eq!(
        manifest.plugins(),
        vec![
            PluginEntry { name: "Alpha".to_owned(), enabled: true },
            PluginEntry { name: "beta".to_owned(), enabled: true },
            PluginEntry { name: "zeta".to_owned(), enabled: false },
        ]
    );
}

fn source_with(files: &[&str]) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8");
    for name in files {
        let path = root.join(name);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "{}").expect("write");
    }
    (dir, root)
}

#[test]
fn locates_the_single_root_manifest() {
    let (_guard, root) = source_with(&["MyGame.uproject", "Config/DefaultGame.ini"]);
    let path = locate_manifest(&root).expect("manifest found");
    assert_eq!(path, root.join("MyGame.uproject"));
}

#[test]
fn nested_manifests_do_not_count() {
    let (_guard, root) = source_with(&["Plugins/Foo/Foo.uproject", "README.md"]);
    let err = locate_manifest(&root).expect_err("no root manifest");
    assert!(matches!(err, PackagerError::ManifestNotFound { .. }));
}

#[test]
fn several_root_manifests_are_ambiguous() {
    let (_guard, root) = source_with(&["B.uproject", "A.uproject"]);
    match locate_manifest(&root).expect_err("ambiguous") {
        PackagerError::AmbiguousManifest { candidates, .. } => {
            assert_eq!(candidates, vec!["A.uproject", "B.uproject"]);
        }
        other => panic!("expected AmbiguousManifest, got {other:?}"),
    }
}

#[test]
fn load_manifest_parses_the_root_manifest() {
    let (_guard, root) = source_with(&[]);
    fs::write(root.join("Game.uproject"), br#"{"EngineAssociation": "5.3"}"#).expect("write");

    let (path, manifest) = load_manifest(&root).expect("load");

    assert_eq!(path.file_name(), Some("Game.uproject"));
    assert_eq!(manifest.engine_association(), Some("5.3"));
}
