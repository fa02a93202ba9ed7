use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn conceptgraph(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_conceptgraph"))
        .arg("--store")
        .arg(store)
        .args(args)
        .output()
        .expect("Failed to execute conceptgraph")
}

fn positions(store: &Path) -> serde_json::Value {
    let output = conceptgraph(store, &["positions"]);
    assert!(output.status.success(), "positions exited with error");
    serde_json::from_slice(&output.stdout).expect("positions did not print JSON")
}

#[test]
fn layout_saves_positions_for_every_concept() {
    let store = tempfile::tempdir().unwrap();
    let input = fixture("concepts.json");

    let output = conceptgraph(
        store.path(),
        &["layout", "--input", input.to_str().unwrap(), "--seed", "1"],
    );
    assert!(
        output.status.success(),
        "layout failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Laid out 6 nodes"));
    assert!(store.path().join("graph.positions.json").exists());

    let map = positions(store.path());
    let map = map.as_object().unwrap();
    assert_eq!(map.len(), 6);
    for (id, entry) in map {
        let x = entry["x"].as_f64().unwrap();
        let y = entry["y"].as_f64().unwrap();
        assert!((30.0..=770.0).contains(&x), "{id} x = {x}");
        assert!((30.0..=570.0).contains(&y), "{id} y = {y}");
        assert_eq!(entry["pinned"], false);
    }
}

#[test]
fn pin_survives_a_second_layout() {
    let store = tempfile::tempdir().unwrap();
    let input = fixture("concepts.json");
    let input = input.to_str().unwrap();

    assert!(conceptgraph(store.path(), &["layout", "-i", input]).status.success());
    let before = positions(store.path());

    let output = conceptgraph(store.path(), &["pin", "--node", "rust"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Pinned 'rust'"));

    assert!(conceptgraph(store.path(), &["layout", "-i", input]).status.success());
    let after = positions(store.path());

    assert_eq!(after["rust"]["pinned"], true);
    assert_eq!(after["rust"]["x"], before["rust"]["x"]);
    assert_eq!(after["rust"]["y"], before["rust"]["y"]);

    assert!(conceptgraph(store.path(), &["unpin", "--node", "rust"]).status.success());
    assert_eq!(positions(store.path())["rust"]["pinned"], false);
}

#[test]
fn pinning_unknown_node_fails() {
    let store = tempfile::tempdir().unwrap();

    let output = conceptgraph(store.path(), &["pin", "--node", "nope"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no saved position"));
}

#[test]
fn render_writes_svg() {
    let store = tempfile::tempdir().unwrap();
    let svg_path = store.path().join("graph.svg");
    let input = fixture("concepts.json");

    let output = conceptgraph(
        store.path(),
        &[
            "render",
            "--input",
            input.to_str().unwrap(),
            "--output",
            svg_path.to_str().unwrap(),
            "--frames",
            "30",
            "--fit",
        ],
    );
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(svg.starts_with("<svg"));
    assert_eq!(svg.matches("<circle").count(), 6);
    // Three explicit edges plus two implied by related concept IDs
    assert_eq!(svg.matches("<line").count(), 5);
    assert!(svg.contains("Ownership &amp; Borrowing"));
    assert!(store.path().join("graph.viewport.graph.json").exists());
}

#[test]
fn config_file_is_applied() {
    let store = tempfile::tempdir().unwrap();
    let svg_path = store.path().join("plain.svg");
    let input = fixture("concepts.json");
    let config = fixture("config.yaml");

    let output = conceptgraph(
        store.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "render",
            "-i",
            input.to_str().unwrap(),
            "-o",
            svg_path.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());

    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(!svg.contains("<text"));
}

#[test]
fn missing_input_is_reported() {
    let store = tempfile::tempdir().unwrap();

    let output = conceptgraph(store.path(), &["layout", "--input", "/nonexistent.json"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read graph input"));
}

#[test]
fn namespaces_are_isolated() {
    let store = tempfile::tempdir().unwrap();
    let input = fixture("concepts.json");

    let output = conceptgraph(
        store.path(),
        &["--namespace", "other", "layout", "-i", input.to_str().unwrap()],
    );
    assert!(output.status.success());

    assert!(store.path().join("other.positions.json").exists());
    assert_eq!(positions(store.path()), serde_json::json!({}));
}
