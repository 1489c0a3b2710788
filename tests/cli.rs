use std::fs;
use std::process::Output;

use pretty_assertions::assert_eq;
use tessera_wm::common::config::{Config, DEFAULT_CONFIG};
use tessera_wm::model::SavedState;

fn tessera(args: &[&str]) -> Output {
    test_bin::get_test_bin("tessera")
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run tessera")
}

fn stdout(output: &Output) -> String { String::from_utf8_lossy(&output.stdout).into_owned() }

fn write_config(dir: &tempfile::TempDir, contents: &str) -> String {
    let path = dir.path().join("tessera.toml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn prints_the_bundled_config() {
    let output = tessera(&["print-default-config"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), DEFAULT_CONFIG);
}

#[test]
fn check_config_accepts_the_bundled_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, DEFAULT_CONFIG);

    let output = tessera(&["check-config", "--config", &path]);
    assert!(output.status.success());
    assert!(stdout(&output).ends_with(": ok\n"));
}

#[test]
fn check_config_reports_and_fixes_issues() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[settings]\nlayouts = [\"tree\", \"spiral\"]\n\n[settings.gaps.inner]\nhorizontal = -5\n",
    );

    let output = tessera(&["check-config", "--config", &path]);
    assert!(!output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Unknown layout 'spiral'"), "{out}");
    assert!(out.contains("inner.horizontal gap must be non-negative"), "{out}");

    let output = tessera(&["check-config", "--config", &path, "--fix"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("applied 2 fixes"));

    let fixed = Config::read(dir.path().join("tessera.toml").as_path()).unwrap();
    assert_eq!(fixed.settings.layouts, vec!["tree"]);
    assert_eq!(fixed.settings.gaps.inner.horizontal, 0);
}

#[test]
fn simulate_prints_json_placements() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[settings]\nlayouts = [\"column\", \"tree\"]\nworkspace_names = [\"main\"]\n\n[floating]\nproxy = false\n",
    );

    let output = tessera(&["simulate", "--config", &path, "--windows", "2", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let placements: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let placements = placements.as_array().unwrap();
    assert_eq!(placements.len(), 2);
    assert_eq!(placements[0]["workspace"], "main");
    assert_eq!(placements[0]["rect"]["width"], 960);
    assert_eq!(placements[1]["rect"]["x"], 960);
}

#[test]
fn simulate_saves_and_restores_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[settings]\nlayouts = [\"column\"]\nworkspace_names = [\"a\", \"b\"]\n");
    let saved = dir.path().join("state.ron");
    let saved_arg = saved.to_string_lossy().into_owned();

    let output = tessera(&["simulate", "--config", &config, "--windows", "3", "--save", &saved_arg]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let state = SavedState::read(&saved).unwrap();
    let names: Vec<_> = state.workspaces.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(state.workspaces[0].windows.len(), 3);

    let output = tessera(&["simulate", "--config", &config, "--windows", "3", "--restore", &saved_arg]);
    assert!(output.status.success());
}

#[test]
fn simulate_rejects_unconfigured_layouts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[settings]\nlayouts = [\"column\"]\n");

    let output = tessera(&["simulate", "--config", &path, "--layout", "tree"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not in the configured layouts"));
}
