//! End-to-end tests of the `wpack` binary.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
entries = ["src/index.js"]

[[externals]]
module_id = "jquery"
global_name = "jQuery"

[shrink]
reserved_names = ["XconWidget"]

[logger]
prefix = "XCon-Prod"
"#;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "wpack.toml", CONFIG);
    write(
        dir.path(),
        "src/index.js",
        "import $ from 'jquery';\nfunction XconWidget(el) { console.log('mount'); return $(el); }\nwindow.XconWidget = XconWidget;\n",
    );
    dir
}

fn wpack(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("wpack");
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn build_writes_the_widget_and_reports_its_size() {
    let dir = project();
    wpack(&dir)
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("[XCon-Prod] 📦 Widget production build:"))
        .stderr(predicate::str::contains("🎯 widget.js:"))
        .stderr(predicate::str::contains("📊 Total Widget Size:"))
        .stderr(predicate::str::contains(
            "🎉 Widget bundle is optimally sized (<100KB)",
        ))
        .stderr(predicate::str::contains("Widget production build completed!"));

    let code = fs::read_to_string(dir.path().join("dist/widget.js")).unwrap();
    assert!(code.contains("XconWidget"));
    assert!(code.contains("jQuery("));
    assert!(!code.contains("console.log"));
}

#[test]
fn quiet_build_prints_nothing_on_success() {
    let dir = project();
    wpack(&dir)
        .args(["build", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    assert!(dir.path().join("dist/widget.js").exists());
}

#[test]
fn development_mode_keeps_console() {
    let dir = project();
    wpack(&dir)
        .args(["build", "--mode", "development", "--out-dir", "dev"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Widget development build"));

    let code = fs::read_to_string(dir.path().join("dev/widget.js")).unwrap();
    assert!(code.contains("console.log"));
}

#[test]
fn output_directory_is_cleaned_unless_asked_not_to() {
    let dir = project();
    write(dir.path(), "dist/stale.js", "old");
    wpack(&dir).args(["build", "--no-clean"]).assert().success();
    assert!(dir.path().join("dist/stale.js").exists());

    wpack(&dir).arg("build").assert().success();
    assert!(!dir.path().join("dist/stale.js").exists());
    assert!(dir.path().join("dist/widget.js").exists());
}

#[test]
fn missing_entry_fails_without_output() {
    let dir = project();
    wpack(&dir)
        .args(["build", "--entry", "src/missing.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entry path not found"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn computed_dynamic_import_is_rejected() {
    let dir = project();
    write(
        dir.path(),
        "src/index.js",
        "const name = 'a';\nimport('./' + name + '.js');\n",
    );
    wpack(&dir)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Multi-chunk violation"));
    assert!(!dir.path().join("dist/widget.js").exists());
}

#[test]
fn check_prints_the_resolved_configuration() {
    let dir = project();
    wpack(&dir)
        .args(["check", "--print", "--target", "es2019"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"global_name\": \"jQuery\""))
        .stdout(predicate::str::contains("\"target\": \"es2019\""))
        .stderr(predicate::str::contains("Configuration is valid"));
}

#[test]
fn check_reports_duplicate_externals() {
    let dir = project();
    write(
        dir.path(),
        "wpack.toml",
        &format!("{CONFIG}\n[[externals]]\nmodule_id = \"jquery\"\nglobal_name = \"$\"\n"),
    );
    wpack(&dir)
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("registered more than once"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = project();
    wpack(&dir)
        .args(["check", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn out_dir_over_the_project_is_refused() {
    let dir = project();
    wpack(&dir)
        .args(["build", "--out-dir", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
    assert!(dir.path().join("wpack.toml").exists());
    assert!(dir.path().join("src/index.js").exists());
}
