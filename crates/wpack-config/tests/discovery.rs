//! Tests for config file discovery and loading

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use wpack_config::{
    BuildConfig, ConfigDiscovery, ConfigError, DropKind, LogLevel, Mode, from_toml_str, load_file,
};

const WIDGET_TOML: &str = r#"
mode = "production"
entries = ["src/index.ts"]
output_file_name = "widget.js"

[[externals]]
module_id = "jquery"
global_name = "jQuery"

[shrink]
compress_passes = 3
drop_statements = ["console", "debugger"]
reserved_names = ["Widget", "XconWidget"]

[aliases]
"@" = "src"

[define]
__XCON_DEV__ = "false"

[logger]
level = "warn"
prefix = "XCon-Prod"
"#;

#[test]
fn parses_toml_document() {
    let config = from_toml_str(WIDGET_TOML).unwrap();
    assert_eq!(config.mode, Mode::Production);
    assert_eq!(config.entries, vec![PathBuf::from("src/index.ts")]);
    assert_eq!(config.externals[0].module_id, "jquery");
    assert_eq!(config.shrink.compress_passes, 3);
    assert!(config.shrink.drops(DropKind::ConsoleCall));
    assert!(config.shrink.reserved_names.contains("XconWidget"));
    assert_eq!(config.define.get("__XCON_DEV__").map(String::as_str), Some("false"));
    assert_eq!(config.logger.level, Some(LogLevel::Warn));
    assert_eq!(config.logger.prefix.as_deref(), Some("XCon-Prod"));
    // untouched sections keep their defaults
    assert!(config.shrink.strip_comments);
    assert_eq!(config.assets_dir, "assets");
}

#[test]
fn discovers_wpack_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("wpack.toml"), WIDGET_TOML).unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    let found = discovery.find().unwrap();
    assert_eq!(found.file_name().unwrap(), "wpack.toml");

    let config = discovery.load().unwrap();
    assert_eq!(config.root, dir.path());
    assert_eq!(config.shrink.compress_passes, 3);
}

#[test]
fn discovers_package_json_field() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{
  "name": "widget",
  "wpack": {
    "entries": ["src/main.js"],
    "mode": "development"
  }
}"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    assert_eq!(config.entries, vec![PathBuf::from("src/main.js")]);
    assert_eq!(config.mode, Mode::Development);
}

#[test]
fn package_json_without_field_is_ignored() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), r#"{"name": "widget"}"#).unwrap();
    assert!(ConfigDiscovery::new(dir.path()).find().is_none());
}

#[test]
fn toml_wins_over_json() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("wpack.toml"), "entries = [\"a.ts\"]").unwrap();
    fs::write(dir.path().join("wpack.json"), r#"{"entries": ["b.ts"]}"#).unwrap();
    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    assert_eq!(config.entries, vec![PathBuf::from("a.ts")]);
}

#[test]
fn overrides_beat_file_values() {
    #[derive(serde::Serialize)]
    struct Overrides {
        mode: Mode,
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wpack.toml");
    fs::write(&path, WIDGET_TOML).unwrap();

    let config = load_file(
        &path,
        Some(Overrides {
            mode: Mode::Development,
        }),
    )
    .unwrap();
    assert_eq!(config.mode, Mode::Development);
    assert_eq!(config.shrink.compress_passes, 3);
}

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = load_file(&dir.path().join("nope.toml"), None::<BuildConfig>).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wpack.yaml");
    fs::write(&path, "entries: []").unwrap();
    let err = load_file(&path, None::<BuildConfig>).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn bad_field_type_is_a_load_error() {
    let err = from_toml_str("shrink = { compress_passes = \"many\" }").unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}
