//! End-to-end builds of small widget projects.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wpack_bundler::{
    ArtifactSet, BuildConfig, BuildError, BundleArtifact, DropKind, Severity, ShrinkPolicy,
    SizeReport, SizeThreshold, build, classify,
};

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        write(dir.path(), name, content);
    }
    dir
}

fn config(dir: &TempDir, entry: &str) -> BuildConfig {
    BuildConfig::new(entry)
        .root(dir.path())
        .shrink(ShrinkPolicy::passthrough())
}

#[test]
fn externals_read_the_global() {
    let dir = project(&[
        ("src/index.js", "import $ from 'jquery';\n$(x);\n"),
        ("node_modules/jquery/index.js", "window.jQueryImplementation = 1;\n"),
    ]);
    let config = config(&dir, "src/index.js").external("jquery", "jQuery");

    let output = build(&config).unwrap();
    let code = &output.artifacts.chunk().code;
    assert!(code.contains("jQuery(x)"), "{code}");
    assert!(!code.contains("jQueryImplementation"));
    assert!(!code.contains("import "));
}

#[test]
fn externals_survive_full_shrinking() {
    let dir = project(&[(
        "src/index.js",
        "import $, { ajax } from 'jquery';\nexport function load(url) { return ajax(url).then((data) => $(data)); }\n",
    )]);
    let config = BuildConfig::new("src/index.js")
        .root(dir.path())
        .external("jquery", "jQuery");

    let code = build(&config).unwrap().artifacts.chunk().code.clone();
    assert!(code.contains("jQuery.ajax"), "{code}");
    assert!(code.contains("jQuery("), "{code}");
}

#[test]
fn console_log_is_dropped_and_error_kept() {
    let source = "console.log('a');\nconsole.log('b');\nconsole.log('c');\nconsole.error('d');\nexport const ready = true;\n";
    let dir = project(&[("src/index.js", source)]);

    let mut config = config(&dir, "src/index.js");
    config.shrink = ShrinkPolicy::passthrough().with_drop(DropKind::ConsoleCall);
    let code = build(&config).unwrap().artifacts.chunk().code.clone();
    assert_eq!(code.matches("console.log").count(), 0);
    assert_eq!(code.matches("console.error('d')").count(), 1);

    config.shrink = config.shrink.with_pure(["console.error"]);
    let code = build(&config).unwrap().artifacts.chunk().code.clone();
    assert!(!code.contains("console."));
}

#[test]
fn development_builds_keep_console() {
    let dir = project(&[("src/index.js", "console.log('kept');\n")]);
    let mut config = config(&dir, "src/index.js").mode(wpack_bundler::Mode::Development);
    config.shrink = ShrinkPolicy::passthrough().with_drop(DropKind::ConsoleAll);

    let code = build(&config).unwrap().artifacts.chunk().code.clone();
    assert!(code.contains("console.log('kept')"));
}

#[test]
fn middle_tier_is_its_own_classification() {
    let thresholds = vec![
        SizeThreshold::new(300_000, "warn-large").warn(),
        SizeThreshold::new(100_000, "ok"),
    ];
    let artifacts = ArtifactSet::new(
        vec![BundleArtifact::new("widget.js", "a".repeat(250_000))],
        vec![],
    )
    .unwrap();

    let report = SizeReport::compute(&artifacts, &thresholds, false);
    assert_eq!(report.total_bytes, 250_000);
    assert_eq!(report.classification.name, "ok");
    assert_eq!(report.classification.severity, Severity::Info);
    assert_ne!(report.classification.name, "warn-large");
    assert_ne!(report.classification.name, "optimal");
}

#[test]
fn classification_is_monotone() {
    let thresholds = wpack_bundler::SizeThreshold::new(300_000, "large").warn();
    let thresholds = vec![thresholds, SizeThreshold::new(100_000, "acceptable")];
    let tiers: Vec<String> = [0, 100_000, 100_001, 300_000, 300_001, 10_000_000]
        .into_iter()
        .map(|total| classify(total, &thresholds).name)
        .collect();
    assert_eq!(
        tiers,
        vec!["optimal", "optimal", "acceptable", "acceptable", "large", "large"]
    );
}

#[test]
fn shared_and_lazy_modules_land_in_one_chunk() {
    let dir = project(&[
        (
            "src/index.js",
            "import { a } from './a.js';\nimport { b } from './b.js';\nexport function open() { return import('./lazy.js').then((m) => m.show(a + b)); }\n",
        ),
        ("src/a.js", "import { shared } from './shared.js';\nexport const a = shared + 'a';\n"),
        ("src/b.js", "import { shared } from './shared.js';\nexport const b = shared + 'b';\n"),
        ("src/shared.js", "export const shared = 'shared-module';\n"),
        ("src/lazy.js", "export function show(v) { return 'lazy-module:' + v; }\n"),
    ]);
    let config = config(&dir, "src/index.js");

    let output = build(&config).unwrap();
    let code = &output.artifacts.chunk().code;
    for label in [
        "// src/index.js",
        "// src/a.js",
        "// src/b.js",
        "// src/shared.js",
        "// src/lazy.js",
    ] {
        assert_eq!(code.matches(label).count(), 1, "{label} in\n{code}");
    }
    assert!(code.contains("'shared-module'"));
    assert!(code.contains("'lazy-module:'"));
    assert!(!code.contains("import("));

    let out_dir = dir.path().join("dist");
    let written = output.write_to(&out_dir, true).unwrap();
    assert_eq!(written, vec![out_dir.join("widget.js")]);
    let files: Vec<_> = fs::read_dir(&out_dir).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn assets_are_copied_and_referenced_by_url() {
    let dir = project(&[
        ("src/index.js", "import logo from './logo.png';\nexport const src = logo;\n"),
        ("src/logo.png", "PNG"),
    ]);
    let mut config = config(&dir, "src/index.js");
    config.base_url = "https://cdn.example.com/widget/".to_string();

    let output = build(&config).unwrap();
    assert!(
        output
            .artifacts
            .chunk()
            .code
            .contains("\"https://cdn.example.com/widget/assets/logo.png\"")
    );
    assert_eq!(output.artifacts.assets()[0].file_name, "assets/logo.png");
    assert_eq!(output.report.per_artifact.len(), 2);
}

#[test]
fn templates_styles_and_data_are_bundled() {
    let dir = project(&[
        (
            "src/index.ts",
            "import view from './view.html';\nimport './widget.css';\nimport settings from './settings.json';\nconst size: number = settings.size;\nexport const html: string = view + size;\n",
        ),
        ("src/view.html", "<div class=\"w\">\n  <!-- note -->\n  <span>hi</span>\n</div>\n"),
        ("src/widget.css", ".w { color: red; }\n"),
        ("src/settings.json", "{ \"size\": 3 }"),
    ]);
    let config = config(&dir, "src/index.ts");

    let code = build(&config).unwrap().artifacts.chunk().code.clone();
    assert!(!code.contains(": number"));
    assert!(!code.contains("<!-- note -->"));
    assert!(code.contains("<span>hi</span>"));
    assert!(code.contains("color:red") || code.contains("color: red"));
    assert!(code.contains("\"size\""));
}

#[test]
fn defines_are_substituted_before_shrinking() {
    let dir = project(&[(
        "src/index.js",
        "if (__DEV__) { console.log('debug'); }\nexport const version = __VERSION__;\n",
    )]);
    let config = config(&dir, "src/index.js")
        .define("__DEV__", "false")
        .define("__VERSION__", "\"1.2.3\"")
        .shrink(ShrinkPolicy::default());

    let code = build(&config).unwrap().artifacts.chunk().code.clone();
    assert!(code.contains("1.2.3"));
    assert!(!code.contains("__DEV__"));
    assert!(!code.contains("debug"));
}

#[test]
fn identical_inputs_build_identical_bytes() {
    let dir = project(&[
        ("src/index.js", "import { helper } from './helper.js';\nexport function Widget(options) { return helper(options); }\n"),
        ("src/helper.js", "export function helper(value) { var result = value * 2; return result; }\n"),
    ]);
    let config = BuildConfig::new("src/index.js")
        .root(dir.path())
        .shrink(ShrinkPolicy::default().with_reserved(["Widget"]));

    let first = build(&config).unwrap();
    let second = build(&config).unwrap();
    assert_eq!(first.artifacts.chunk().code, second.artifacts.chunk().code);
    assert_eq!(
        first.artifacts.chunk().content_hash(),
        second.artifacts.chunk().content_hash()
    );
    assert!(first.artifacts.chunk().code.contains("Widget"));
}

#[test]
fn failed_builds_write_nothing() {
    let dir = project(&[("src/index.js", "import { missing } from './other.js';\nmissing();\n")]);
    write(dir.path(), "src/other.js", "export const present = 1;\n");
    let config = config(&dir, "src/index.js");

    let err = build(&config).unwrap_err();
    assert!(matches!(err, BuildError::MissingExport { ref name, .. } if name == "missing"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn class_fields_build_at_the_default_target() {
    let dir = project(&[(
        "src/index.ts",
        "export class Panel {\n  private readonly root: any;\n  count = 0;\n  static instances = 0;\n  #secret = 'hidden';\n  constructor(root: any) { this.root = root; Panel.instances++; }\n  reveal(): string { return this.#secret + this.count; }\n}\n(window as any).Panel = Panel;\n",
    )]);
    let config = config(&dir, "src/index.ts");
    assert_eq!(config.target, wpack_bundler::EsTarget::ES2020);

    let code = build(&config).unwrap().artifacts.chunk().code.clone();
    assert!(!code.contains("import "), "{code}");
    assert!(!code.contains("#secret"), "{code}");
    assert!(code.contains("this.count = 0"), "{code}");
    assert!(code.contains("'hidden'") || code.contains("\"hidden\""), "{code}");
    for helper in ["classPrivateFieldInitSpec", "classPrivateFieldGet2"] {
        if code.contains(&format!("babelHelpers.{helper}(")) {
            assert!(code.contains(&format!("{helper}: function")), "{helper} undefined in\n{code}");
        }
    }
}

#[test]
fn json_keys_can_be_imported_by_name() {
    let dir = project(&[
        (
            "src/index.js",
            "import { title } from './settings.json';\nimport settings from './settings.json';\nwindow.t = title + settings.refreshSeconds;\n",
        ),
        ("src/settings.json", "{ \"refreshSeconds\": 60, \"title\": \"XCon\" }"),
    ]);
    let code = build(&config(&dir, "src/index.js"))
        .unwrap()
        .artifacts
        .chunk()
        .code
        .clone();
    assert!(code.contains("\"XCon\""), "{code}");
    assert!(!code.contains("export const"), "{code}");
}

#[test]
fn the_demo_widget_builds() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/xcon-widget/wpack.toml");
    let config = wpack_config::load_file(&path, None::<()>).unwrap();

    let output = build(&config).unwrap();
    let code = &output.artifacts.chunk().code;
    assert_eq!(output.artifacts.chunk().file_name, "xcon-widget.js");
    assert!(code.starts_with("// XCon Widget - Production Bundle"), "{code}");
    for name in ["XconWidget", "xconInit"] {
        assert!(code.contains(name), "{name} missing from\n{code}");
    }
    assert!(code.contains("jQuery"));
    assert!(!code.contains("debugger"));
    assert!(!code.contains("console.log"));
    assert!(!code.contains("import "));
    assert!(
        output
            .artifacts
            .assets()
            .iter()
            .any(|asset| asset.file_name == "assets/logo.svg")
    );
}
