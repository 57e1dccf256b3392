use std::fs;
use std::path::Path;
use stylekit::config::resolve_effective;
use stylekit::models::WarningKind;
use stylekit::{pipeline, Error};
use tempfile::{tempdir, TempDir};

fn write(root: &Path, rel: &str, body: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, body).unwrap();
}

const MANIFEST_A: &str = r#"{
  "version": "1.0.0",
  "monorepoVersion": "auto",
  "packages": {
    "pkg-a": {
      "version": "1.0.0",
      "description": "A",
      "utilities": { "base": [".a-one", ".a-two"] },
      "components": {},
      "criticalClasses": [".a-one"]
    }
  }
}
"#;

fn repo(plugin_a: &str) -> TempDir {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write(root, "stylekit.toml", "manifest = \"expected.json\"\n");
    write(root, "expected.json", MANIFEST_A);
    write(root, "packages/pkg-a/package.json", r#"{"version":"1.0.0"}"#);
    write(root, "packages/pkg-a/index.js", plugin_a);
    tmp
}

#[test]
fn missing_critical_class_fails_the_run() {
    let tmp = repo("addUtilities({ '.a-two': { color: 'red' } })");
    let eff = resolve_effective(tmp.path().to_str(), None, None);
    let out = pipeline::run_check(&eff, None, true).unwrap();
    let r = &out.report.results["pkg-a"];
    assert_eq!(r.missing.iter().collect::<Vec<_>>(), vec![".a-one"]);
    assert!(r.has_critical_regression());
    assert_eq!(out.report.exit_code(), 1);
}

#[test]
fn extra_class_is_a_single_warning_and_passes() {
    let tmp = repo("addUtilities({ '.a-one': {}, '.a-two': {}, '.a-three': {} })");
    let eff = resolve_effective(tmp.path().to_str(), None, None);
    let out = pipeline::run_check(&eff, None, true).unwrap();
    let r = &out.report.results["pkg-a"];
    assert!(r.missing.is_empty());
    assert_eq!(r.new.iter().collect::<Vec<_>>(), vec![".a-three"]);
    assert_eq!(out.report.exit_code(), 0);
    assert_eq!(out.report.warnings.len(), 1);
    assert_eq!(out.report.warnings[0].kind, WarningKind::NewClasses);
}

#[test]
fn auto_version_is_synced_before_comparison() {
    let tmp = repo("'.a-one' '.a-two'");
    let root = tmp.path();
    write(
        root,
        "expected.json",
        &MANIFEST_A.replace(
            "\"version\": \"1.0.0\",\n      \"description\"",
            "\"version\": \"auto\",\n      \"description\"",
        ),
    );
    write(root, "packages/pkg-a/package.json", r#"{"version":"2.1.0"}"#);
    let eff = resolve_effective(root.to_str(), None, None);

    let out = pipeline::run_check(&eff, None, true).unwrap();
    assert!(out.sync.wrote);
    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("expected.json")).unwrap()).unwrap();
    assert_eq!(doc["packages"]["pkg-a"]["version"], "2.1.0");
    assert!(doc["lastUpdated"].is_string());

    // nothing changed since: no rewrite, no timestamp bump
    let before = fs::read_to_string(root.join("expected.json")).unwrap();
    let again = pipeline::run_sync_only(&eff, None, true).unwrap();
    assert!(!again.wrote);
    assert_eq!(fs::read_to_string(root.join("expected.json")).unwrap(), before);
}

#[test]
fn build_inlines_imports_and_reports_missing_entries() {
    let tmp = repo("'.a-one'");
    let root = tmp.path();
    write(
        root,
        "packages/pkg-a/src/index.css",
        "@import \"tailwindcss\";\n@import \"parts/a.css\";\n",
    );
    write(root, "packages/pkg-a/src/parts/a.css", ".x { color: red; }\n");
    write(root, "packages/pkg-b/package.json", r#"{"version":"0.1.0"}"#);
    let eff = resolve_effective(root.to_str(), None, None);

    let summary = pipeline::run_build_only(&eff, None).unwrap();
    assert_eq!(summary.built.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].package, "pkg-b");

    let framework = fs::read_to_string(root.join("packages/pkg-a/index.css")).unwrap();
    assert!(framework.contains(".x { color: red; }"));
    assert!(!framework.contains("parts/a.css\";"));
    let plain = fs::read_to_string(root.join("packages/pkg-a/dist.css")).unwrap();
    assert!(plain.contains(".x { color: red; }"));
    assert!(!plain.contains("@import"));
}

#[test]
fn missing_manifest_is_fatal() {
    let tmp = repo("'.a-one'");
    fs::remove_file(tmp.path().join("expected.json")).unwrap();
    let eff = resolve_effective(tmp.path().to_str(), None, None);
    assert!(matches!(
        pipeline::run_check(&eff, None, true),
        Err(Error::ManifestMissing(_))
    ));
}

#[test]
fn unreadable_source_is_recorded_and_run_continues() {
    let tmp = repo("'.a-one' '.a-two'");
    let root = tmp.path();
    write(
        root,
        "packages/pkg-z/package.json",
        r#"{"version":"1.0.0","main":"gone.js"}"#,
    );
    let eff = resolve_effective(root.to_str(), None, None);
    let out = pipeline::run_check(&eff, None, false).unwrap();
    assert_eq!(out.report.exit_code(), 0);
    assert!(out.report.failures.iter().any(|f| f.package == "pkg-z"));
    assert!(out
        .report
        .warnings
        .iter()
        .any(|w| w.package == "pkg-z" && w.kind == WarningKind::UnlistedPackage));
}

#[test]
fn single_package_selection() {
    let tmp = repo("'.a-one' '.a-two'");
    let eff = resolve_effective(tmp.path().to_str(), None, None);
    let out = pipeline::run_extract_only(&eff, Some("pkg-a")).unwrap();
    assert_eq!(out.packages.len(), 1);
    assert!(matches!(
        pipeline::run_extract_only(&eff, Some("nope")),
        Err(Error::UnknownPackage(_))
    ));
}
