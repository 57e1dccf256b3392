//! Command dispatch and exit codes.
//!
//! Every command maps to `0` (success) or `1` (critical regression, failed
//! package, stale manifest under `--check`, fatal error, or internal panic).

use crate::cli::{Cli, Commands, Common};
use crate::config::{self, Effective};
use crate::error::Error;
use crate::utils::{error_prefix, note_prefix};
use crate::{output, pipeline};
use std::panic::{self, AssertUnwindSafe};

fn effective(common: &Common) -> Effective {
    let eff = config::resolve_effective(
        common.repo_root.as_deref(),
        common.manifest.as_deref(),
        common.output.as_deref(),
    );
    // Friendly note if no stylekit config was found
    if !eff.config_found && eff.output != "json" {
        eprintln!("{} No stylekit.toml found; using defaults.", note_prefix());
    }
    eff
}

fn fail(e: &Error) -> i32 {
    eprintln!("{} {}", error_prefix(), e);
    1
}

/// Run one parsed command and return its exit code.
pub fn run(cli: Cli) -> i32 {
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::Check { common, no_sync } => {
            let eff = effective(&common);
            match pipeline::run_check(&eff, common.package.as_deref(), !no_sync) {
                Ok(res) => {
                    output::print_check(&res, &eff.output);
                    res.report.exit_code()
                }
                Err(e) => fail(&e),
            }
        }
        Commands::Extract { common } => {
            let eff = effective(&common);
            match pipeline::run_extract_only(&eff, common.package.as_deref()) {
                Ok(res) => {
                    output::print_extract(&res, &eff.output);
                    res.exit_code()
                }
                Err(e) => fail(&e),
            }
        }
        Commands::Sync {
            common,
            dry_run,
            check,
        } => {
            let eff = effective(&common);
            let write = !(dry_run || check);
            match pipeline::run_sync_only(&eff, common.package.as_deref(), write) {
                Ok(res) => {
                    output::print_sync(&res, &eff.output);
                    res.exit_code(check)
                }
                Err(e) => fail(&e),
            }
        }
        Commands::Build { common } => {
            let eff = effective(&common);
            match pipeline::run_build_only(&eff, common.package.as_deref()) {
                Ok(res) => {
                    output::print_build(&res, &eff.output, &eff.repo_root);
                    res.exit_code()
                }
                Err(e) => fail(&e),
            }
        }
    }
}

/// Run `f`, turning a panic into exit code `1`.
pub fn guarded<F: FnOnce() -> i32>(f: F) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(code) => code,
        Err(_) => {
            // The default hook has already printed the panic message.
            eprintln!("{} unexpected internal error; run aborted", error_prefix());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"{
  "packages": {
    "pkg-a": {
      "version": "auto",
      "utilities": { "base": [".a-one"] },
      "criticalClasses": [".a-one"]
    }
  }
}
"#;

    fn repo(root: &Path) {
        fs::write(root.join("stylekit.toml"), "manifest = \"expected.json\"\n").unwrap();
        fs::write(root.join("expected.json"), MANIFEST).unwrap();
        let pkg = root.join("packages/pkg-a");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"version":"2.1.0"}"#).unwrap();
        fs::write(pkg.join("index.js"), "addUtilities({ '.a-one': {} })").unwrap();
    }

    fn exec(root: &Path, args: &[&str]) -> i32 {
        let mut argv = vec!["stylekit"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["--repo-root", root.to_str().unwrap(), "--output", "json"]);
        run(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_sync_check_exits_one_only_while_stale() {
        let tmp = tempdir().unwrap();
        repo(tmp.path());
        assert_eq!(exec(tmp.path(), &["sync", "--check"]), 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("expected.json")).unwrap(),
            MANIFEST
        );
        assert_eq!(exec(tmp.path(), &["sync", "--dry-run"]), 0);
        assert_eq!(exec(tmp.path(), &["sync"]), 0);
        assert_eq!(exec(tmp.path(), &["sync", "--check"]), 0);
    }

    #[test]
    fn test_check_passes_and_fails_on_critical_classes() {
        let tmp = tempdir().unwrap();
        repo(tmp.path());
        assert_eq!(exec(tmp.path(), &["check"]), 0);
        fs::write(tmp.path().join("packages/pkg-a/index.js"), "'.other'").unwrap();
        assert_eq!(exec(tmp.path(), &["check"]), 1);
    }

    #[test]
    fn test_build_exits_one_when_a_package_fails() {
        let tmp = tempdir().unwrap();
        repo(tmp.path());
        // no src/index.css
        assert_eq!(exec(tmp.path(), &["build"]), 1);
        let src = tmp.path().join("packages/pkg-a/src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.css"), ".a-one{}\n").unwrap();
        assert_eq!(exec(tmp.path(), &["build"]), 0);
    }

    #[test]
    fn test_unknown_package_exits_one() {
        let tmp = tempdir().unwrap();
        repo(tmp.path());
        assert_eq!(exec(tmp.path(), &["check", "nope"]), 1);
        assert_eq!(exec(tmp.path(), &["build", "nope"]), 1);
    }

    #[test]
    fn test_panic_maps_to_exit_one() {
        assert_eq!(guarded(|| 0), 0);
        assert_eq!(guarded(|| panic!("boom")), 1);
    }

    #[test]
    fn test_exit_code_helpers() {
        use crate::build::BuildSummary;
        use crate::models::PackageFailure;
        use crate::sync::{SyncAction, SyncOutcome};

        let stale = SyncOutcome {
            actions: vec![SyncAction {
                package: "pkg-a".into(),
                from: "auto".into(),
                to: "2.1.0".into(),
            }],
            ..Default::default()
        };
        assert_eq!(stale.exit_code(true), 1);
        assert_eq!(stale.exit_code(false), 0);
        assert_eq!(SyncOutcome::default().exit_code(true), 0);

        let mut built = BuildSummary::default();
        assert_eq!(built.exit_code(), 0);
        built.failed.push(PackageFailure {
            package: "pkg-b".into(),
            reason: "root stylesheet not found".into(),
        });
        assert_eq!(built.exit_code(), 1);
    }
}
