//! Configuration discovery and effective settings resolution.
//!
//! Stylekit reads `stylekit.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `manifest`: `scripts/expected-classes.json`
//! - `packages`: `packages/*`
//! - `output`: `human`
//! - `extract.variable_prefix`: `--`, `extract.animation_prefix`: `animate-`
//! - `build.entry`: `src/index.css` -> `index.css` + `dist.css`
//! - `lint.max_important`: 10, `lint.max_selector_length`: 120
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_MANIFEST: &str = "scripts/expected-classes.json";
pub const DEFAULT_PACKAGES: &str = "packages/*";
const CONFIG_NAMES: [&str; 3] = ["stylekit.toml", "stylekit.yaml", "stylekit.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Per-package extraction overrides under `[extract.packages.<id>]`.
pub struct PackageExtractCfg {
    pub prefixes: Option<Vec<String>>,
    /// Plugin source relative to the package directory.
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
/// Extraction section under `[extract]`.
pub struct ExtractCfg {
    pub variable_prefix: String,
    pub animation_prefix: String,
    pub class_prefixes: Vec<String>,
    pub packages: HashMap<String, PackageExtractCfg>,
}

impl Default for ExtractCfg {
    fn default() -> Self {
        ExtractCfg {
            variable_prefix: "--".into(),
            animation_prefix: "animate-".into(),
            class_prefixes: Vec::new(),
            packages: HashMap::new(),
        }
    }
}

impl ExtractCfg {
    /// Package allow-list if configured, else the global one.
    pub fn prefixes_for(&self, id: &str) -> Vec<String> {
        self.packages
            .get(id)
            .and_then(|p| p.prefixes.clone())
            .unwrap_or_else(|| self.class_prefixes.clone())
    }

    pub fn source_for(&self, id: &str) -> Option<&str> {
        self.packages.get(id).and_then(|p| p.source.as_deref())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
/// A literal rewrite applied to the plain distribution variant.
pub struct FallbackCfg {
    pub pattern: String,
    pub value: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
/// Distribution builder section under `[build]`.
pub struct BuildCfg {
    pub entry: String,
    pub framework_file: String,
    pub plain_file: String,
    pub fallbacks: Vec<FallbackCfg>,
}

impl Default for BuildCfg {
    fn default() -> Self {
        BuildCfg {
            entry: "src/index.css".into(),
            framework_file: "index.css".into(),
            plain_file: "dist.css".into(),
            fallbacks: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
/// Advisory lint thresholds under `[lint]`.
pub struct LintCfg {
    pub max_important: usize,
    pub max_selector_length: usize,
}

impl Default for LintCfg {
    fn default() -> Self {
        LintCfg {
            max_important: 10,
            max_selector_length: 120,
        }
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `stylekit.toml|yaml`.
pub struct StylekitConfig {
    pub manifest: Option<String>,
    pub packages: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub extract: Option<ExtractCfg>,
    #[serde(default)]
    pub build: Option<BuildCfg>,
    #[serde(default)]
    pub lint: Option<LintCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub manifest: PathBuf,
    pub packages: String,
    pub output: String,
    pub extract: ExtractCfg,
    pub build: BuildCfg,
    pub lint: LintCfg,
    pub config_found: bool,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `stylekit.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `StylekitConfig` from `stylekit.toml` or `stylekit.yaml|yml` if
/// present. A file that fails to parse is reported and ignored.
pub fn load_config(root: &Path) -> Option<StylekitConfig> {
    let toml_path = root.join(CONFIG_NAMES[0]);
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!(path = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in &CONFIG_NAMES[1..] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_manifest: Option<&str>,
    cli_output: Option<&str>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let manifest = cli_manifest
        .map(|s| s.to_string())
        .or(cfg.manifest)
        .unwrap_or_else(|| DEFAULT_MANIFEST.to_string());
    let manifest = repo_root.join(manifest);

    let packages = cfg
        .packages
        .unwrap_or_else(|| DEFAULT_PACKAGES.to_string());

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    Effective {
        repo_root,
        manifest,
        packages,
        output,
        extract: cfg.extract.unwrap_or_default(),
        build: cfg.build.unwrap_or_default(),
        lint: cfg.lint.unwrap_or_default(),
        config_found,
    }
}
