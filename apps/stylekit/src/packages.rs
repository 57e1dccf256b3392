//! Package discovery.
//!
//! Every directory matched by the packages glob that carries a
//! `package.json` is a package; its id is the directory name.

use crate::config::ExtractCfg;
use crate::error::{Error, Result};
use crate::models::{Package, PackageFailure, Version};
use glob::glob;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    main: Option<String>,
}

fn read_package_json(path: &Path) -> Result<PackageJson> {
    let s = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&s).map_err(|e| Error::PackageJson {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Discovered packages plus those whose metadata could not be read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub packages: Vec<Package>,
    pub failures: Vec<PackageFailure>,
}

impl Discovery {
    pub fn ids(&self) -> BTreeSet<&str> {
        self.packages
            .iter()
            .map(|p| p.id.as_str())
            .chain(self.failures.iter().map(|f| f.package.as_str()))
            .collect()
    }

    /// Restrict to one package id, keeping its failure entry if it has one.
    pub fn retain_only(&mut self, id: &str) {
        self.packages.retain(|p| p.id == id);
        self.failures.retain(|f| f.package == id);
    }
}

fn load_package(dir: &Path, id: &str, cfg: &ExtractCfg) -> Result<Package> {
    let pj_path = dir.join("package.json");
    let pj = read_package_json(&pj_path)?;
    let raw_version = pj.version.ok_or_else(|| Error::PackageJson {
        path: pj_path.clone(),
        reason: "missing `version`".into(),
    })?;
    let version: Version = raw_version.parse()?;
    let source_rel = cfg
        .source_for(id)
        .map(str::to_string)
        .or(pj.main)
        .unwrap_or_else(|| "index.js".to_string());
    Ok(Package {
        id: id.to_string(),
        name: pj.name.unwrap_or_else(|| id.to_string()),
        version,
        description: pj.description.unwrap_or_default(),
        dir: dir.to_path_buf(),
        source: dir.join(source_rel),
    })
}

/// Enumerate package directories under `root` matching `pattern`.
///
/// Unreadable metadata is recorded per package; only a malformed pattern
/// aborts discovery.
pub fn discover(root: &Path, pattern: &str, cfg: &ExtractCfg) -> Result<Discovery> {
    let abs = root.join(pattern).to_string_lossy().to_string();
    let entries = glob(&abs).map_err(|e| Error::Glob {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .filter(|p| p.is_dir() && p.join("package.json").is_file())
        .collect();
    dirs.sort();

    let mut out = Discovery::default();
    let mut seen = BTreeSet::new();
    for dir in dirs {
        let id = match dir.file_name() {
            Some(n) => n.to_string_lossy().to_string(),
            None => continue,
        };
        if !seen.insert(id.clone()) {
            out.failures.push(PackageFailure {
                package: id,
                reason: format!("duplicate package id at `{}`", dir.display()),
            });
            continue;
        }
        match load_package(&dir, &id, cfg) {
            Ok(p) => out.packages.push(p),
            Err(e) => out.failures.push(PackageFailure {
                package: id,
                reason: e.reason(),
            }),
        }
    }
    debug!(
        found = out.packages.len(),
        failed = out.failures.len(),
        "packages discovered"
    );
    Ok(out)
}

/// Version declared by the root `package.json`, if there is one.
pub fn root_version(root: &Path) -> Result<Option<Version>> {
    let path = root.join("package.json");
    if !path.is_file() {
        return Ok(None);
    }
    match read_package_json(&path)?.version {
        Some(v) => Ok(Some(v.parse()?)),
        None => Ok(None),
    }
}
