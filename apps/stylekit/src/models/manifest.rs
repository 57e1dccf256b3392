//! Expected-classes manifest.
//!
//! The manifest is kept as an order-preserving JSON document so that version
//! sync can rewrite a handful of fields without reshuffling the rest of the
//! file. A typed view (`PackageDef`) is derived from the document on load and
//! after every mutation.

use crate::error::{Error, Result};
use crate::extract::{is_valid_class, normalize_class};
use crate::models::{Version, VersionField};
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Class lists as written in the manifest: grouped, or a plain list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ClassGroups {
    Grouped(BTreeMap<String, Vec<String>>),
    Flat(Vec<String>),
}

impl Default for ClassGroups {
    fn default() -> Self {
        ClassGroups::Grouped(BTreeMap::new())
    }
}

impl ClassGroups {
    fn into_groups(self, default_group: &str) -> BTreeMap<String, Vec<String>> {
        match self {
            ClassGroups::Grouped(m) => m,
            ClassGroups::Flat(v) => BTreeMap::from([(default_group.to_string(), v)]),
        }
    }
}

#[derive(Deserialize)]
struct RawPackage {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    utilities: ClassGroups,
    #[serde(default)]
    components: ClassGroups,
    #[serde(default, rename = "criticalClasses")]
    critical_classes: Vec<String>,
}

/// Typed view of one `packages.<id>` entry.
#[derive(Debug, Clone)]
pub struct PackageDef {
    pub id: String,
    pub version: VersionField,
    pub description: String,
    pub utilities: BTreeMap<String, Vec<String>>,
    pub components: BTreeMap<String, Vec<String>>,
    pub critical: BTreeSet<String>,
}

impl PackageDef {
    /// Union of every utilities and components group, normalized to `.name`.
    pub fn defined_classes(&self) -> BTreeSet<String> {
        self.utilities
            .values()
            .chain(self.components.values())
            .flatten()
            .map(|c| normalize_class(c))
            .collect()
    }
}

/// Loaded manifest document plus its typed package view.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    doc: Json,
    packages: Vec<PackageDef>,
}

impl Manifest {
    /// Read and validate the manifest. Every failure here is fatal for a run.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ManifestMissing(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let doc: Json = serde_json::from_str(&raw).map_err(|source| Error::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path.to_path_buf(), doc)
    }

    pub fn from_json(path: PathBuf, doc: Json) -> Result<Self> {
        let mut m = Manifest {
            path,
            doc,
            packages: Vec::new(),
        };
        m.refresh()?;
        m.validate()?;
        Ok(m)
    }

    /// Rebuild the typed view from the raw document.
    fn refresh(&mut self) -> Result<()> {
        let pkgs = self
            .doc
            .as_object()
            .ok_or_else(|| Error::ManifestInvalid("top level must be an object".into()))?
            .get("packages")
            .ok_or_else(|| Error::ManifestInvalid("missing `packages` object".into()))?
            .as_object()
            .ok_or_else(|| Error::ManifestInvalid("`packages` must be an object".into()))?;
        let mut out = Vec::with_capacity(pkgs.len());
        for (id, val) in pkgs {
            let rp: RawPackage = serde_json::from_value(val.clone())
                .map_err(|e| Error::ManifestInvalid(format!("packages.{}: {}", id, e)))?;
            out.push(PackageDef {
                id: id.clone(),
                version: VersionField::parse(rp.version.as_deref()),
                description: rp.description.unwrap_or_default(),
                utilities: rp.utilities.into_groups("default"),
                components: rp.components.into_groups("default"),
                critical: rp
                    .critical_classes
                    .iter()
                    .map(|c| normalize_class(c))
                    .collect(),
            });
        }
        self.packages = out;
        Ok(())
    }

    /// Every listed class must be a valid selector name and every critical
    /// class must also be listed in its package's utilities or components.
    fn validate(&self) -> Result<()> {
        for p in &self.packages {
            let defined = p.defined_classes();
            if let Some(bad) = defined
                .iter()
                .chain(p.critical.iter())
                .find(|c| !is_valid_class(c))
            {
                return Err(Error::ManifestInvalid(format!(
                    "packages.{}: `{}` is not a valid class name",
                    p.id, bad
                )));
            }
            let orphans: Vec<&str> = p
                .critical
                .iter()
                .filter(|c| !defined.contains(*c))
                .map(String::as_str)
                .collect();
            if !orphans.is_empty() {
                return Err(Error::ManifestInvalid(format!(
                    "packages.{}: critical classes not listed in utilities/components: {}",
                    p.id,
                    orphans.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn packages(&self) -> &[PackageDef] {
        &self.packages
    }

    pub fn package(&self, id: &str) -> Option<&PackageDef> {
        self.packages.iter().find(|p| p.id == id)
    }

    pub fn monorepo_version(&self) -> VersionField {
        VersionField::parse(self.doc.get("monorepoVersion").and_then(Json::as_str))
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.doc.get("lastUpdated").and_then(Json::as_str)
    }

    fn root_mut(&mut self) -> &mut Map<String, Json> {
        // `refresh` guarantees an object at the top level.
        match &mut self.doc {
            Json::Object(m) => m,
            _ => unreachable!("manifest root validated as object"),
        }
    }

    /// Overwrite `packages.<id>.version`, keeping its position in the entry.
    pub fn set_package_version(&mut self, id: &str, version: &Version) -> Result<()> {
        if let Some(Json::Object(entry)) = self
            .root_mut()
            .get_mut("packages")
            .and_then(|p| p.get_mut(id))
        {
            entry.insert("version".into(), Json::String(version.to_string()));
        }
        self.refresh()
    }

    pub fn set_monorepo_version(&mut self, version: &Version) {
        self.root_mut()
            .insert("monorepoVersion".into(), Json::String(version.to_string()));
    }

    pub fn set_last_updated(&mut self, timestamp: &str) {
        self.root_mut()
            .insert("lastUpdated".into(), Json::String(timestamp.to_string()));
    }

    pub fn to_pretty_string(&self) -> String {
        let mut s = serde_json::to_string_pretty(&self.doc).unwrap_or_default();
        s.push('\n');
        s
    }

    /// Persist the whole document back to `path`.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.to_pretty_string()).map_err(|e| Error::io(&self.path, e))
    }
}
