//! Shared data models for packages, inventories, comparisons, and reports.

pub mod manifest;

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A `MAJOR.MINOR.PATCH` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidVersion(s.to_string()));
        }
        let num = |p: &str| -> Result<u64> {
            let leading_zero = p.len() > 1 && p.starts_with('0');
            if p.is_empty() || leading_zero || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidVersion(s.to_string()));
            }
            p.parse().map_err(|_| Error::InvalidVersion(s.to_string()))
        };
        Ok(Version {
            major: num(parts[0])?,
            minor: num(parts[1])?,
            patch: num(parts[2])?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Version as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionField {
    /// The `"auto"` sentinel, or no version recorded at all.
    AutoSync,
    Pinned(Version),
    /// Anything that is neither `"auto"` nor a valid version.
    Unparsed(String),
}

pub const AUTO_SENTINEL: &str = "auto";

impl VersionField {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None => VersionField::AutoSync,
            Some(s) if s.eq_ignore_ascii_case(AUTO_SENTINEL) => VersionField::AutoSync,
            Some(s) => match s.parse::<Version>() {
                Ok(v) => VersionField::Pinned(v),
                Err(_) => VersionField::Unparsed(s.to_string()),
            },
        }
    }

    /// Whether this recorded value must be overwritten with `actual`.
    pub fn needs_sync(&self, actual: &Version) -> bool {
        match self {
            VersionField::AutoSync => true,
            VersionField::Pinned(v) => v != actual,
            VersionField::Unparsed(_) => true,
        }
    }
}

impl fmt::Display for VersionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionField::AutoSync => f.write_str(AUTO_SENTINEL),
            VersionField::Pinned(v) => write!(f, "{}", v),
            VersionField::Unparsed(s) => f.write_str(s),
        }
    }
}

/// A discovered package directory.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub version: Version,
    pub description: String,
    pub dir: PathBuf,
    /// Plugin source file scanned by the extractor.
    pub source: PathBuf,
}

/// Names recovered from one plugin source by textual extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub classes: BTreeSet<String>,
    pub variables: BTreeSet<String>,
    #[serde(rename = "keyframeNames")]
    pub keyframe_names: BTreeSet<String>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.variables.is_empty() && self.keyframe_names.is_empty()
    }
}

/// Per-package extraction outcome. A failed package keeps empty sets.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub package: String,
    pub inventory: Inventory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Set differences between manifest-declared and extracted classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub extracted: BTreeSet<String>,
    pub defined: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub new: BTreeSet<String>,
    pub common: BTreeSet<String>,
    #[serde(rename = "criticalMissing")]
    pub critical_missing: BTreeSet<String>,
}

impl ComparisonResult {
    pub fn has_critical_regression(&self) -> bool {
        !self.critical_missing.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CriticalIssue {
    pub package: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    MissingClasses,
    NewClasses,
    UnlistedPackage,
    ExcessiveImportant,
    OversizedSelector,
}

impl WarningKind {
    pub fn label(&self) -> &'static str {
        match self {
            WarningKind::MissingClasses => "missing classes",
            WarningKind::NewClasses => "new classes",
            WarningKind::UnlistedPackage => "package not in manifest",
            WarningKind::ExcessiveImportant => "excessive !important",
            WarningKind::OversizedSelector => "oversized selector",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub package: String,
    pub items: Vec<String>,
}

/// A package that could not be processed; the run continues without it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageFailure {
    pub package: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageSummary {
    pub package: String,
    pub extracted: usize,
    pub defined: usize,
    pub common: usize,
    pub missing: usize,
    pub new: usize,
    pub variables: usize,
    pub keyframes: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub packages: usize,
    pub critical: usize,
    pub warnings: usize,
    pub failures: usize,
}

/// Aggregate verification report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub packages: Vec<PackageSummary>,
    #[serde(rename = "criticalIssues")]
    pub critical_issues: Vec<CriticalIssue>,
    pub warnings: Vec<Warning>,
    pub failures: Vec<PackageFailure>,
    pub results: BTreeMap<String, ComparisonResult>,
    pub summary: Summary,
}

impl Report {
    /// `1` when any package lost a critical class, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.critical_issues.is_empty() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_three_integers() {
        let v: Version = "2.10.0".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch), (2, 10, 0));
        assert_eq!(v.to_string(), "2.10.0");
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.x".parse::<Version>().is_err());
        assert!("1.2.3-beta".parse::<Version>().is_err());
        assert!("-1.2.3".parse::<Version>().is_err());
    }

    #[test]
    fn version_field_sync_rule() {
        let actual: Version = "2.1.0".parse().unwrap();
        assert!(VersionField::parse(Some("auto")).needs_sync(&actual));
        assert!(VersionField::parse(None).needs_sync(&actual));
        assert!(VersionField::parse(Some("2.0.9")).needs_sync(&actual));
        assert!(VersionField::parse(Some("latest")).needs_sync(&actual));
        assert!(!VersionField::parse(Some("2.1.0")).needs_sync(&actual));
        assert_eq!(
            VersionField::parse(Some("AUTO")),
            VersionField::AutoSync
        );
    }

    #[test]
    fn leading_zeros_are_not_a_version() {
        assert!("01.0.0".parse::<Version>().is_err());
        assert!("1.00.0".parse::<Version>().is_err());
        assert!("0.0.0".parse::<Version>().is_ok());
        let actual: Version = "1.0.0".parse().unwrap();
        let recorded = VersionField::parse(Some("01.0.0"));
        assert_eq!(recorded, VersionField::Unparsed("01.0.0".into()));
        assert!(recorded.needs_sync(&actual));
    }
}
