//! Command orchestration: wires discovery, sync, extraction, comparison,
//! lint, and the distribution builder together for each CLI command.
//!
//! Each function takes explicit inputs and returns an explicit outcome;
//! package-scoped problems end up as `PackageFailure`s, while manifest and
//! configuration problems are returned as errors.

use crate::build::{run_build, BuildSummary};
use crate::compare::compare;
use crate::config::Effective;
use crate::error::{Error, Result};
use crate::extract::run_extract;
use crate::lint::run_lint;
use crate::models::manifest::Manifest;
use crate::models::{Extraction, PackageFailure, Report, Version, Warning, WarningKind};
use crate::packages::{self, Discovery};
use crate::report::{build_report, ReportInput};
use crate::sync::{run_sync, SyncOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Discover packages, optionally narrowed to `only`. `known` lists extra ids
/// (manifest entries) that make `only` valid even without a directory.
fn discover_selected(
    eff: &Effective,
    only: Option<&str>,
    known: &[&str],
) -> Result<Discovery> {
    let mut d = packages::discover(&eff.repo_root, &eff.packages, &eff.extract)?;
    if let Some(id) = only {
        if !d.ids().contains(id) && !known.contains(&id) {
            return Err(Error::UnknownPackage(id.to_string()));
        }
        d.retain_only(id);
    }
    Ok(d)
}

fn actual_versions(d: &Discovery) -> BTreeMap<String, Version> {
    d.packages
        .iter()
        .map(|p| (p.id.clone(), p.version))
        .collect()
}

fn monorepo_version(eff: &Effective, only: Option<&str>) -> Option<Version> {
    if only.is_some() {
        return None;
    }
    packages::root_version(&eff.repo_root).unwrap_or_else(|e| {
        warn!(error = %e, "root package.json ignored");
        None
    })
}

#[derive(Debug, Serialize)]
pub struct CheckOutcome {
    pub sync: SyncOutcome,
    pub report: Report,
}

/// `check`: sync versions, extract, compare, lint, and reduce to a report.
pub fn run_check(eff: &Effective, only: Option<&str>, write_sync: bool) -> Result<CheckOutcome> {
    let mut manifest = Manifest::load(&eff.manifest)?;
    let manifest_ids: Vec<String> = manifest.packages().iter().map(|p| p.id.clone()).collect();
    let known: Vec<&str> = manifest_ids.iter().map(String::as_str).collect();
    let discovery = discover_selected(eff, only, &known)?;

    let sync = run_sync(
        &mut manifest,
        &actual_versions(&discovery),
        monorepo_version(eff, only).as_ref(),
        write_sync,
    )?;

    let extractions: BTreeMap<String, Extraction> = run_extract(&discovery.packages, &eff.extract)
        .into_iter()
        .map(|e| (e.package.clone(), e))
        .collect();

    let mut failures = discovery.failures.clone();
    for e in extractions.values() {
        if let Some(reason) = &e.error {
            failures.push(PackageFailure {
                package: e.package.clone(),
                reason: reason.clone(),
            });
        }
    }

    let mut input = ReportInput::default();
    for def in manifest.packages() {
        if only.is_some_and(|id| id != def.id) {
            continue;
        }
        let on_disk = discovery.packages.iter().any(|p| p.id == def.id)
            || discovery.failures.iter().any(|f| f.package == def.id);
        if !on_disk {
            failures.push(PackageFailure {
                package: def.id.clone(),
                reason: "package directory not found".into(),
            });
        }
        let inventory = extractions
            .get(&def.id)
            .map(|e| e.inventory.clone())
            .unwrap_or_default();
        let result = compare(&inventory.classes, &def.defined_classes(), &def.critical);
        debug!(
            package = %def.id,
            missing = result.missing.len(),
            new = result.new.len(),
            "compared"
        );
        input.results.insert(def.id.clone(), result);
        input.inventories.insert(def.id.clone(), inventory);
    }

    for (id, e) in &extractions {
        if manifest.package(id).is_none() {
            input.extra_warnings.push(Warning {
                kind: WarningKind::UnlistedPackage,
                package: id.clone(),
                items: e.inventory.classes.iter().cloned().collect(),
            });
        }
    }
    input
        .extra_warnings
        .extend(run_lint(&discovery.packages, &eff.build, &eff.lint));
    input.failures = failures;

    Ok(CheckOutcome {
        sync,
        report: build_report(input),
    })
}

#[derive(Debug, Serialize)]
pub struct ExtractOutcome {
    pub packages: Vec<Extraction>,
    pub failures: Vec<PackageFailure>,
}

impl ExtractOutcome {
    /// Non-zero only when nothing at all could be extracted.
    pub fn exit_code(&self) -> i32 {
        let ok = self.packages.iter().filter(|e| e.error.is_none()).count();
        if ok == 0 && (!self.failures.is_empty() || self.packages.iter().any(|e| e.error.is_some()))
        {
            1
        } else {
            0
        }
    }
}

/// `extract`: inventory only; needs no manifest.
pub fn run_extract_only(eff: &Effective, only: Option<&str>) -> Result<ExtractOutcome> {
    let d = discover_selected(eff, only, &[])?;
    Ok(ExtractOutcome {
        packages: run_extract(&d.packages, &eff.extract),
        failures: d.failures,
    })
}

/// `sync`: version sync only.
pub fn run_sync_only(eff: &Effective, only: Option<&str>, write: bool) -> Result<SyncOutcome> {
    let mut manifest = Manifest::load(&eff.manifest)?;
    let ids: Vec<String> = manifest.packages().iter().map(|p| p.id.clone()).collect();
    let known: Vec<&str> = ids.iter().map(String::as_str).collect();
    let d = discover_selected(eff, only, &known)?;
    run_sync(
        &mut manifest,
        &actual_versions(&d),
        monorepo_version(eff, only).as_ref(),
        write,
    )
}

/// `build`: distribution files for every selected package.
pub fn run_build_only(eff: &Effective, only: Option<&str>) -> Result<BuildSummary> {
    let d = discover_selected(eff, only, &[])?;
    let mut summary = run_build(&d.packages, &eff.build);
    summary.failed.extend(d.failures);
    summary.failed.sort_by(|a, b| a.package.cmp(&b.package));
    Ok(summary)
}
