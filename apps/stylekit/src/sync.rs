//! Manifest version sync.
//!
//! Keeps `packages.<id>.version` and `monorepoVersion` in line with the
//! versions declared by the packages themselves. The manifest is rewritten
//! (with a fresh `lastUpdated`) only when at least one field changed.

use crate::error::Result;
use crate::models::manifest::Manifest;
use crate::models::Version;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Entry name used for the monorepo-wide version in sync actions.
pub const MONOREPO: &str = "(monorepo)";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncAction {
    pub package: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOutcome {
    pub actions: Vec<SyncAction>,
    /// Whether the manifest file was rewritten.
    pub wrote: bool,
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl SyncOutcome {
    pub fn would_write(&self) -> bool {
        !self.actions.is_empty()
    }

    /// `1` when `check` is set and the manifest is stale, else `0`.
    pub fn exit_code(&self, check: bool) -> i32 {
        if check && self.would_write() {
            1
        } else {
            0
        }
    }
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Apply the sync rule in memory. Returns one action per overwritten field;
/// `lastUpdated` is set to `now` only when the list is non-empty.
pub fn apply_sync(
    manifest: &mut Manifest,
    actual: &BTreeMap<String, Version>,
    root_version: Option<&Version>,
    now: &str,
) -> Result<Vec<SyncAction>> {
    let mut actions = Vec::new();
    let stale: Vec<(String, String, Version)> = manifest
        .packages()
        .iter()
        .filter_map(|def| {
            let v = actual.get(&def.id)?;
            def.version
                .needs_sync(v)
                .then(|| (def.id.clone(), def.version.to_string(), *v))
        })
        .collect();
    for (id, from, to) in stale {
        manifest.set_package_version(&id, &to)?;
        actions.push(SyncAction {
            package: id,
            from,
            to: to.to_string(),
        });
    }
    if let Some(rv) = root_version {
        let current = manifest.monorepo_version();
        if current.needs_sync(rv) {
            manifest.set_monorepo_version(rv);
            actions.push(SyncAction {
                package: MONOREPO.to_string(),
                from: current.to_string(),
                to: rv.to_string(),
            });
        }
    }
    if !actions.is_empty() {
        manifest.set_last_updated(now);
    }
    Ok(actions)
}

/// Sync and, when `write` is set and anything changed, persist the manifest.
pub fn run_sync(
    manifest: &mut Manifest,
    actual: &BTreeMap<String, Version>,
    root_version: Option<&Version>,
    write: bool,
) -> Result<SyncOutcome> {
    let now = timestamp();
    let previous = manifest.last_updated().map(str::to_string);
    let actions = apply_sync(manifest, actual, root_version, &now)?;
    let mut out = SyncOutcome {
        wrote: false,
        last_updated: None,
        actions,
    };
    if out.would_write() {
        out.last_updated = Some(now);
        if write {
            manifest.save()?;
            out.wrote = true;
            info!(
                path = %manifest.path.display(),
                changes = out.actions.len(),
                previous = previous.as_deref().unwrap_or("never"),
                "manifest versions synced"
            );
        }
    }
    Ok(out)
}
