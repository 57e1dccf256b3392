//! Report reducer and CI gate.
//!
//! Folds per-package comparison results into a `Report`. Missing critical
//! classes become critical issues (exit code 1); any other drift is a
//! warning and never changes the exit code.

use crate::models::{
    ComparisonResult, CriticalIssue, Inventory, PackageFailure, PackageSummary, Report, Summary,
    Warning, WarningKind,
};
use std::collections::BTreeMap;

/// Everything the reducer needs, already computed.
#[derive(Debug, Default)]
pub struct ReportInput {
    pub results: BTreeMap<String, ComparisonResult>,
    pub inventories: BTreeMap<String, Inventory>,
    pub failures: Vec<PackageFailure>,
    /// Warnings produced outside the comparison (unlisted packages, lint).
    pub extra_warnings: Vec<Warning>,
}

pub fn build_report(input: ReportInput) -> Report {
    let mut packages = Vec::with_capacity(input.results.len());
    let mut critical_issues = Vec::new();
    let mut warnings = Vec::new();

    for (id, r) in &input.results {
        let inv = input.inventories.get(id);
        packages.push(PackageSummary {
            package: id.clone(),
            extracted: r.extracted.len(),
            defined: r.defined.len(),
            common: r.common.len(),
            missing: r.missing.len(),
            new: r.new.len(),
            variables: inv.map_or(0, |i| i.variables.len()),
            keyframes: inv.map_or(0, |i| i.keyframe_names.len()),
        });
        if r.has_critical_regression() {
            critical_issues.push(CriticalIssue {
                package: id.clone(),
                classes: r.critical_missing.iter().cloned().collect(),
            });
        }
        let soft_missing: Vec<String> = r
            .missing
            .difference(&r.critical_missing)
            .cloned()
            .collect();
        if !soft_missing.is_empty() {
            warnings.push(Warning {
                kind: WarningKind::MissingClasses,
                package: id.clone(),
                items: soft_missing,
            });
        }
        if !r.new.is_empty() {
            warnings.push(Warning {
                kind: WarningKind::NewClasses,
                package: id.clone(),
                items: r.new.iter().cloned().collect(),
            });
        }
    }
    warnings.extend(input.extra_warnings);
    warnings.sort_by(|a, b| a.package.cmp(&b.package).then(a.kind.cmp(&b.kind)));

    let mut failures = input.failures;
    failures.sort_by(|a, b| a.package.cmp(&b.package));
    failures.dedup();

    let summary = Summary {
        packages: packages.len(),
        critical: critical_issues.len(),
        warnings: warnings.len(),
        failures: failures.len(),
    };
    Report {
        packages,
        critical_issues,
        warnings,
        failures,
        results: input.results,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn input(cases: &[(&str, &[&str], &[&str], &[&str])]) -> ReportInput {
        let mut results = BTreeMap::new();
        for (id, extracted, defined, critical) in cases {
            results.insert(
                id.to_string(),
                compare(&set(extracted), &set(defined), &set(critical)),
            );
        }
        ReportInput {
            results,
            ..Default::default()
        }
    }

    #[test]
    fn missing_critical_fails_gate() {
        let r = build_report(input(&[(
            "pkg-a",
            &[".a-two"],
            &[".a-one", ".a-two"],
            &[".a-one"],
        )]));
        assert_eq!(r.exit_code(), 1);
        assert_eq!(
            r.critical_issues,
            vec![CriticalIssue {
                package: "pkg-a".into(),
                classes: vec![".a-one".into()]
            }]
        );
        // the critical class is not repeated as a warning
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn new_classes_warn_but_pass() {
        let r = build_report(input(&[(
            "pkg-a",
            &[".a-one", ".a-two", ".a-three"],
            &[".a-one", ".a-two"],
            &[".a-one"],
        )]));
        assert_eq!(r.exit_code(), 0);
        assert_eq!(r.warnings.len(), 1);
        assert_eq!(r.warnings[0].kind, WarningKind::NewClasses);
        assert_eq!(r.warnings[0].items, vec![".a-three"]);
        assert_eq!(r.packages[0].common, 2);
    }

    #[test]
    fn gate_ignores_any_amount_of_soft_drift() {
        let many: Vec<String> = (0..40).map(|i| format!(".x-{}", i)).collect();
        let many_refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let mut inp = input(&[
            ("a", &[], many_refs.as_slice(), &[]),
            ("b", many_refs.as_slice(), &[], &[]),
        ]);
        inp.extra_warnings.push(Warning {
            kind: WarningKind::ExcessiveImportant,
            package: "a".into(),
            items: vec!["99 uses".into()],
        });
        inp.failures.push(PackageFailure {
            package: "a".into(),
            reason: "no classes extracted".into(),
        });
        let r = build_report(inp);
        assert_eq!(r.exit_code(), 0);
        assert_eq!(r.summary.warnings, 3);
        assert_eq!(r.summary.failures, 1);
        // full lists stay available to programmatic consumers
        assert_eq!(r.warnings[0].items.len(), 40);
        assert_eq!(r.warnings[0].kind, WarningKind::MissingClasses);
        assert_eq!(r.warnings[1].kind, WarningKind::ExcessiveImportant);
    }

    #[test]
    fn any_critical_package_fails_whole_run() {
        let r = build_report(input(&[
            ("ok", &[".o"], &[".o"], &[".o"]),
            ("bad", &[], &[".b"], &[".b"]),
        ]));
        assert_eq!(r.exit_code(), 1);
        assert_eq!(r.summary.critical, 1);
        assert_eq!(r.summary.packages, 2);
    }
}
