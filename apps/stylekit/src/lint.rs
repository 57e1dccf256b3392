//! Advisory stylesheet lint.
//!
//! Flags overuse of `!important` and oversized selectors in each package's
//! inlined stylesheet. Findings are always warnings; they never change the
//! exit status.

use crate::build::inline_imports;
use crate::config::{BuildCfg, LintCfg};
use crate::models::{Package, Warning, WarningKind};
use rayon::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment regex"));
static IMPORTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!\s*important").expect("important regex"));
static WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Selector preludes of every qualified rule, at-rules excluded.
fn selectors(css: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for (i, ch) in css.char_indices() {
        match ch {
            '{' => {
                let prelude = css[start..i].trim();
                if !prelude.is_empty() && !prelude.starts_with('@') {
                    for sel in prelude.split(',') {
                        let s = WS.replace_all(sel.trim(), " ").to_string();
                        if !s.is_empty() {
                            out.push(s);
                        }
                    }
                }
                start = i + 1;
            }
            '}' | ';' => start = i + 1,
            _ => {}
        }
    }
    out
}

/// Lint one stylesheet's text.
pub fn lint_stylesheet(package: &str, css: &str, cfg: &LintCfg) -> Vec<Warning> {
    let css = COMMENT.replace_all(css, "");
    let mut warnings = Vec::new();

    let important = IMPORTANT.find_iter(&css).count();
    if important > cfg.max_important {
        warnings.push(Warning {
            kind: WarningKind::ExcessiveImportant,
            package: package.to_string(),
            items: vec![format!(
                "{} uses of !important (limit {})",
                important, cfg.max_important
            )],
        });
    }

    let mut long: Vec<String> = selectors(&css)
        .into_iter()
        .filter(|s| s.chars().count() > cfg.max_selector_length)
        .collect();
    long.sort();
    long.dedup();
    if !long.is_empty() {
        warnings.push(Warning {
            kind: WarningKind::OversizedSelector,
            package: package.to_string(),
            items: long,
        });
    }
    warnings
}

/// Lint every package whose entry stylesheet exists. Packages without one,
/// or whose imports cannot be resolved, are skipped.
pub fn run_lint(packages: &[Package], build: &BuildCfg, cfg: &LintCfg) -> Vec<Warning> {
    let mut out: Vec<Warning> = packages
        .par_iter()
        .flat_map_iter(|p| {
            let entry = p.dir.join(&build.entry);
            if !entry.is_file() {
                return Vec::new();
            }
            match inline_imports(&entry) {
                Ok(css) => lint_stylesheet(&p.id, &css, cfg),
                Err(e) => {
                    debug!(package = %p.id, error = %e, "lint skipped");
                    Vec::new()
                }
            }
        })
        .collect();
    out.sort_by(|a, b| a.package.cmp(&b.package).then(a.kind.cmp(&b.kind)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_important: usize, max_selector_length: usize) -> LintCfg {
        LintCfg {
            max_important,
            max_selector_length,
        }
    }

    #[test]
    fn counts_important_outside_comments() {
        let css = "/* !important !important */ .a { color: red !important; } .b { top: 0 ! IMPORTANT; }";
        let w = lint_stylesheet("p", css, &cfg(1, 200));
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].kind, WarningKind::ExcessiveImportant);
        assert!(w[0].items[0].starts_with("2 uses"));
        assert!(lint_stylesheet("p", css, &cfg(2, 200)).is_empty());
    }

    #[test]
    fn flags_long_selectors_in_lists_and_nested_rules() {
        let css = "@media (min-width: 1px) {\n  .short,\n  .a-very-long-selector-name .with-descendant > .child { x: y; }\n}\n@keyframes spin { from { a: b; } }";
        let w = lint_stylesheet("p", css, &cfg(10, 30));
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].kind, WarningKind::OversizedSelector);
        assert_eq!(
            w[0].items,
            vec![".a-very-long-selector-name .with-descendant > .child"]
        );
    }

    #[test]
    fn selector_scan_skips_at_rules_and_declarations() {
        let s = selectors("@layer utilities { .x { a: b; } } :root{--c:1} @import 'y';");
        assert_eq!(s, vec![".x", ":root"]);
    }
}
