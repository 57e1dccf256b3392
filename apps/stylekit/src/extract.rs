//! Textual class/variable extractor.
//!
//! Plugin sources are never executed. Three pattern families are scanned and
//! unioned:
//! - quoted strings starting with `.` (class selectors), filtered by the
//!   package's prefix allow-list;
//! - bare custom-property tokens carrying the reserved variable prefix;
//! - `@keyframes <name>` plus quoted strings following the animation-name
//!   convention.
//!
//! Regex scanning stops naturally at unterminated quotes, so incomplete or
//! framework-specific syntax never raises an error.

use crate::config::ExtractCfg;
use crate::models::{Extraction, Inventory, Package};
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::sync::LazyLock;
use tracing::debug;

static CLASS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("class name regex"));
static QUOTED_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'`]\.([A-Za-z0-9_-]+)"#).expect("quoted class regex"));
static KEYFRAMES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@keyframes\s+([A-Za-z0-9_-]+)").expect("keyframes regex"));

/// True when `name` (with or without its leading `.`) is a valid class token.
pub fn is_valid_class(name: &str) -> bool {
    CLASS_NAME.is_match(name.strip_prefix('.').unwrap_or(name))
}

/// Canonical `.name` form used for every set comparison.
pub fn normalize_class(name: &str) -> String {
    let t = name.trim();
    if t.starts_with('.') {
        t.to_string()
    } else {
        format!(".{}", t)
    }
}

/// Compiled extraction rules for one package.
pub struct Extractor {
    class_prefixes: Vec<String>,
    variable: Regex,
    animation: Regex,
}

impl Extractor {
    /// Build rules from an explicit prefix allow-list (empty = accept every
    /// valid class), the variable prefix, and the animation-name prefix.
    pub fn new(class_prefixes: &[String], variable_prefix: &str, animation_prefix: &str) -> Self {
        let variable = Regex::new(&format!(
            r"(?:^|[^A-Za-z0-9_-])({}[A-Za-z0-9_-]+)",
            regex::escape(variable_prefix)
        ))
        .expect("escaped variable regex");
        let animation = Regex::new(&format!(
            r#"["'`]({}[A-Za-z0-9_-]+)["'`]"#,
            regex::escape(animation_prefix)
        ))
        .expect("escaped animation regex");
        Extractor {
            class_prefixes: class_prefixes
                .iter()
                .map(|p| p.trim_start_matches('.').to_string())
                .collect(),
            variable,
            animation,
        }
    }

    pub fn for_package(cfg: &ExtractCfg, package_id: &str) -> Self {
        Self::new(
            &cfg.prefixes_for(package_id),
            &cfg.variable_prefix,
            &cfg.animation_prefix,
        )
    }

    fn allowed(&self, bare: &str) -> bool {
        self.class_prefixes.is_empty() || self.class_prefixes.iter().any(|p| bare.starts_with(p))
    }

    /// Scan `source` and return the de-duplicated inventory.
    pub fn extract(&self, source: &str) -> Inventory {
        let mut inv = Inventory::default();
        for cap in QUOTED_CLASS.captures_iter(source) {
            let bare = &cap[1];
            if CLASS_NAME.is_match(bare) && self.allowed(bare) {
                inv.classes.insert(format!(".{}", bare));
            }
        }
        for cap in self.variable.captures_iter(source) {
            let tok = &cap[1];
            if tok.bytes().any(|b| b.is_ascii_alphanumeric()) {
                inv.variables.insert(tok.to_string());
            }
        }
        for cap in KEYFRAMES.captures_iter(source) {
            inv.keyframe_names.insert(cap[1].to_string());
        }
        for cap in self.animation.captures_iter(source) {
            inv.keyframe_names.insert(cap[1].to_string());
        }
        inv
    }
}

/// Read and scan one package's plugin source. Read failures are recorded on
/// the returned entry with empty sets.
pub fn extract_package(pkg: &Package, cfg: &ExtractCfg) -> Extraction {
    let extractor = Extractor::for_package(cfg, &pkg.id);
    match fs::read_to_string(&pkg.source) {
        Ok(src) => {
            let inventory = extractor.extract(&src);
            debug!(
                package = %pkg.id,
                classes = inventory.classes.len(),
                variables = inventory.variables.len(),
                keyframes = inventory.keyframe_names.len(),
                "extracted"
            );
            let error = if inventory.classes.is_empty() {
                Some(format!(
                    "no classes extracted from `{}`",
                    pkg.source.display()
                ))
            } else {
                None
            };
            Extraction {
                package: pkg.id.clone(),
                inventory,
                error,
            }
        }
        Err(e) => Extraction {
            package: pkg.id.clone(),
            inventory: Inventory::default(),
            error: Some(crate::error::Error::io(&pkg.source, e).reason()),
        },
    }
}

/// Extract every package. Packages are independent, so the scan fans out;
/// results come back sorted by package id.
pub fn run_extract(packages: &[Package], cfg: &ExtractCfg) -> Vec<Extraction> {
    let mut out: Vec<Extraction> = packages
        .par_iter()
        .map(|p| extract_package(p, cfg))
        .collect();
    out.sort_by(|a, b| a.package.cmp(&b.package));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(prefixes: &[&str]) -> Extractor {
        let p: Vec<String> = prefixes.iter().map(|s| s.to_string()).collect();
        Extractor::new(&p, "--glass-", "animate-")
    }

    const SRC: &str = r#"
module.exports = plugin(function ({ addUtilities, addComponents }) {
  addUtilities({
    '.glass-card': { backdropFilter: 'blur(var(--glass-blur))' },
    ".glass-card:hover": { opacity: '.9' },
    '.glass-panel .inner': { '--glass-tint': 'rgba(255,255,255,.1)' },
    '.5x': {},
    '.orb-float': { animation: 'animate-float 3s infinite' },
  });
  addBase({ '@keyframes shimmer': { '0%': {} } });
  const name = 'animate-pulse';
});
"#;

    #[test]
    fn extracts_prefixed_classes_variables_and_keyframes() {
        let inv = ex(&["glass-"]).extract(SRC);
        let classes: Vec<_> = inv.classes.iter().map(String::as_str).collect();
        assert_eq!(classes, vec![".glass-card", ".glass-panel"]);
        let vars: Vec<_> = inv.variables.iter().map(String::as_str).collect();
        assert_eq!(vars, vec!["--glass-blur", "--glass-tint"]);
        assert!(inv.keyframe_names.contains("shimmer"));
        assert!(inv.keyframe_names.contains("animate-pulse"));
        // only fully quoted animation names count
        assert!(!inv.keyframe_names.contains("animate-float"));
    }

    #[test]
    fn empty_prefix_list_accepts_valid_names_only() {
        let inv = ex(&[]).extract(SRC);
        assert!(inv.classes.contains(".orb-float"));
        assert!(!inv.classes.iter().any(|c| c.starts_with(".5")));
        // '.9' is an opacity value, not a class
        assert!(!inv.classes.contains(".9"));
    }

    #[test]
    fn empty_and_malformed_sources_do_not_fail() {
        assert!(ex(&[]).extract("").is_empty());
        let inv = ex(&[]).extract("addUtilities({ '.ok-one': {}, '.broken");
        assert!(inv.classes.contains(".ok-one"));
        assert!(inv.classes.contains(".broken"));
        assert!(ex(&[]).extract("'unterminated").classes.is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let e = ex(&["glass-", "orb-"]);
        assert_eq!(e.extract(SRC), e.extract(SRC));
    }

    #[test]
    fn duplicates_collapse() {
        let inv = ex(&[]).extract("'.a-x' \".a-x\" `.a-x`");
        assert_eq!(inv.classes.len(), 1);
    }

    #[test]
    fn normalize_and_validate() {
        assert_eq!(normalize_class("foo-bar"), ".foo-bar");
        assert_eq!(normalize_class(" .foo "), ".foo");
        assert!(is_valid_class(".a_b-c1"));
        assert!(!is_valid_class(".1abc"));
        assert!(!is_valid_class(".a.b"));
    }

    #[test]
    fn missing_source_is_recorded_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = Package {
            id: "ghost".into(),
            name: "ghost".into(),
            version: "1.0.0".parse().unwrap(),
            description: String::new(),
            dir: dir.path().to_path_buf(),
            source: dir.path().join("index.js"),
        };
        let out = extract_package(&pkg, &ExtractCfg::default());
        assert!(out.inventory.is_empty());
        assert!(out.error.unwrap().contains("index.js"));
    }
}
