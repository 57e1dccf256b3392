//! Distribution builder.
//!
//! Produces two files per package from its entry stylesheet:
//! - the framework variant: every local `@import` inlined recursively, with a
//!   generated header comment;
//! - the plain variant: the framework variant with framework directives
//!   rewritten to standard CSS.
//!
//! Design notes:
//! - Only local imports (`./x`, `../x`, `/x`, or anything ending in `.css`)
//!   are inlined. Bare specifiers such as `"tailwindcss"` and remote URLs
//!   (`https://...`, `//host/...`) stay in the framework variant and are
//!   stripped from the plain one.
//! - `/x` resolves against the entry stylesheet's directory; every other
//!   local target resolves against the importing file.
//! - Import statements are matched anywhere in the text, so several imports
//!   on one line or an import after a comment are all handled.
//! - The in-progress import chain is tracked; re-entering a file already on
//!   the chain is a `CircularImport` error. Diamond imports are inlined at
//!   each site.
//! - `layer(...)`, `supports(...)` and media suffixes on an inlined import
//!   are preserved by wrapping the inlined text in the matching blocks.
//! - Writes replace whole files, so reruns only differ in the header
//!   timestamp.

use crate::config::{BuildCfg, FallbackCfg};
use crate::error::{Error, Result};
use crate::models::{Package, PackageFailure};
use crate::sync::timestamp;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@import\s+(?:url\(\s*)?["']([^"']+)["']\s*\)?\s*([^;{}]*?)\s*;[ \t]*(\r?\n)?"#,
    )
    .expect("import regex")
});
static UTILITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@utility\s+([A-Za-z0-9_-]+)\s*\{").expect("utility regex"));
static THEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@theme(?:\s+(?:inline|static|reference))*\s*\{").expect("theme regex")
});
static ALPHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--alpha\(\s*(var\(--[A-Za-z0-9_-]+\))\s*/\s*([0-9.]+%?)\s*\)").expect("alpha regex")
});
static ANY_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*@import\b[^;]*;[ \t]*(?:\r?\n)?").expect("import strip regex"));

/// Framework custom properties the plain variant cannot resolve, with the
/// literal defaults substituted for them.
const DEFAULT_FALLBACKS: &[(&str, &str)] = &[
    ("var(--tw-ring-color)", "rgb(59 130 246 / 0.5)"),
    ("var(--tw-ring-offset-color)", "#fff"),
    ("var(--tw-shadow-color)", "rgb(0 0 0 / 0.1)"),
    ("var(--tw-bg-opacity)", "1"),
    ("var(--tw-text-opacity)", "1"),
    ("var(--tw-border-opacity)", "1"),
    ("theme(colors.white)", "#fff"),
    ("theme(colors.black)", "#000"),
];

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub package: String,
    pub framework: PathBuf,
    pub plain: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub built: Vec<BuildResult>,
    pub failed: Vec<PackageFailure>,
}

impl BuildSummary {
    /// Any failed package fails the build.
    pub fn exit_code(&self) -> i32 {
        if self.failed.is_empty() {
            0
        } else {
            1
        }
    }
}

fn is_local(target: &str) -> bool {
    if target.contains("://") || target.starts_with("//") {
        return false;
    }
    target.starts_with("./")
        || target.starts_with("../")
        || target.starts_with('/')
        || target.ends_with(".css")
}

fn resolve(target: &str, importer_dir: &Path, root: &Path) -> PathBuf {
    match target.strip_prefix('/') {
        Some(rel) => root.join(rel),
        None => importer_dir.join(target),
    }
}

fn inline_rec(path: &Path, root: &Path, chain: &mut Vec<PathBuf>) -> Result<String> {
    let src = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for caps in IMPORT.captures_iter(&src) {
        let target = &caps[1];
        if !is_local(target) {
            continue;
        }
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&src[last..whole.start]);
        last = whole.end;

        let resolved = resolve(target, dir, root);
        if !resolved.is_file() {
            return Err(Error::ImportNotFound {
                import: target.to_string(),
                from: path.to_path_buf(),
            });
        }
        let canon = resolved
            .canonicalize()
            .map_err(|e| Error::io(&resolved, e))?;
        if chain.contains(&canon) {
            let mut cycle = chain.clone();
            cycle.push(canon);
            return Err(Error::CircularImport { chain: cycle });
        }
        chain.push(canon.clone());
        let mut body = inline_rec(&canon, root, chain)?;
        chain.pop();

        if !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }
        out.push_str(&wrap_suffix(body, &caps[2]));
        // an import closing the file without a newline leaves none behind
        if caps.get(3).is_none() && last == src.len() && out.ends_with('\n') {
            out.pop();
        }
    }
    out.push_str(&src[last..]);
    Ok(out)
}

/// Split `name(args) rest` into `(args, rest)`, honouring nested parentheses.
fn take_function<'a>(suffix: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let args = suffix.strip_prefix(name)?.strip_prefix('(')?;
    let mut depth = 1usize;
    for (i, ch) in args.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((args[..i].trim(), args[i + 1..].trim()));
                }
            }
            _ => {}
        }
    }
    None
}

/// Keep `layer(name)`, `supports(...)` and media conditions of an inlined
/// import.
fn wrap_suffix(body: String, suffix: &str) -> String {
    let mut rest = suffix.trim();
    if rest.is_empty() {
        return body;
    }
    let mut layer = None;
    if let Some((name, after)) = take_function(rest, "layer") {
        layer = Some(name);
        rest = after;
    } else if let Some(after) = rest.strip_prefix("layer") {
        if after.is_empty() || after.starts_with(char::is_whitespace) {
            layer = Some("");
            rest = after.trim();
        }
    }
    let mut supports = None;
    if let Some((cond, after)) = take_function(rest, "supports") {
        supports = Some(cond);
        rest = after;
    }

    let mut out = body;
    if !rest.is_empty() {
        out = format!("@media {} {{\n{}}}\n", rest, out);
    }
    if let Some(cond) = supports {
        // a bare declaration needs its own parentheses in `@supports`
        let grouped = ["(", "not ", "selector(", "font-"]
            .iter()
            .any(|p| cond.starts_with(p));
        let cond = if grouped {
            cond.to_string()
        } else {
            format!("({})", cond)
        };
        out = format!("@supports {} {{\n{}}}\n", cond, out);
    }
    if let Some(name) = layer {
        out = if name.is_empty() {
            format!("@layer {{\n{}}}\n", out)
        } else {
            format!("@layer {} {{\n{}}}\n", name, out)
        };
    }
    out
}

/// Inline every local `@import` reachable from `entry`.
pub fn inline_imports(entry: &Path) -> Result<String> {
    let canon = entry.canonicalize().map_err(|e| Error::io(entry, e))?;
    let root = canon.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let mut chain = vec![canon.clone()];
    inline_rec(&canon, &root, &mut chain)
}

/// Generated header comment for a package's output files.
pub fn header(pkg: &Package, entry: &str, generated: &str) -> String {
    format!(
        "/*!\n * {} v{}\n * Generated by stylekit on {} from {}. Do not edit.\n */\n",
        pkg.name, pkg.version, generated, entry
    )
}

/// Framework variant: header followed by the inlined content.
pub fn render_framework(pkg: &Package, entry: &str, content: &str, generated: &str) -> String {
    let mut out = header(pkg, entry, generated);
    out.push_str(content);
    out
}

/// Plain variant rewrites, in order: `@utility` to a class selector,
/// `@theme` to `:root`, framework property fallbacks to literals, and
/// removal of any remaining `@import`.
pub fn to_plain(css: &str, extra_fallbacks: &[FallbackCfg]) -> String {
    let mut out = UTILITY.replace_all(css, ".$1 {").into_owned();
    out = THEME.replace_all(&out, ":root {").into_owned();
    out = ALPHA
        .replace_all(&out, "color-mix(in srgb, $1 $2, transparent)")
        .into_owned();
    for (pattern, value) in DEFAULT_FALLBACKS {
        out = out.replace(pattern, value);
    }
    for fb in extra_fallbacks {
        out = out.replace(&fb.pattern, &fb.value);
    }
    ANY_IMPORT.replace_all(&out, "").into_owned()
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

/// Build both variants for one package.
pub fn build_package(pkg: &Package, cfg: &BuildCfg, generated: &str) -> Result<BuildResult> {
    let entry = pkg.dir.join(&cfg.entry);
    if !entry.is_file() {
        return Err(Error::io(
            &entry,
            std::io::Error::new(std::io::ErrorKind::NotFound, "root stylesheet not found"),
        ));
    }
    let content = inline_imports(&entry)?;
    let framework = render_framework(pkg, &cfg.entry, &content, generated);
    let plain = to_plain(&framework, &cfg.fallbacks);

    let framework_path = pkg.dir.join(&cfg.framework_file);
    let plain_path = pkg.dir.join(&cfg.plain_file);
    write_file(&framework_path, &framework)?;
    write_file(&plain_path, &plain)?;
    debug!(package = %pkg.id, bytes = framework.len(), "distribution written");
    Ok(BuildResult {
        package: pkg.id.clone(),
        framework: framework_path,
        plain: plain_path,
        bytes: framework.len(),
    })
}

/// Build every package; a failing package is recorded and the rest continue.
pub fn run_build(packages: &[Package], cfg: &BuildCfg) -> BuildSummary {
    let generated = timestamp();
    let results: Vec<std::result::Result<BuildResult, PackageFailure>> = packages
        .par_iter()
        .map(|p| {
            build_package(p, cfg, &generated).map_err(|e| PackageFailure {
                package: p.id.clone(),
                reason: e.reason(),
            })
        })
        .collect();
    let mut summary = BuildSummary::default();
    for r in results {
        match r {
            Ok(b) => summary.built.push(b),
            Err(f) => summary.failed.push(f),
        }
    }
    summary.built.sort_by(|a, b| a.package.cmp(&b.package));
    summary.failed.sort_by(|a, b| a.package.cmp(&b.package));
    info!(
        built = summary.built.len(),
        failed = summary.failed.len(),
        "build finished"
    );
    summary
}
