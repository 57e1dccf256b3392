//! Error types shared by every pipeline stage.
//!
//! Package-scoped variants are caught at the per-package loop and turned into
//! `PackageFailure` records; the rest abort the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read or write `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest not found at `{}`", .0.display())]
    ManifestMissing(PathBuf),

    #[error("manifest `{}` is not valid JSON: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest is invalid: {0}")]
    ManifestInvalid(String),

    #[error("invalid version `{0}` (expected MAJOR.MINOR.PATCH)")]
    InvalidVersion(String),

    #[error("`{}` is not a valid package.json: {reason}", .path.display())]
    PackageJson { path: PathBuf, reason: String },

    #[error("unknown package `{0}`")]
    UnknownPackage(String),

    #[error("import `{import}` not found (imported by `{}`)", .from.display())]
    ImportNotFound { import: String, from: PathBuf },

    #[error("circular import: {}", .chain.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    CircularImport { chain: Vec<PathBuf> },

    #[error("bad packages pattern `{pattern}`: {reason}")]
    Glob { pattern: String, reason: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// One-line reason used in per-package failure entries.
    pub fn reason(&self) -> String {
        match self {
            Error::Io { source, .. } => format!("{} ({})", self, source),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_import_lists_chain() {
        let e = Error::CircularImport {
            chain: vec!["a.css".into(), "b.css".into(), "a.css".into()],
        };
        assert_eq!(e.to_string(), "circular import: a.css -> b.css -> a.css");
    }

    #[test]
    fn io_reason_includes_source() {
        let e = Error::io(
            "x/index.js",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let r = e.reason();
        assert!(r.contains("x/index.js"));
        assert!(r.contains("gone"));
    }
}
