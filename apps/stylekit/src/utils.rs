//! Supporting helpers: message prefixes, path display, list truncation.

use owo_colors::OwoColorize;
use std::path::Path;

/// Lists longer than this are shortened in human output.
pub const DISPLAY_LIMIT: usize = 10;

pub fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if colors_enabled() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Path relative to `base` when possible, for compact output.
pub fn rel_display(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// Join at most `limit` items, adding a `+N more` suffix for the rest.
pub fn truncate_list(items: &[String], limit: usize) -> String {
    if items.len() <= limit {
        return items.join(", ");
    }
    format!(
        "{} (+{} more)",
        items[..limit].join(", "),
        items.len() - limit
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_lists() {
        let items: Vec<String> = (1..=13).map(|i| format!(".c{}", i)).collect();
        let s = truncate_list(&items, DISPLAY_LIMIT);
        assert!(s.starts_with(".c1, .c2"));
        assert!(s.contains(".c10"));
        assert!(!s.contains(".c11"));
        assert!(s.ends_with("(+3 more)"));
        assert_eq!(truncate_list(&items[..2], DISPLAY_LIMIT), ".c1, .c2");
    }

    #[test]
    fn relative_paths() {
        let base = Path::new("/repo");
        assert_eq!(rel_display(Path::new("/repo/packages/a"), base), "packages/a");
        assert_eq!(rel_display(Path::new("/repo"), base), "/repo");
    }

    #[test]
    fn prefixes_carry_their_label() {
        assert!(error_prefix().contains("error:"));
        assert!(note_prefix().contains("note:"));
        assert!(info_prefix().contains("info:"));
    }
}
