//! Output rendering for check, extract, sync, and build commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-item fields and a top-level summary. Human output truncates long
//! class lists; JSON always carries the full lists.

use crate::build::BuildSummary;
use crate::pipeline::{CheckOutcome, ExtractOutcome};
use crate::sync::SyncOutcome;
use crate::utils::{info_prefix, rel_display, truncate_list, DISPLAY_LIMIT};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && crate::utils::colors_enabled()
}

fn print_json(v: &JsonVal) {
    println!(
        "{}",
        serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
    );
}

fn summary_line(text: String, color: bool) {
    if color {
        println!("{}", text.bold());
    } else {
        println!("{}", text);
    }
}

fn print_sync_actions(sync: &SyncOutcome, color: bool) {
    let label = if sync.wrote {
        "🔄 synced:"
    } else {
        "🔄 out of date:"
    };
    for a in &sync.actions {
        if color {
            println!("{} {} {} -> {}", label.green().bold(), a.package, a.from, a.to);
        } else {
            println!("{} {} {} -> {}", label, a.package, a.from, a.to);
        }
    }
}

/// Print the verification report.
pub fn print_check(res: &CheckOutcome, output: &str) {
    if output == "json" {
        print_json(&compose_check_json(res));
        return;
    }
    let color = use_colors(output);
    let report = &res.report;
    print_sync_actions(&res.sync, color);

    for p in &report.packages {
        let line = format!(
            "{:<20} extracted={} defined={} common={} missing={} new={} vars={} keyframes={}",
            p.package, p.extracted, p.defined, p.common, p.missing, p.new, p.variables, p.keyframes
        );
        if color {
            println!("{} {}", "◆".blue(), line);
        } else {
            println!("◆ {}", line);
        }
    }

    if !report.critical_issues.is_empty() {
        if color {
            println!("\n{}", "Critical issues".red().bold());
        } else {
            println!("\nCritical issues");
        }
        for is in &report.critical_issues {
            let list = truncate_list(&is.classes, DISPLAY_LIMIT);
            if color {
                println!(
                    "{} {} {} ❲missing critical❳ — {}",
                    "✖".red(),
                    "⟦critical⟧".red().bold(),
                    is.package.clone().bold(),
                    list
                );
            } else {
                println!("✖ ⟦critical⟧ {} ❲missing critical❳ — {}", is.package, list);
            }
        }
    }

    if !report.warnings.is_empty() || !report.failures.is_empty() {
        if color {
            println!("\n{}", "Warnings".yellow().bold());
        } else {
            println!("\nWarnings");
        }
    }
    for w in &report.warnings {
        let list = truncate_list(&w.items, DISPLAY_LIMIT);
        if color {
            println!(
                "{} {} {} ❲{}❳ — {}",
                "▲".yellow(),
                "⟦warn⟧".yellow().bold(),
                w.package.clone().bold(),
                w.kind.label(),
                list
            );
        } else {
            println!("▲ ⟦warn⟧ {} ❲{}❳ — {}", w.package, w.kind.label(), list);
        }
    }
    for f in &report.failures {
        if color {
            println!(
                "{} {} {} — {}",
                "▲".yellow(),
                "⟦failed⟧".yellow().bold(),
                f.package.clone().bold(),
                f.reason
            );
        } else {
            println!("▲ ⟦failed⟧ {} — {}", f.package, f.reason);
        }
    }

    summary_line(
        format!(
            "— Summary — packages={} critical={} warnings={} failures={}",
            report.summary.packages,
            report.summary.critical,
            report.summary.warnings,
            report.summary.failures
        ),
        color,
    );
}

/// Print extracted inventories.
pub fn print_extract(res: &ExtractOutcome, output: &str) {
    if output == "json" {
        print_json(&compose_extract_json(res));
        return;
    }
    let color = use_colors(output);
    for e in &res.packages {
        if color {
            println!("{}", e.package.clone().bold());
        } else {
            println!("{}", e.package);
        }
        let inv = &e.inventory;
        for (label, set) in [
            ("classes", &inv.classes),
            ("variables", &inv.variables),
            ("keyframes", &inv.keyframe_names),
        ] {
            let items: Vec<String> = set.iter().cloned().collect();
            println!("  {} ({}): {}", label, items.len(), truncate_list(&items, DISPLAY_LIMIT));
        }
        if let Some(err) = &e.error {
            if color {
                println!("  {} {}", "⟦failed⟧".yellow().bold(), err);
            } else {
                println!("  ⟦failed⟧ {}", err);
            }
        }
    }
    for f in &res.failures {
        if color {
            println!("{} {} — {}", "⟦failed⟧".yellow().bold(), f.package, f.reason);
        } else {
            println!("⟦failed⟧ {} — {}", f.package, f.reason);
        }
    }
}

/// Print sync actions summarizing rewrites.
pub fn print_sync(res: &SyncOutcome, output: &str) {
    if output == "json" {
        print_json(&compose_sync_json(res));
        return;
    }
    let color = use_colors(output);
    if res.actions.is_empty() {
        if color {
            println!("{}", "manifest versions up to date".bright_black());
        } else {
            println!("manifest versions up to date");
        }
        return;
    }
    print_sync_actions(res, color);
    if !res.wrote {
        println!("{} run `stylekit sync` to write these changes", info_prefix());
    }
}

/// Print build results, listing failed packages with their reason.
pub fn print_build(res: &BuildSummary, output: &str, root: &Path) {
    if output == "json" {
        print_json(&compose_build_json(res));
        return;
    }
    let color = use_colors(output);
    for b in &res.built {
        let files = format!(
            "{}, {}",
            rel_display(&b.framework, root),
            rel_display(&b.plain, root)
        );
        if color {
            println!("{} {} -> {}", "📦 built:".green().bold(), b.package.clone().bold(), files);
        } else {
            println!("📦 built: {} -> {}", b.package, files);
        }
    }
    for f in &res.failed {
        if color {
            println!("{} {} — {}", "✖ failed:".red().bold(), f.package.clone().bold(), f.reason);
        } else {
            println!("✖ failed: {} — {}", f.package, f.reason);
        }
    }
    summary_line(
        format!(
            "— Summary — built={} failed={}",
            res.built.len(),
            res.failed.len()
        ),
        color,
    );
}

/// Compose check JSON object (pure) for testing purposes.
pub fn compose_check_json(res: &CheckOutcome) -> JsonVal {
    let mut report = serde_json::to_value(&res.report).unwrap_or(JsonVal::Null);
    if let JsonVal::Object(map) = &mut report {
        map.insert("exitCode".into(), json!(res.report.exit_code()));
        map.insert("sync".into(), compose_sync_json(&res.sync));
    }
    report
}

/// Compose extract JSON object (pure).
pub fn compose_extract_json(res: &ExtractOutcome) -> JsonVal {
    let items = serde_json::to_value(&res.packages).unwrap_or(JsonVal::Null);
    json!({
        "results": items,
        "failures": res.failures,
        "summary": {
            "packages": res.packages.len(),
            "classes": res.packages.iter().map(|e| e.inventory.classes.len()).sum::<usize>(),
            "failed": res.failures.len() + res.packages.iter().filter(|e| e.error.is_some()).count(),
        }
    })
}

/// Compose sync JSON object (pure).
pub fn compose_sync_json(res: &SyncOutcome) -> JsonVal {
    json!({
        "results": res.actions,
        "summary": {
            "changed": res.actions.len(),
            "wrote": res.wrote,
            "lastUpdated": res.last_updated,
        }
    })
}

/// Compose build JSON object (pure).
pub fn compose_build_json(res: &BuildSummary) -> JsonVal {
    json!({
        "results": res.built,
        "failed": res.failed,
        "summary": {
            "built": res.built.len(),
            "failed": res.failed.len(),
        }
    })
}
