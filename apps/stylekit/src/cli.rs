//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stylekit",
    version,
    about = "Verify and build CSS utility plugin packages",
    long_about = "Stylekit — extract class inventories from plugin sources, verify them against the expected-classes manifest, keep manifest versions in sync, and build distribution stylesheets.\n\nConfiguration precedence: CLI > stylekit.toml > defaults.",
    after_help = "Examples:\n  stylekit check\n  stylekit check glass --output json\n  stylekit extract orbs\n  stylekit sync --check\n  stylekit build",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, short, global = true, help = "Enable debug logging on stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Default)]
/// Options shared by every pipeline command.
pub struct Common {
    #[arg(help = "Restrict the run to one package")]
    pub package: Option<String>,
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Path to the expected-classes manifest")]
    pub manifest: Option<String>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current stylekit version.")]
    Version,
    /// Verify extracted classes against the manifest
    #[command(
        about = "Verify classes against the manifest",
        long_about = "Sync manifest versions, extract classes from plugin sources, compare them with the manifest, and report. Exits 1 when a critical class is missing.",
        after_help = "Examples:\n  stylekit check\n  stylekit check glass --no-sync"
    )]
    Check {
        #[command(flatten)]
        common: Common,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not rewrite the manifest during the run")]
        no_sync: bool,
    },
    /// Print extracted class/variable/keyframe inventories
    #[command(
        about = "Print extracted inventories",
        long_about = "Scan plugin sources textually and list the classes, custom properties, and keyframe names found."
    )]
    Extract {
        #[command(flatten)]
        common: Common,
    },
    /// Sync manifest versions with package versions
    #[command(
        about = "Sync manifest versions",
        long_about = "Overwrite `auto` or stale manifest versions with the versions declared by each package.json. The manifest is rewritten only when something changed.",
        after_help = "Examples:\n  stylekit sync\n  stylekit sync --check"
    )]
    Sync {
        #[command(flatten)]
        common: Common,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Preview changes without writing")]
        dry_run: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero if the manifest is out of date (implies --dry-run)")]
        check: bool,
    },
    /// Build distribution stylesheets
    #[command(
        about = "Build distribution stylesheets",
        long_about = "Inline each package's entry stylesheet into a framework variant and derive a plain CSS variant. Failing packages are reported and skipped."
    )]
    Build {
        #[command(flatten)]
        common: Common,
    },
}
