//! Stylekit core library.
//!
//! This crate exposes programmatic APIs for verifying and building a monorepo
//! of CSS utility plugin packages.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `app`: Command dispatch and exit codes.
//! - `config`: Discovery and effective configuration resolution.
//! - `packages`: Package directory discovery.
//! - `extract`: Textual class/variable/keyframe extraction.
//! - `compare`: Manifest vs. extraction set differences.
//! - `sync`: Manifest version sync.
//! - `report`: Report reducer and exit-code gate.
//! - `lint`: Advisory stylesheet lint.
//! - `build`: Distribution builder (import inlining, plain variant).
//! - `pipeline`: Per-command orchestration.
//! - `models`: Data models for packages, manifest, and reports.
//! - `output`: Human/JSON printers.
//! - `utils`: Supporting helpers.
pub mod app;
pub mod build;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod lint;
pub mod logging;
pub mod models;
pub mod output;
pub mod packages;
pub mod pipeline;
pub mod report;
pub mod sync;
pub mod utils;

pub use error::{Error, Result};
