//! Best-effort batch bookkeeping.
//!
//! Per-file problems are captured as [`FileError`] values and folded into a
//! [`BatchReport`]; a failing file never aborts the batch. The report is
//! printed once at the end, either as text or as JSON.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::warn;

use crate::cli::AppContext;

/// Failure of a single file within a batch.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file does not exist: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("segment path '{segment}' from {} escapes the target root", .origin.display())]
    UnsafeDestination { origin: PathBuf, segment: String },
}

impl FileError {
    /// Short machine-friendly kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            FileError::Read { .. } => "read",
            FileError::Write { .. } => "write",
            FileError::Missing { .. } => "missing",
            FileError::UnsafeDestination { .. } => "unsafe-destination",
        }
    }

    /// The file the failure is attributed to.
    pub fn path(&self) -> &Path {
        match self {
            FileError::Read { path, .. }
            | FileError::Write { path, .. }
            | FileError::Missing { path } => path,
            FileError::UnsafeDestination { origin, .. } => origin,
        }
    }
}

/// Serializable record of one failure.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct Failure {
    pub kind: &'static str,
    pub path: String,
    pub message: String,
}

impl From<&FileError> for Failure {
    fn from(err: &FileError) -> Self {
        Self {
            kind: err.kind(),
            path: err.path().display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// Input files looked at
    pub processed: usize,
    /// Files written (or that would be written on a dry run)
    pub written: usize,
    /// Outputs skipped by the collision policy
    pub skipped: usize,
    /// Destinations in write order
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    pub fn record_write(&mut self, dest: PathBuf) {
        self.written += 1;
        self.outputs.push(dest);
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Log and keep the failure; the batch goes on.
    pub fn record_failure(&mut self, err: FileError) {
        warn!(kind = err.kind(), "{err}");
        self.failures.push(Failure::from(&err));
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Print the summary and enforce `--strict`.
    pub fn finish(&self, label: &str, ctx: &AppContext, json: bool, strict: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(self)?);
        } else if !ctx.quiet {
            self.print_summary(label, ctx);
        }

        if strict && !self.is_clean() {
            anyhow::bail!("{label}: {} file(s) failed", self.failures.len());
        }
        Ok(())
    }

    fn print_summary(&self, label: &str, ctx: &AppContext) {
        let verb = if ctx.dry_run { "would write" } else { "wrote" };
        let line = format!(
            "{label}: processed {}, {verb} {}, skipped {}, failed {}",
            self.processed,
            self.written,
            self.skipped,
            self.failures.len()
        );

        if ctx.no_color {
            println!("{line}");
        } else if self.is_clean() {
            println!("{} {}", "✓".green(), line);
        } else {
            println!("{} {}", "!".yellow(), line);
        }

        for detail in self.detail_lines(ctx) {
            println!("{detail}");
        }

        if !self.failures.is_empty() {
            eprintln!("{}", Table::new(self.failures.clone()));
        }
    }

    /// With `--verbose`, one line per destination in write order.
    fn detail_lines(&self, ctx: &AppContext) -> Vec<String> {
        if !ctx.verbose {
            return Vec::new();
        }

        self.outputs
            .iter()
            .map(|dest| format!("  -> {}", dest.display()))
            .collect()
    }
}

/// Progress bar for a batch of `len` files; hidden when quiet.
pub fn progress_bar(len: usize, ctx: &AppContext) -> ProgressBar {
    if ctx.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
