//! Distribute generated blobs back into a source tree.
//!
//! Each blob is split into segments by [`SegmentExtractor`]; every segment
//! fully overwrites `<target>/<segment path>`. Extraction runs in parallel,
//! writes run in sorted blob order so the last writer for a path is
//! deterministic.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::cli::{AppContext, DistributeArgs};
use crate::core::report::{BatchReport, FileError, progress_bar};
use crate::core::segment::{AliasRule, Segment, SegmentExtractor};
use crate::infra::config::load_config;
use crate::infra::io::{expand_path, read_text_lossy, write_overwrite};
use crate::infra::walk::FileWalker;

#[derive(Debug, Clone)]
pub struct DistributeOptions {
    pub target_root: PathBuf,
    pub dry_run: bool,
}

/// Join a segment path onto `root`, refusing absolute paths and `..`.
pub fn resolve_destination(root: &Path, segment_path: &str) -> Option<PathBuf> {
    let rel = Path::new(segment_path);

    let contained = rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return None;
    }

    Some(root.join(rel))
}

/// Parse a `FROM=TO` alias flag.
pub fn parse_alias(raw: &str) -> Result<AliasRule, String> {
    match raw.split_once('=') {
        Some((from, to)) if !from.is_empty() => Ok(AliasRule::new(from, to)),
        _ => Err(format!("expected FROM=TO, got '{raw}'")),
    }
}

/// Extract every blob and write its segments under `opts.target_root`.
#[instrument(skip_all, fields(blobs = blobs.len(), target = %opts.target_root.display()))]
pub fn distribute_files(
    blobs: &[PathBuf],
    extractor: &SegmentExtractor,
    opts: &DistributeOptions,
    progress: &ProgressBar,
) -> BatchReport {
    let extracted: Vec<(&PathBuf, Result<Vec<Segment>, FileError>)> = blobs
        .par_iter()
        .map(|blob| {
            let segments = read_text_lossy(blob)
                .map(|text| extractor.extract(&text))
                .map_err(|e| FileError::Read {
                    path: blob.clone(),
                    source: e,
                });
            progress.inc(1);
            (blob, segments)
        })
        .collect();

    let mut report = BatchReport::default();

    for (blob, result) in extracted {
        report.processed += 1;

        let segments = match result {
            Ok(segments) => segments,
            Err(e) => {
                report.record_failure(e);
                continue;
            }
        };

        if segments.is_empty() {
            debug!("no annotations in {}", blob.display());
            continue;
        }
        info!(blob = %blob.display(), segments = segments.len(), "distributing");

        for segment in segments {
            let Some(dest) = resolve_destination(&opts.target_root, &segment.path) else {
                report.record_failure(FileError::UnsafeDestination {
                    origin: blob.clone(),
                    segment: segment.path,
                });
                continue;
            };

            if !opts.dry_run {
                if let Err(e) = write_overwrite(&dest, &segment.content) {
                    report.record_failure(FileError::Write { path: dest, source: e });
                    continue;
                }
            }

            debug!(dest = %dest.display(), lines = segment.line_count(), "wrote segment");
            report.record_write(dest);
        }
    }

    progress.finish_with_message("Distribute complete");
    report
}

pub fn run(args: DistributeArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;

    let generated = expand_path(
        args.generated
            .as_deref()
            .unwrap_or(config.distribute.generated_dir.as_path()),
    );
    let target = expand_path(
        args.target
            .as_deref()
            .unwrap_or(config.distribute.target_dir.as_path()),
    );

    if !generated.exists() {
        if !ctx.quiet {
            println!("Generated folder not found: {}", generated.display());
        }
        return Ok(());
    }

    let blobs = if generated.is_file() {
        vec![generated.clone()]
    } else {
        FileWalker::new(&args.ignore)?
            .with_respect_gitignore(config.distribute.respect_gitignore)
            .walk_files(&generated)
    };

    let aliases = if args.alias.is_empty() {
        config.distribute.aliases.clone()
    } else {
        args.alias.clone()
    };
    let extractor = SegmentExtractor::new(aliases);

    let opts = DistributeOptions {
        target_root: target,
        dry_run: ctx.dry_run,
    };

    let progress = progress_bar(blobs.len(), ctx);
    let report = distribute_files(&blobs, &extractor, &opts, &progress);

    if ctx.dry_run && !ctx.quiet && !args.json {
        println!("{}", "DRY RUN: Would write:".yellow());
        for dest in &report.outputs {
            println!("  {}", dest.display());
        }
    }

    report.finish("distribute", ctx, args.json, args.strict)
}
