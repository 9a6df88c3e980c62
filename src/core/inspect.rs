//! `fsp strip` and `fsp segments`: look at what the pipeline would do to a
//! single file without writing anything.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::cli::{AppContext, SegmentsArgs, StripArgs};
use crate::core::segment::{Segment, SegmentExtractor};
use crate::core::strip::strip;
use crate::infra::config::load_config;
use crate::infra::io::{expand_path, read_text_lossy};

pub fn strip_run(args: StripArgs, _ctx: &AppContext) -> Result<()> {
    let path = expand_path(&args.file);
    let text = read_text_lossy(&path).with_context(|| format!("reading {}", path.display()))?;

    println!("{}", strip(&text));
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct SegmentRow {
    path: String,
    annotation: String,
    lines: usize,
    bytes: usize,
}

impl From<&Segment> for SegmentRow {
    fn from(segment: &Segment) -> Self {
        Self {
            path: segment.path.clone(),
            annotation: segment.raw.clone(),
            lines: segment.line_count(),
            bytes: segment.content.len(),
        }
    }
}

pub fn segments_run(args: SegmentsArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;
    let path = expand_path(&args.file);
    let text = read_text_lossy(&path).with_context(|| format!("reading {}", path.display()))?;

    let extractor = SegmentExtractor::new(config.distribute.aliases);
    let rows: Vec<SegmentRow> = extractor.extract(&text).iter().map(SegmentRow::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        if !ctx.quiet {
            println!("No annotated segments in {}", path.display());
        }
        return Ok(());
    }

    let count = rows.len();
    println!("{}", Table::new(rows));
    if !ctx.quiet {
        let summary = format!("{count} segment(s)");
        if ctx.no_color {
            println!("{summary}");
        } else {
            println!("{}", summary.green());
        }
    }
    Ok(())
}
