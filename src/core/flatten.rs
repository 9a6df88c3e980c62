//! Flatten a nested source tree into one directory.
//!
//! Every selected file is written to `<out>/<basename>` as
//! `// <path relative to base>\n\n<stripped content>`. Reading and
//! stripping run in parallel; naming and writing follow the sorted
//! traversal order so collision outcomes are reproducible.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexSet;
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cli::{AppContext, FlattenArgs};
use crate::core::report::{BatchReport, FileError, progress_bar};
use crate::core::strip::strip;
use crate::infra::config::load_config;
use crate::infra::io::{expand_path, read_text_lossy, write_overwrite};
use crate::infra::walk::FileWalker;

/// Header path used when a source cannot be expressed relative to the base.
pub const UNKNOWN_PATH: &str = "<unknown path>";

/// What to do when two sources share a basename in the output directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Keep the existing output and skip the newcomer
    #[default]
    SkipExisting,
    /// Insert `_N` before the extension until the name is free
    RenameWithSuffix,
}

#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub out_dir: PathBuf,
    /// Annotation paths are relative to this directory
    pub base: PathBuf,
    pub collision: CollisionPolicy,
    pub strip_comments: bool,
    pub dry_run: bool,
}

/// Hands out output paths in traversal order.
///
/// A name counts as taken if it exists on disk or was handed out earlier in
/// this run, so dry runs and real runs agree.
pub struct NameAllocator {
    out_dir: PathBuf,
    policy: CollisionPolicy,
    claimed: HashSet<PathBuf>,
}

impl NameAllocator {
    pub fn new(out_dir: &Path, policy: CollisionPolicy) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            policy,
            claimed: HashSet::new(),
        }
    }

    fn taken(&self, candidate: &Path) -> bool {
        self.claimed.contains(candidate) || candidate.exists()
    }

    /// Claim an output path for `file_name`, or `None` when the policy says skip.
    pub fn allocate(&mut self, file_name: &str) -> Option<PathBuf> {
        let direct = self.out_dir.join(file_name);

        let chosen = if !self.taken(&direct) {
            Some(direct)
        } else {
            match self.policy {
                CollisionPolicy::SkipExisting => None,
                CollisionPolicy::RenameWithSuffix => (1..)
                    .map(|n| self.out_dir.join(suffixed_name(file_name, n)))
                    .find(|candidate| !self.taken(candidate)),
            }
        };

        if let Some(path) = &chosen {
            self.claimed.insert(path.clone());
        }
        chosen
    }
}

/// `user.test.ts` + 2 → `user_2.test.ts`; dotfiles keep their leading dot.
pub fn suffixed_name(file_name: &str, n: usize) -> String {
    let split = file_name
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '.')
        .map(|(i, _)| i);

    match split {
        Some(i) => format!("{}_{}{}", &file_name[..i], n, &file_name[i..]),
        None => format!("{file_name}_{n}"),
    }
}

/// Absolute form of `path` with `.` dropped and `..` folded into its
/// parent. Purely lexical; symlinks are not resolved.
fn normalize_lexical(path: &Path) -> Option<PathBuf> {
    let abs = std::path::absolute(path).ok()?;

    let mut out = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

/// Relative path from `base` to `path`, with `..` steps when `path` lies
/// outside `base`. Both sides are normalized first. `None` when they do
/// not share a root (e.g. different drives).
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path = normalize_lexical(path)?;
    let base = normalize_lexical(base)?;

    if path.components().next() != base.components().next() {
        return None;
    }

    pathdiff::diff_paths(&path, &base)
}

/// The `// <path>` header line plus its separating blank line.
pub fn annotation_header(source: &Path, base: &Path) -> String {
    let rel = relative_to(source, base)
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_else(|| UNKNOWN_PATH.to_string());

    format!("// {rel}\n\n")
}

/// Read, optionally strip, and prefix one source file.
fn render(source: &Path, opts: &FlattenOptions) -> Result<String, FileError> {
    let text = read_text_lossy(source).map_err(|e| FileError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;

    let body = if opts.strip_comments { strip(&text) } else { text };
    Ok(format!("{}{}", annotation_header(source, &opts.base), body))
}

/// Files rendered in memory at once; writes for one chunk finish before the
/// next chunk is read.
const RENDER_CHUNK: usize = 256;

/// Flatten `sources` into `opts.out_dir`. Per-file failures land in the
/// report; nothing here aborts the batch.
#[instrument(skip_all, fields(files = sources.len(), out = %opts.out_dir.display()))]
pub fn flatten_files(
    sources: &[PathBuf],
    opts: &FlattenOptions,
    progress: &ProgressBar,
) -> BatchReport {
    flatten_in_chunks(sources, opts, progress, RENDER_CHUNK)
}

fn flatten_in_chunks(
    sources: &[PathBuf],
    opts: &FlattenOptions,
    progress: &ProgressBar,
    chunk_size: usize,
) -> BatchReport {
    let mut report = BatchReport::default();
    let mut names = NameAllocator::new(&opts.out_dir, opts.collision);

    for chunk in sources.chunks(chunk_size.max(1)) {
        let rendered: Vec<(&PathBuf, Result<String, FileError>)> = chunk
            .par_iter()
            .map(|src| {
                let out = render(src, opts);
                progress.inc(1);
                (src, out)
            })
            .collect();

        for (src, result) in rendered {
            write_rendered(src, result, opts, &mut names, &mut report);
        }
    }

    progress.finish_with_message("Flatten complete");
    report
}

/// Name and write one rendered source, recording the outcome.
fn write_rendered(
    src: &Path,
    result: Result<String, FileError>,
    opts: &FlattenOptions,
    names: &mut NameAllocator,
    report: &mut BatchReport,
) {
    report.processed += 1;

    let content = match result {
        Ok(content) => content,
        Err(e) => {
            report.record_failure(e);
            return;
        }
    };

    let file_name = match src.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => {
            report.record_failure(FileError::Missing {
                path: src.to_path_buf(),
            });
            return;
        }
    };

    let Some(dest) = names.allocate(&file_name) else {
        warn!(
            "skipping {}: {} already exists in {}",
            src.display(),
            file_name,
            opts.out_dir.display()
        );
        report.record_skip();
        return;
    };

    if !opts.dry_run {
        if let Err(e) = write_overwrite(&dest, &content) {
            report.record_failure(FileError::Write { path: dest, source: e });
            return;
        }
    }

    debug!(source = %src.display(), dest = %dest.display(), "flattened");
    report.record_write(dest);
}

/// Parse a list file: one path per non-blank line, absolute or relative to
/// `root`. Returns (existing files, missing paths).
pub fn read_list(list: &Path, root: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let text = read_text_lossy(list)
        .with_context(|| format!("Failed to read list file {}", list.display()))?;

    let mut found = Vec::new();
    let mut missing = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let candidate = Path::new(line);
        let full = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        };

        if full.is_file() {
            found.push(full);
        } else {
            missing.push(full);
        }
    }

    Ok((found, missing))
}

pub fn run(args: FlattenArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;

    let root = expand_path(&args.root);
    let out_dir = expand_path(
        args.out
            .as_deref()
            .unwrap_or(config.flatten.output_dir.as_path()),
    );
    let base = args
        .base
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(|| root.clone());

    let mut ignore_patterns = config.ignore_patterns.clone();
    ignore_patterns.extend(args.ignore.iter().cloned());

    let include = if args.include.is_empty() {
        config.flatten.include.clone()
    } else {
        args.include.clone()
    };

    let walker = FileWalker::new(&ignore_patterns)?
        .with_include(&include)?
        .with_respect_gitignore(config.flatten.respect_gitignore);

    let mut missing = Vec::new();
    let mut sources: Vec<PathBuf> = if let Some(list) = &args.from_list {
        let (found, absent) = read_list(&expand_path(list), &root)?;
        missing = absent;
        found
    } else if let Some(name) = &args.dir {
        let dirs = walker.find_dirs_named(&root, std::slice::from_ref(name));
        if dirs.is_empty() {
            if !ctx.quiet {
                println!(
                    "{} No directory named '{}' found in {}",
                    "✗".red(),
                    name,
                    root.display()
                );
            }
            return Ok(());
        }

        // Nested matches would list the same file twice
        let unique: IndexSet<PathBuf> = dirs
            .iter()
            .flat_map(|dir| walker.walk_files_in(&root, dir))
            .collect();
        unique.into_iter().collect()
    } else {
        if !root.is_dir() {
            anyhow::bail!("Source root {} is not a directory", root.display());
        }
        walker.walk_files(&root)
    };

    // Never re-flatten our own output
    if let Ok(out_abs) = std::path::absolute(&out_dir) {
        sources.retain(|src| {
            std::path::absolute(src)
                .map(|abs| !abs.starts_with(&out_abs))
                .unwrap_or(true)
        });
    }

    if !ctx.dry_run {
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;
    }

    let opts = FlattenOptions {
        out_dir,
        base,
        collision: args.on_collision.unwrap_or(config.flatten.collision),
        strip_comments: config.flatten.strip_comments && !args.keep_comments,
        dry_run: ctx.dry_run,
    };
    info!(
        sources = sources.len(),
        collision = ?opts.collision,
        strip = opts.strip_comments,
        "flatten"
    );

    let progress = progress_bar(sources.len(), ctx);
    let mut report = flatten_files(&sources, &opts, &progress);

    for path in missing {
        report.processed += 1;
        report.record_failure(FileError::Missing { path });
    }

    if ctx.dry_run && !ctx.quiet && !args.json {
        println!("{}", "DRY RUN: Would write:".yellow());
        for dest in &report.outputs {
            println!("  {}", dest.display());
        }
    }

    report.finish("flatten", ctx, args.json, args.strict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(out: &Path, base: &Path, collision: CollisionPolicy) -> FlattenOptions {
        FlattenOptions {
            out_dir: out.to_path_buf(),
            base: base.to_path_buf(),
            collision,
            strip_comments: true,
            dry_run: false,
        }
    }

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn suffix_goes_before_the_extension_chain() {
        assert_eq!(suffixed_name("user.ts", 1), "user_1.ts");
        assert_eq!(suffixed_name("user.test.ts", 2), "user_2.test.ts");
        assert_eq!(suffixed_name("Makefile", 3), "Makefile_3");
        assert_eq!(suffixed_name(".env", 1), ".env_1");
        assert_eq!(suffixed_name(".eslintrc.js", 1), ".eslintrc_1.js");
    }

    #[test]
    fn skip_existing_refuses_second_claim() {
        let tmp = TempDir::new().unwrap();
        let mut names = NameAllocator::new(tmp.path(), CollisionPolicy::SkipExisting);

        assert_eq!(names.allocate("index.ts"), Some(tmp.path().join("index.ts")));
        assert_eq!(names.allocate("index.ts"), None);
    }

    #[test]
    fn skip_existing_sees_files_from_earlier_runs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.ts"), "old").unwrap();

        let mut names = NameAllocator::new(tmp.path(), CollisionPolicy::SkipExisting);
        assert_eq!(names.allocate("index.ts"), None);
    }

    #[test]
    fn rename_with_suffix_counts_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.ts"), "old").unwrap();

        let mut names = NameAllocator::new(tmp.path(), CollisionPolicy::RenameWithSuffix);
        assert_eq!(names.allocate("index.ts"), Some(tmp.path().join("index_1.ts")));
        assert_eq!(names.allocate("index.ts"), Some(tmp.path().join("index_2.ts")));
    }

    #[test]
    fn header_uses_forward_slashes_and_parent_steps() {
        let base = Path::new("/repo/backend");
        assert_eq!(
            annotation_header(Path::new("/repo/backend/src/models/user.ts"), base),
            "// src/models/user.ts\n\n"
        );
        assert_eq!(
            annotation_header(Path::new("/repo/docs/guide.md"), base),
            "// ../docs/guide.md\n\n"
        );
    }

    #[test]
    fn header_normalizes_dot_segments_before_diffing() {
        assert_eq!(
            annotation_header(Path::new("/r/proj/src/x.ts"), Path::new("/r/proj/..")),
            "// proj/src/x.ts\n\n"
        );
        assert_eq!(
            annotation_header(Path::new("/r/proj/./lib/../src/x.ts"), Path::new("/r/./proj")),
            "// src/x.ts\n\n"
        );
        assert_eq!(
            relative_to(Path::new("/r/a/b.ts"), Path::new("/r/a/b.ts")),
            Some(PathBuf::new())
        );
    }

    #[test]
    fn flattens_with_header_and_stripped_body() {
        let tmp = TempDir::new().unwrap();
        let src_root = tmp.path().join("backend");
        let out = tmp.path().join("flat");
        fs::create_dir_all(&out).unwrap();

        let a = write(
            &src_root,
            "src/models/user.ts",
            "/** User */\nexport class User {} // model\n\n",
        );

        let opts = options(&out, &src_root, CollisionPolicy::SkipExisting);
        let report = flatten_files(&[a], &opts, &ProgressBar::hidden());

        assert!(report.is_clean());
        assert_eq!(report.written, 1);
        assert_eq!(
            fs::read_to_string(out.join("user.ts")).unwrap(),
            "// src/models/user.ts\n\nexport class User {}"
        );
    }

    #[test]
    fn keep_comments_writes_body_verbatim() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("flat");
        let a = write(tmp.path(), "lib/a.ts", "// note\nconst a = 1;\n");

        let mut opts = options(&out, tmp.path(), CollisionPolicy::SkipExisting);
        opts.strip_comments = false;
        flatten_files(&[a], &opts, &ProgressBar::hidden());

        assert_eq!(
            fs::read_to_string(out.join("a.ts")).unwrap(),
            "// lib/a.ts\n\n// note\nconst a = 1;\n"
        );
    }

    #[test]
    fn duplicate_basenames_follow_policy() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("flat");
        let a = write(tmp.path(), "a/index.ts", "first");
        let b = write(tmp.path(), "b/index.ts", "second");
        let sources = vec![a, b];

        let skip = options(&out, tmp.path(), CollisionPolicy::SkipExisting);
        let report = flatten_files(&sources, &skip, &ProgressBar::hidden());
        assert_eq!((report.written, report.skipped), (1, 1));
        assert!(
            fs::read_to_string(out.join("index.ts"))
                .unwrap()
                .ends_with("first")
        );

        let rename = options(&out, tmp.path(), CollisionPolicy::RenameWithSuffix);
        let report = flatten_files(&sources, &rename, &ProgressBar::hidden());
        assert_eq!(report.written, 2);
        assert!(
            fs::read_to_string(out.join("index_1.ts"))
                .unwrap()
                .starts_with("// a/index.ts")
        );
        assert!(
            fs::read_to_string(out.join("index_2.ts"))
                .unwrap()
                .starts_with("// b/index.ts")
        );
    }

    #[test]
    fn small_chunks_keep_traversal_order_for_naming() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("flat");
        let sources: Vec<PathBuf> = (0..5)
            .map(|i| write(tmp.path(), &format!("d{i}/mod.ts"), &format!("m{i}")))
            .collect();

        let opts = options(&out, tmp.path(), CollisionPolicy::RenameWithSuffix);
        let report = flatten_in_chunks(&sources, &opts, &ProgressBar::hidden(), 2);

        assert_eq!(report.processed, 5);
        assert_eq!(
            report.outputs,
            vec![
                out.join("mod.ts"),
                out.join("mod_1.ts"),
                out.join("mod_2.ts"),
                out.join("mod_3.ts"),
                out.join("mod_4.ts"),
            ]
        );
        assert!(
            fs::read_to_string(out.join("mod_4.ts"))
                .unwrap()
                .starts_with("// d4/mod.ts")
        );
    }

    #[test]
    fn unreadable_source_does_not_stop_the_batch() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("flat");
        let good = write(tmp.path(), "ok.ts", "ok();");
        let gone = tmp.path().join("gone.ts");

        let opts = options(&out, tmp.path(), CollisionPolicy::SkipExisting);
        let report = flatten_files(&[gone, good], &opts, &ProgressBar::hidden());

        assert_eq!(report.processed, 2);
        assert_eq!(report.written, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, "read");
        assert!(out.join("ok.ts").is_file());
    }

    #[test]
    fn dry_run_plans_without_writing() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("flat");
        let a = write(tmp.path(), "x/a.ts", "a");
        let b = write(tmp.path(), "y/a.ts", "b");

        let mut opts = options(&out, tmp.path(), CollisionPolicy::RenameWithSuffix);
        opts.dry_run = true;
        let report = flatten_files(&[a, b], &opts, &ProgressBar::hidden());

        assert_eq!(report.outputs, vec![out.join("a.ts"), out.join("a_1.ts")]);
        assert!(!out.exists());
    }

    #[test]
    fn list_file_splits_found_and_missing() -> Result<()> {
        let tmp = TempDir::new()?;
        let present = write(tmp.path(), "src/a.ts", "a");
        let list = tmp.path().join("to-flatten.txt");
        fs::write(
            &list,
            format!("  src/a.ts  \n\nsrc/missing.ts\n{}\n", present.display()),
        )?;

        let (found, missing) = read_list(&list, tmp.path())?;
        assert_eq!(found, vec![tmp.path().join("src/a.ts"), present]);
        assert_eq!(missing, vec![tmp.path().join("src/missing.ts")]);
        Ok(())
    }
}
