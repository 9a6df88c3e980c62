//! Filepath: src/infra/walk.rs
//! Traversal collaborator for flatten, distribute and tree.
//! - Ignore sets are injected (from config + CLI), never module constants
//! - Extra ignore globs prune directories early and filter files late
//! - Optional include globs keep only matching files (relative to the walk root)
//! - .gitignore handling can be switched off (generated roots are often ignored)
//! - Deterministic ordering so collision and overwrite outcomes are stable
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::debug;

/// Ignore-aware walker with injected ignore and include globs.
pub struct FileWalker
{
    /// Paths matching these are pruned (dirs) or dropped (files)
    ignore_patterns: GlobSet,

    /// When set, only files matching one of these are returned
    include_patterns: Option<GlobSet>,

    /// Honour .gitignore / .ignore files; default true
    respect_gitignore: bool,

    /// Include hidden (dot) files; default true
    include_hidden: bool,

    /// Maximum recursion depth; default None (unbounded)
    max_depth: Option<usize>,
}

fn build_globset(patterns: &[String]) -> Result<GlobSet>
{
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns
    {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob '{pattern}'"))?);
    }

    Ok(builder.build()?)
}

impl FileWalker
{
    /// Build a walker from an ignore list such as `["**/node_modules", "**/*.pyc"]`.
    pub fn new(ignore_patterns: &[String]) -> Result<Self>
    {
        Ok(Self {
            ignore_patterns: build_globset(ignore_patterns)?,
            include_patterns: None,
            respect_gitignore: true,
            include_hidden: true,
            max_depth: None,
        })
    }

    /// (Optional) Keep only files whose root-relative path matches one of
    /// `patterns`. An empty list keeps everything.
    pub fn with_include(
        mut self,
        patterns: &[String],
    ) -> Result<Self>
    {
        self.include_patterns = if patterns.is_empty()
        {
            None
        }
        else
        {
            Some(build_globset(patterns)?)
        };
        Ok(self)
    }

    /// (Optional) Honour or ignore .gitignore/.ignore files.
    pub fn with_respect_gitignore(
        mut self,
        respect: bool,
    ) -> Self
    {
        self.respect_gitignore = respect;
        self
    }

    /// (Optional) Include or exclude hidden files (dotfiles).
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// (Optional) Limit recursion depth (`None` = unbounded).
    pub fn with_max_depth(
        mut self,
        depth: Option<usize>,
    ) -> Self
    {
        self.max_depth = depth;
        self
    }

    /// Internal: construct a configured WalkBuilder starting at `start`,
    /// with ignore globs matched relative to `base`.
    fn build_walk(
        &self,
        start: &Path,
        base: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(start);

        // WalkBuilder::hidden(true) *skips* dotfiles
        b.hidden(!self.include_hidden);

        let git = self.respect_gitignore;
        b.ignore(git);
        b.git_ignore(git);
        b.git_global(git);
        b.git_exclude(git);
        b.parents(git);

        b.follow_links(false);
        b.max_depth(self.max_depth);

        // Early directory pruning, matched on the root-relative path
        let extra = self
            .ignore_patterns
            .clone();
        let base = base.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            if !is_dir || ent.depth() == 0
            {
                return true;
            }

            let rel = ent
                .path()
                .strip_prefix(&base)
                .unwrap_or(ent.path());
            !extra.is_match(rel)
        });

        b
    }

    /// Traverse files under `root`, respecting ignore rules and globs.
    /// Returns a **sorted** list of file paths.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<PathBuf>
    {
        let root = root.as_ref();
        self.walk_files_in(root, root)
    }

    /// Traverse files under `start` only, matching ignore and include
    /// globs against paths relative to `root` (an ancestor of `start`).
    /// Sorted.
    pub fn walk_files_in(
        &self,
        root: &Path,
        start: &Path,
    ) -> Vec<PathBuf>
    {
        let mut out: Vec<PathBuf> = self
            .build_walk(start, root)
            .build()
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(e) =>
                {
                    debug!("walk error under {}: {e}", start.display());
                    None
                }
            })
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .map(|entry| entry.into_path())
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root)
                    .unwrap_or(abs);

                if self
                    .ignore_patterns
                    .is_match(rel)
                {
                    return false;
                }

                self.include_patterns
                    .as_ref()
                    .is_none_or(|inc| inc.is_match(rel))
            })
            .collect();

        out.sort();
        out
    }

    /// Directories below `root` (the root itself excluded) whose name is one
    /// of `names`. Ignored directories are never entered. Sorted.
    pub fn find_dirs_named<P: AsRef<Path>>(
        &self,
        root: P,
        names: &[String],
    ) -> Vec<PathBuf>
    {
        let root = root.as_ref();
        let mut out: Vec<PathBuf> = self
            .build_walk(root, root)
            .build()
            .filter_map(|res| res.ok())
            .filter(|entry| entry.depth() > 0)
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_dir())
            })
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| names.iter().any(|want| want == n))
            })
            .map(|entry| entry.into_path())
            .collect();

        out.sort();
        out
    }
}
