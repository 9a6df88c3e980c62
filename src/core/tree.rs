//! Filepath: src/core/tree.rs
//! Folder explorer: find every directory with one of the requested names
//! and print its files as a tree, with per-file line counts as `name:lines`.
//!
//! - Ignore globs (node_modules etc.) prune the search
//! - BTreeMap children for deterministic ordering
//! - Names with no match are listed at the end

use anyhow::Result;
use indexmap::IndexMap;
use owo_colors::OwoColorize;
use ptree::TreeBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::{AppContext, TreeArgs};
use crate::infra::config::load_config;
use crate::infra::io::{count_lines, expand_path};
use crate::infra::walk::FileWalker;

pub fn run(args: TreeArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;
    let root = expand_path(&args.root);

    // Combine config ignore patterns with CLI args
    let mut ignore_patterns = config.ignore_patterns.clone();
    ignore_patterns.extend(args.ignore);

    let walker = FileWalker::new(&ignore_patterns)?;
    let depth = args.depth.or(config.tree.max_depth);

    if ctx.dry_run {
        if !ctx.quiet {
            println!("{}", "DRY RUN: Would search:".yellow());
            println!("  Root: {}", root.display());
            println!("  Folder names: {:?}", args.names);
            println!("  Ignore patterns: {:?}", ignore_patterns);
        }
        return Ok(());
    }

    let groups = find_folders(&root, &args.names, &walker);

    if !ctx.quiet {
        for (dir, tree) in groups.iter().flat_map(|(_, found)| found) {
            let rel = dir.strip_prefix(&root).unwrap_or(dir);
            if ctx.no_color {
                println!("\nIn {}:", rel.display());
            } else {
                println!("\n{} {}:", "In".bold(), rel.display());
            }
            print_tree(tree, depth, ctx.no_color)?;
        }
    }

    let missing: Vec<&str> = groups
        .iter()
        .filter(|(_, found)| found.is_empty())
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        let mark = if ctx.no_color { "✗".to_string() } else { "✗".red().to_string() };
        println!("\n{mark} No folders found with names: {}", missing.join(", "));
    }

    Ok(())
}

#[derive(Debug, Default)]
struct TreeNode {
    /// For files, total line count; None for directories.
    line_count: Option<usize>,
    children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn is_dir(&self) -> bool {
        self.line_count.is_none()
    }

    /// Insert a file at `relative` (components below the tree root).
    fn insert_file(&mut self, relative: &Path, lines: usize) {
        let mut node = self;
        for component in relative.components() {
            let name = component.as_os_str().to_string_lossy().into_owned();
            node = node.children.entry(name).or_default();
        }
        node.line_count = Some(lines);
    }
}

/// For each requested name (in request order), every matching directory and
/// its file tree.
fn find_folders(
    root: &Path,
    names: &[String],
    walker: &FileWalker,
) -> IndexMap<String, Vec<(PathBuf, TreeNode)>> {
    let mut groups: IndexMap<String, Vec<(PathBuf, TreeNode)>> =
        names.iter().map(|n| (n.clone(), Vec::new())).collect();

    for dir in walker.find_dirs_named(root, names) {
        let Some(name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let tree = build_tree_with_counts(&dir, walker);
        if let Some(found) = groups.get_mut(&name) {
            found.push((dir, tree));
        }
    }

    groups
}

/// Build the tree and attach line counts to file leaf nodes.
fn build_tree_with_counts(root: &Path, walker: &FileWalker) -> TreeNode {
    let mut tree = TreeNode::default();

    for file_path in walker.walk_files(root) {
        let lines = match count_lines(&file_path) {
            Ok(n) => n,
            Err(e) => {
                debug!("counting lines for {}: {e}", file_path.display());
                0
            }
        };

        if let Ok(relative_path) = file_path.strip_prefix(root) {
            tree.insert_file(relative_path, lines);
        }
    }

    tree
}

/// Print the tree with formatted labels. Files show `name:lines`.
fn print_tree(tree: &TreeNode, depth: Option<usize>, no_color: bool) -> Result<()> {
    let mut builder = TreeBuilder::new(".".to_string());
    add_children_to_builder(&mut builder, &tree.children, depth, 1, no_color);

    let tree = builder.build();
    ptree::print_tree(&tree)?;

    Ok(())
}

fn add_children_to_builder(
    builder: &mut TreeBuilder,
    children: &BTreeMap<String, TreeNode>,
    max_depth: Option<usize>,
    level: usize,
    no_color: bool,
) {
    if max_depth.is_some_and(|max| level > max) {
        return;
    }

    for (name, child) in children {
        let label = format_node_label(name, child, no_color);
        if child.children.is_empty() {
            builder.add_empty_child(label);
        } else {
            builder.begin_child(label);
            add_children_to_builder(builder, &child.children, max_depth, level + 1, no_color);
            builder.end_child();
        }
    }
}

/// Format node label with colors and, for files, appended `:lines`.
fn format_node_label(name: &str, node: &TreeNode, no_color: bool) -> String {
    if node.is_dir() {
        if no_color {
            format!("{name}/")
        } else {
            format!("{}/", name.blue())
        }
    } else {
        let shown = if no_color {
            name.to_string()
        } else {
            color_by_ext(name)
        };
        format!("{}:{}", shown, node.line_count.unwrap_or(0))
    }
}

fn color_by_ext(name: &str) -> String {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("rs") => name.yellow().to_string(),
        Some("py") => name.green().to_string(),
        Some("js" | "jsx" | "ts" | "tsx") => name.cyan().to_string(),
        Some("go") => name.magenta().to_string(),
        Some("md" | "txt") => name.white().to_string(),
        Some("toml" | "yaml" | "yml" | "json") => name.bright_blue().to_string(),
        _ => name.to_string(),
    }
}
