use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::flatten::CollisionPolicy;
use crate::core::segment::AliasRule;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
    pub verbose: bool,  // global --verbose
}

#[derive(Parser)]
#[command(name = "fsp")]
#[command(
    about = "Flatten a source tree into annotated files for an LLM, then split generated replies back into the tree"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Debug-level logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy source files into one flat directory, one annotated file each
    Flatten(FlattenArgs),

    /// Split generated blobs into segments and write them into the target tree
    Distribute(DistributeArgs),

    /// Print a file with its comments stripped
    Strip(StripArgs),

    /// List the annotated segments found in a generated blob
    Segments(SegmentsArgs),

    /// Show the files under every folder with one of the given names
    Tree(TreeArgs),

    /// Initialize a flatsplit.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct FlattenArgs {
    /// Project root to walk
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Output directory (default from config: flatten)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Base directory for annotation paths (default: ROOT)
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Only flatten files matching these root-relative globs
    #[arg(long)]
    pub include: Vec<String>,

    /// Additional glob patterns to ignore
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Read source paths from a file, one per line
    #[arg(long, conflicts_with = "dir")]
    pub from_list: Option<PathBuf>,

    /// Flatten every directory with this name found under ROOT
    #[arg(long)]
    pub dir: Option<String>,

    /// What to do when two sources share an output name
    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionPolicy>,

    /// Copy file bodies verbatim instead of stripping comments
    #[arg(long)]
    pub keep_comments: bool,

    /// Emit the batch report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with an error if any file failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct DistributeArgs {
    /// Directory (or single file) holding generated blobs (default from config: generated)
    #[arg(short, long)]
    pub generated: Option<PathBuf>,

    /// Root the segment paths are written under (default from config: backend)
    #[arg(short = 'b', long)]
    pub target: Option<PathBuf>,

    /// Additional glob patterns to ignore inside the generated directory
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Alias rewrite FROM=TO, repeatable; replaces the configured aliases
    #[arg(long, value_parser = crate::core::distribute::parse_alias)]
    pub alias: Vec<AliasRule>,

    /// Emit the batch report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with an error if any file failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct StripArgs {
    /// File to strip
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct SegmentsArgs {
    /// Generated blob to inspect
    pub file: PathBuf,

    /// Emit the segment list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Folder names to look for
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Root directory to search
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Additional glob patterns to ignore
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Maximum depth to display below each match
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
