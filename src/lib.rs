//! **flatsplit** - Round-trip a source tree through an LLM
//!
//! `flatten` copies files into one flat, annotated, comment-stripped directory;
//! `distribute` splits generated replies on their annotation lines and writes
//! each segment back under the target tree.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core pipeline - stripping, segment extraction and the two batch directions
pub mod core {
    /// Comment stripper (`/** */` blocks, quote-aware `//`)
    pub mod strip;
    pub use strip::strip;

    /// Annotation grammar and ordered segment extraction
    pub mod segment;
    pub use segment::{AliasRule, Segment, SegmentExtractor};

    /// Per-file errors and the batch report
    pub mod report;
    pub use report::{BatchReport, FileError};

    /// Source tree -> flat annotated directory
    pub mod flatten;
    pub use flatten::{CollisionPolicy, run as flatten_run};

    /// Generated blobs -> target tree
    pub mod distribute;
    pub use distribute::run as distribute_run;

    /// Folder-name search with per-file line counts
    pub mod tree;
    pub use tree::run as tree_run;

    /// Single-file `strip` / `segments` commands
    pub mod inspect;
}

/// Infrastructure - Configuration, I/O, and traversal
pub mod infra {
    /// Configuration management with TOML/YAML/JSON files and env overrides
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Lossy text reads (memory-mapped above 1MB) and overwriting writes
    pub mod io;
    pub use io::{read_text_lossy, write_overwrite};

    /// Line splitting on every line boundary (CRLF, lone CR, separators)
    pub mod lines;

    /// Gitignore-aware directory walking with injected ignore/include globs
    pub mod walk;
    pub use walk::FileWalker;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use crate::core::{distribute_run, flatten_run, tree_run};
pub use crate::infra::{Config, FileWalker, load_config};

// Core types for external consumers
pub use crate::core::{AliasRule, BatchReport, CollisionPolicy, FileError, Segment, SegmentExtractor};
