use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::flatten::CollisionPolicy;
use crate::core::segment::{AliasRule, default_aliases};

/// Config file names probed in priority order; the first one found wins.
pub const CONFIG_FILES: [&str; 4] = [
    "flatsplit.toml",
    "flatsplit.yaml",
    "flatsplit.json",
    ".flatsplit.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Globs pruned from every traversal (in addition to .gitignore)
    pub ignore_patterns: Vec<String>,

    /// Flatten direction defaults
    pub flatten: FlattenConfig,

    /// Distribute direction defaults
    pub distribute: DistributeConfig,

    /// Tree listing defaults
    pub tree: TreeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig
{
    pub output_dir: PathBuf,
    /// Root-relative globs; empty takes every file
    pub include: Vec<String>,
    pub collision: CollisionPolicy,
    pub strip_comments: bool,
    pub respect_gitignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributeConfig
{
    pub generated_dir: PathBuf,
    pub target_dir: PathBuf,
    pub respect_gitignore: bool,
    /// Leading-alias rewrites, first match wins
    pub aliases: Vec<AliasRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig
{
    pub max_depth: Option<usize>,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: vec![
                "**/node_modules".to_string(),
                "**/.git".to_string(),
                "**/target".to_string(),
                "**/dist".to_string(),
                "**/build".to_string(),
                "**/__pycache__".to_string(),
                "**/*.pyc".to_string(),
                "**/.DS_Store".to_string(),
                "**/Thumbs.db".to_string(),
            ],
            flatten: FlattenConfig::default(),
            distribute: DistributeConfig::default(),
            tree: TreeConfig::default(),
        }
    }
}

impl Default for FlattenConfig
{
    fn default() -> Self
    {
        Self {
            output_dir: PathBuf::from("flatten"),
            include: Vec::new(),
            collision: CollisionPolicy::SkipExisting,
            strip_comments: true,
            respect_gitignore: true,
        }
    }
}

impl Default for DistributeConfig
{
    fn default() -> Self
    {
        Self {
            generated_dir: PathBuf::from("generated"),
            target_dir: PathBuf::from("backend"),
            respect_gitignore: false,
            aliases: default_aliases(),
        }
    }
}

/// Load configuration from the working directory.
pub fn load_config() -> Result<Config>
{
    load_config_in(Path::new("."))
}

/// Load configuration from `dir`: first config file found, then
/// `FLATSPLIT__SECTION__KEY` environment overrides. Missing keys keep
/// their defaults.
pub fn load_config_in(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in &CONFIG_FILES
    {
        let candidate = dir.join(name);
        if candidate.is_file()
        {
            builder = builder.add_source(config::File::from(candidate.as_path()));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FLATSPLIT")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would create {}:\n{toml_string}", config_path.display());
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
