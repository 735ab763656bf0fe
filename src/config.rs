//! Configuration management for the page editor.
//!
//! Handles:
//! - Command-line argument parsing
//! - Optional `.webpages.toml` project file
//! - Keyword set locations for the highlighter

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::document::Language;
use crate::highlight::{Highlighter, KeywordFile, KeywordRegistry, KeywordSetDef};
use crate::session::{SessionOptions, DEFAULT_AUTOSAVE_DELAY};

/// Project file looked up in the working directory
pub const PROJECT_FILE: &str = ".webpages.toml";

/// Command-line arguments for the page editor
#[derive(Debug, Parser)]
#[command(name = "webpages")]
#[command(about = "Edit and highlight web pages and assets")]
#[command(version)]
pub struct Args {
    /// Storage root holding `pages/` and `assets/`
    #[arg(long, help = "Directory holding pages/ and assets/")]
    pub root: Option<PathBuf>,

    /// Quiet period before an autosave fires
    #[arg(long, help = "Autosave delay in milliseconds")]
    pub autosave_delay_ms: Option<u64>,

    /// Extra keyword file for the highlighter
    #[arg(long, help = "TOML file with extra highlighter keywords")]
    pub keywords: Option<PathBuf>,

    /// Project file to use instead of ./.webpages.toml
    #[arg(long, help = "Project configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List stored pages
    List {
        #[arg(long, help = "Print the listing as JSON")]
        json: bool,
    },
    /// Print a stored page as highlighted HTML
    Highlight {
        path: String,
        #[arg(long, help = "Override the language detected from the path")]
        language: Option<Language>,
    },
    /// Create a page from a template
    New {
        path: String,
        #[arg(long, default_value = "html", help = "Template: html, css or js")]
        template: Language,
    },
    /// Replace a page's content with stdin
    Write { path: String },
    /// Delete a page
    Rm { path: String },
    /// Manage binary assets
    #[command(subcommand)]
    Assets(AssetCommand),
}

#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    List,
    Upload {
        file: PathBuf,
        #[arg(long, help = "Stored name (defaults to the file name)")]
        name: Option<String>,
    },
    Rm { path: String },
}

/// Settings read from the project file
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub root: Option<PathBuf>,
    pub autosave_delay_ms: Option<u64>,
    pub keywords: Option<PathBuf>,
    /// Inline keyword sets, same layout as a keyword file
    pub languages: Vec<KeywordSetDef>,
}

impl ProjectConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid project file {}", path.display()))
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub autosave_delay: Duration,
    /// Keyword files merged in order over the built-in sets
    pub keyword_files: Vec<PathBuf>,
    pub keyword_sets: Vec<KeywordSetDef>,
    pub log_level: String,
}

impl Config {
    /// Create configuration from parsed arguments, picking up the
    /// project file when present. Command-line values win.
    pub fn from_args(args: &Args) -> Result<Self> {
        let project = match &args.config {
            Some(path) => ProjectConfig::from_file(path)?,
            None => {
                let default_path = Path::new(PROJECT_FILE);
                if default_path.exists() {
                    ProjectConfig::from_file(default_path)?
                } else {
                    ProjectConfig::default()
                }
            }
        };

        Ok(Self::merge(args, project))
    }

    fn merge(args: &Args, project: ProjectConfig) -> Self {
        let root = args
            .root
            .clone()
            .or(project.root)
            .unwrap_or_else(default_root);

        let autosave_delay = args
            .autosave_delay_ms
            .or(project.autosave_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_AUTOSAVE_DELAY);

        let mut keyword_files = Vec::new();

        // User-global keyword file
        if let Some(config_dir) = dirs::config_dir() {
            let user_file = config_dir.join("webpages").join("keywords.toml");
            if user_file.exists() {
                keyword_files.push(user_file);
            }
        }
        if let Some(path) = project.keywords {
            keyword_files.push(path);
        }
        if let Some(path) = args.keywords.clone() {
            keyword_files.push(path);
        }

        Config {
            root,
            autosave_delay,
            keyword_files,
            keyword_sets: project.languages,
            log_level: args.log_level.clone(),
        }
    }

    /// Built-in keyword sets extended by every configured source
    pub fn keyword_registry(&self) -> Result<KeywordRegistry> {
        let mut registry = KeywordRegistry::with_defaults();
        for path in &self.keyword_files {
            registry.load_file(path)?;
        }
        registry.merge(KeywordFile {
            languages: self.keyword_sets.clone(),
        });
        Ok(registry)
    }

    pub fn session_options(&self) -> Result<SessionOptions> {
        Ok(SessionOptions {
            autosave_delay: self.autosave_delay,
            highlighter: Highlighter::new(self.keyword_registry()?),
        })
    }
}

fn default_root() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("webpages"))
        .unwrap_or_else(|| PathBuf::from("webpages"))
}
