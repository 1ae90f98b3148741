//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, DealStore};
use crate::domain::{Deal, DealId};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a dealdates project. Run 'dealdates init' first.")]
    NotInProject,

    #[error("Deal not found: {0}")]
    DealNotFound(String),

    #[error("'{0}' matches {1} deals; use the deal ID instead")]
    AmbiguousDeal(String, usize),
}

const DEFAULT_CONFIG: &str = r#"# dealdates configuration

# Anchor names deals are expected to supply. A milestone offset from one of
# these is reported as a missing anchor until the deal sets its date;
# anything else that is not a milestone label is an unknown reference.
known_anchors = ["escrow_open", "effective_date", "closing_date"]

# Display format for resolved dates (strftime syntax)
date_format = "%Y-%m-%d"
"#;

const DEFAULT_GITIGNORE: &str = r#"# Ignore interrupted writes
*.tmp
"#;

/// A dealdates project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(".dealdates");

        if !project_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(".dealdates");

        fs::create_dir_all(&project_dir).with_context(|| {
            format!(
                "Failed to create .dealdates directory: {}",
                project_dir.display()
            )
        })?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = project_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, DEFAULT_GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .dealdates directory path
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(".dealdates")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the deal store
    pub fn deal_store(&self) -> DealStore {
        DealStore::for_project(&self.root)
    }

    /// Finds a deal by ID or by case-insensitive name
    pub fn find_deal(&self, query: &str) -> Result<Deal> {
        let query = query.trim();
        let deals = self.deal_store().read_all()?;

        if let Ok(id) = query.parse::<DealId>() {
            if let Some(deal) = deals.get(&id) {
                return Ok(deal.clone());
            }
        }

        let mut matches: Vec<_> = deals
            .into_values()
            .filter(|d| d.name.trim().eq_ignore_ascii_case(query))
            .collect();

        match matches.len() {
            0 => Err(ProjectError::DealNotFound(query.to_string()).into()),
            1 => Ok(matches.remove(0)),
            n => Err(ProjectError::AmbiguousDeal(query.to_string(), n).into()),
        }
    }
}
