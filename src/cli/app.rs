//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{deal, milestone, resolve};
use crate::domain::parse_date;
use crate::storage::{Config, GlobalConfig, Project};

#[derive(Parser)]
#[command(name = "dealdates")]
#[command(author, version, about = "Milestone date resolution for real estate deals")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new dealdates project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage deals and their anchor dates
    #[command(subcommand)]
    Deal(deal::DealCommands),

    /// Manage milestones on a deal
    #[command(subcommand)]
    Milestone(milestone::MilestoneCommands),

    /// Resolve an extraction file without storing it
    Resolve {
        /// JSON or YAML file with anchors and milestones
        file: PathBuf,

        /// Anchor date as name=date (repeatable, overrides the file)
        #[arg(long = "anchor", value_name = "NAME=DATE", value_parser = parse_anchor_arg)]
        anchors: Vec<(String, NaiveDate)>,

        /// Exit with an error if any milestone is unresolved
        #[arg(long)]
        strict: bool,
    },
}

/// Parses a `name=date` pair
pub(crate) fn parse_anchor_arg(raw: &str) -> Result<(String, NaiveDate), String> {
    let (name, date) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=DATE, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("anchor name is empty in '{}'", raw));
    }

    let date = parse_date(date).map_err(|e| e.to_string())?;
    Ok((name.to_string(), date))
}

/// Picks the output format from the global config, falling back to text
/// when the config cannot be read
fn default_format(global: Result<GlobalConfig>) -> (OutputFormat, Option<String>) {
    match global {
        Ok(global) => (global.default_format.into(), None),
        Err(e) => (OutputFormat::Text, Some(format!("{:#}", e))),
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let (format, config_problem) = match cli.format {
        Some(format) => (format, None),
        None => default_format(Config::load_global()),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("dealdates starting");
    if let Some(problem) = config_problem {
        output.verbose_ctx("config", &format!("Ignoring global config, using text output: {}", problem));
    }

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .dealdates directory at: {}", project.project_dir().display()),
            );
            output.success(&format!("Initialized dealdates project at {}", project.root().display()));
        }

        Commands::Deal(cmd) => deal::run(cmd, &output)?,
        Commands::Milestone(cmd) => milestone::run(cmd, &output)?,

        Commands::Resolve { file, anchors, strict } => {
            output.verbose_ctx(
                "resolve",
                &format!("Resolving {} with {} anchor override(s)", file.display(), anchors.len()),
            );
            resolve::run(&output, &file, anchors, strict)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
