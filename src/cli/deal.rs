//! Deal commands

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;

use super::app::parse_anchor_arg;
use super::output::Output;
use super::timeline;
use crate::domain::{parse_date, Deal};
use crate::storage::{read_batch, Project};

#[derive(Subcommand)]
pub enum DealCommands {
    /// Create a new deal
    New {
        /// Deal name (usually the property address)
        name: String,

        /// Anchor date as name=date (repeatable)
        #[arg(long = "anchor", value_name = "NAME=DATE", value_parser = parse_anchor_arg)]
        anchors: Vec<(String, NaiveDate)>,
    },

    /// List all deals
    List,

    /// Show a deal's resolved timeline
    Show {
        /// Deal ID or name
        deal: String,

        /// Exit with an error if any milestone is unresolved
        #[arg(long)]
        strict: bool,
    },

    /// Set or clear an anchor date
    Anchor {
        /// Deal ID or name
        deal: String,

        /// Anchor name (e.g. escrow_open)
        name: String,

        /// Anchor date
        date: Option<String>,

        /// Remove the anchor instead of setting it
        #[arg(long, conflicts_with = "date")]
        clear: bool,
    },

    /// Import extracted anchors and milestones from a JSON or YAML file
    Import {
        /// Deal ID or name
        deal: String,

        /// Extraction file
        file: PathBuf,

        /// Replace existing milestones instead of appending
        #[arg(long)]
        replace: bool,
    },

    /// Delete a deal
    Remove {
        /// Deal ID or name
        deal: String,
    },
}

pub fn run(cmd: DealCommands, output: &Output) -> Result<()> {
    match cmd {
        DealCommands::New { name, anchors } => new_deal(output, &name, anchors),
        DealCommands::List => list_deals(output),
        DealCommands::Show { deal, strict } => show_deal(output, &deal, strict),
        DealCommands::Anchor {
            deal,
            name,
            date,
            clear,
        } => set_anchor(output, &deal, &name, date.as_deref(), clear),
        DealCommands::Import {
            deal,
            file,
            replace,
        } => import(output, &deal, &file, replace),
        DealCommands::Remove { deal } => remove_deal(output, &deal),
    }
}

fn new_deal(output: &Output, name: &str, anchors: Vec<(String, NaiveDate)>) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Deal name cannot be empty");
    }

    let project = Project::open_current()?;

    let mut deal = Deal::new(name);
    for (anchor, date) in anchors {
        deal.set_anchor(&anchor, date);
    }

    project.deal_store().append(&deal)?;
    output.verbose_ctx("deal", &format!("Appended {} to {}", deal.id, project.deal_store().path().display()));

    if output.is_json() {
        output.data(&json!({
            "id": deal.id.to_string(),
            "name": deal.name,
            "anchors": deal.anchors,
        }));
    } else {
        output.success(&format!("Created deal {}: {}", deal.id, deal.name));
    }

    Ok(())
}

fn list_deals(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let deals = project.deal_store().read_all()?;
    let resolver = project.config().resolver();

    if output.is_json() {
        let items: Vec<_> = deals
            .values()
            .map(|d| {
                let report = d.resolve(&resolver);
                json!({
                    "id": d.id.to_string(),
                    "name": d.name,
                    "milestones": report.len(),
                    "unresolved": report.unresolved().count(),
                })
            })
            .collect();
        output.data(&items);
    } else if deals.is_empty() {
        println!("No deals found.");
    } else {
        println!("{:<12} {:<12} {:<12} NAME", "ID", "MILESTONES", "UNRESOLVED");
        println!("{}", "-".repeat(60));

        for deal in deals.values() {
            let report = deal.resolve(&resolver);
            println!(
                "{:<12} {:<12} {:<12} {}",
                deal.id.to_string(),
                report.len(),
                report.unresolved().count(),
                deal.name
            );
        }
    }

    Ok(())
}

fn show_deal(output: &Output, query: &str, strict: bool) -> Result<()> {
    let project = Project::open_current()?;
    let deal = project.find_deal(query)?;

    let report = deal.resolve(&project.config().resolver());
    output.verbose_ctx(
        "resolve",
        &format!(
            "{}: {} milestone(s), {} unresolved",
            deal.id,
            report.len(),
            report.unresolved().count()
        ),
    );

    if !output.is_json() {
        println!("Deal: {} - {}", deal.id, deal.name);
        println!();
    }

    timeline::render(
        output,
        project.config(),
        json!({ "id": deal.id.to_string(), "name": deal.name }),
        &deal.anchors,
        &deal.milestones,
        &report,
    );

    timeline::enforce_strict(strict, &report)
}

fn set_anchor(
    output: &Output,
    query: &str,
    name: &str,
    date: Option<&str>,
    clear: bool,
) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Anchor name cannot be empty");
    }

    let project = Project::open_current()?;
    let mut deal = project.find_deal(query)?;

    let message = if clear {
        match deal.clear_anchor(name) {
            Some(_) => format!("Cleared anchor {} on {}", name.trim(), deal.id),
            None => anyhow::bail!("Deal {} has no anchor '{}'", deal.id, name.trim()),
        }
    } else {
        let raw = date.ok_or_else(|| anyhow::anyhow!("Provide a date or --clear"))?;
        let date = parse_date(raw)?;
        match deal.set_anchor(name, date) {
            Some(previous) if previous != date => format!(
                "Moved anchor {} on {} from {} to {}",
                name.trim(),
                deal.id,
                project.config().format_date(previous),
                project.config().format_date(date)
            ),
            _ => format!(
                "Set anchor {} on {} to {}",
                name.trim(),
                deal.id,
                project.config().format_date(date)
            ),
        }
    };

    project.deal_store().update(&deal)?;
    output.success(&message);

    Ok(())
}

fn import(output: &Output, query: &str, file: &std::path::Path, replace: bool) -> Result<()> {
    let project = Project::open_current()?;
    let mut deal = project.find_deal(query)?;

    let batch = read_batch(file)?;
    output.verbose_ctx(
        "import",
        &format!(
            "Read {} anchor(s) and {} milestone(s) from {}",
            batch.anchors.len(),
            batch.milestones.len(),
            file.display()
        ),
    );

    let first_sort_order = if replace { 0 } else { deal.next_sort_order() };
    let (anchors, milestones) = batch.into_milestones(first_sort_order);
    let imported = milestones.len();

    deal.anchors.merge(&anchors);
    if replace {
        deal.replace_milestones(milestones);
    } else {
        deal.extend_milestones(milestones);
    }

    project.deal_store().update(&deal)?;

    let report = deal.resolve(&project.config().resolver());
    let unresolved = report.unresolved().count();

    if output.is_json() {
        output.data(&json!({
            "id": deal.id.to_string(),
            "imported": imported,
            "anchors": anchors.len(),
            "replaced": replace,
            "unresolved": unresolved,
        }));
    } else {
        output.success(&format!(
            "Imported {} milestone(s) and {} anchor(s) into {}",
            imported,
            anchors.len(),
            deal.id
        ));
        if unresolved > 0 {
            output.warn(&format!(
                "{} milestone(s) unresolved; run 'dealdates deal show {}' for details",
                unresolved, deal.id
            ));
        }
    }

    Ok(())
}

fn remove_deal(output: &Output, query: &str) -> Result<()> {
    let project = Project::open_current()?;
    let deal = project.find_deal(query)?;

    project.deal_store().remove(&deal.id)?;
    output.success(&format!("Removed deal {}: {}", deal.id, deal.name));

    Ok(())
}
