//! Milestone commands

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use super::output::Output;
use crate::domain::{parse_date, Milestone, Resolution};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum MilestoneCommands {
    /// Add or replace a milestone
    Set {
        /// Deal ID or name
        deal: String,

        /// Milestone label
        label: String,

        /// Absolute date
        #[arg(long, conflicts_with_all = ["offset", "from"])]
        date: Option<String>,

        /// Signed day offset from --from
        #[arg(long, requires = "from", allow_negative_numbers = true)]
        offset: Option<i64>,

        /// Milestone label or anchor name the offset counts from
        #[arg(long, requires = "offset")]
        from: Option<String>,

        /// Display position (defaults to the end of the timeline)
        #[arg(long, allow_negative_numbers = true)]
        order: Option<i32>,
    },

    /// Remove a milestone
    Remove {
        /// Deal ID or name
        deal: String,

        /// Milestone label
        label: String,
    },
}

pub fn run(cmd: MilestoneCommands, output: &Output) -> Result<()> {
    match cmd {
        MilestoneCommands::Set {
            deal,
            label,
            date,
            offset,
            from,
            order,
        } => set_milestone(output, &deal, &label, date.as_deref(), offset.zip(from), order),
        MilestoneCommands::Remove { deal, label } => remove_milestone(output, &deal, &label),
    }
}

fn set_milestone(
    output: &Output,
    query: &str,
    label: &str,
    date: Option<&str>,
    offset: Option<(i64, String)>,
    order: Option<i32>,
) -> Result<()> {
    let label = label.trim();

    let milestone = match (date, offset) {
        (Some(raw), None) => Milestone::absolute(label, parse_date(raw)?),
        (None, Some((days, reference))) => Milestone::relative(label, days, reference.trim()),
        _ => anyhow::bail!("Provide either --date or --offset with --from"),
    };

    let project = Project::open_current()?;
    let mut deal = project.find_deal(query)?;

    // Keep the existing position when replacing
    let sort_order = order
        .or_else(|| deal.milestone(label).map(|m| m.sort_order))
        .unwrap_or_else(|| deal.next_sort_order());
    let milestone = milestone.with_sort_order(sort_order);
    milestone.validate()?;

    let replaced = deal.upsert_milestone(milestone).is_some();
    output.verbose_ctx(
        "milestone",
        &format!("{} '{}' on {} at order {}", if replaced { "Replaced" } else { "Added" }, label, deal.id, sort_order),
    );

    project.deal_store().update(&deal)?;

    let report = deal.resolve(&project.config().resolver());
    let resolution = report
        .get(label)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Milestone '{}' missing after update", label))?;

    if output.is_json() {
        output.data(&json!({
            "id": deal.id.to_string(),
            "label": label,
            "replaced": replaced,
            "sort_order": sort_order,
            "resolution": resolution,
        }));
        return Ok(());
    }

    let verb = if replaced { "Updated" } else { "Added" };
    match resolution {
        Resolution::Resolved { date } => output.success(&format!(
            "{} {} on {}: {}",
            verb,
            label,
            deal.id,
            project.config().format_date(date)
        )),
        Resolution::Unresolved { reason, via } => {
            output.success(&format!("{} {} on {}", verb, label, deal.id));
            let via = via.map(|v| format!(" (via {})", v)).unwrap_or_default();
            output.warn(&format!("{} is unresolved: {}{}", label, reason.message(), via));
        }
    }

    Ok(())
}

fn remove_milestone(output: &Output, query: &str, label: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut deal = project.find_deal(query)?;

    let dependents = deal.dependents_of(label);
    let removed = deal.remove_milestone(label);
    if removed.is_empty() {
        anyhow::bail!("Deal {} has no milestone '{}'", deal.id, label.trim());
    }

    project.deal_store().update(&deal)?;

    if output.is_json() {
        output.data(&json!({
            "id": deal.id.to_string(),
            "removed": removed.len(),
            "dependents": dependents,
        }));
        return Ok(());
    }

    output.success(&format!("Removed {} from {}", removed[0].label, deal.id));
    if !dependents.is_empty() {
        output.warn(&format!(
            "{} milestone(s) were counted from it and may no longer resolve: {}",
            dependents.len(),
            dependents.join(", ")
        ));
    }

    Ok(())
}
