//! Timeline rendering shared by `deal show` and `resolve`

use anyhow::Result;
use serde_json::{json, Value};

use super::output::Output;
use crate::domain::{
    label_key, AnchorSet, Milestone, MilestoneSpec, Resolution, ResolutionReport, ResolvedMilestone,
};
use crate::storage::Config;

/// Describes how a milestone's date is derived, for the text timeline
fn describe(milestone: &Milestone) -> String {
    match milestone.spec() {
        MilestoneSpec::Absolute(_) => "fixed".to_string(),
        MilestoneSpec::Relative { days, reference } => {
            format!("{:+}d from {}", days, reference.trim())
        }
        MilestoneSpec::Invalid(_) => String::new(),
    }
}

/// Milestones paired with their outcomes, in display order
fn rows<'a>(
    milestones: &'a [Milestone],
    report: &'a ResolutionReport,
) -> Vec<(&'a Milestone, &'a ResolvedMilestone)> {
    let mut rows: Vec<_> = milestones.iter().zip(report.entries()).collect();
    rows.sort_by(|(a, _), (b, _)| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| label_key(&a.label).cmp(&label_key(&b.label)))
            .then_with(|| a.label.cmp(&b.label))
    });
    rows
}

/// Builds the JSON form of a timeline
pub fn to_json(anchors: &AnchorSet, report: &ResolutionReport) -> Value {
    let counts: serde_json::Map<String, Value> = report
        .reason_counts()
        .into_iter()
        .map(|(reason, n)| (reason.code().to_string(), json!(n)))
        .collect();

    json!({
        "anchors": anchors,
        "milestones": report.display_order(),
        "complete": report.is_complete(),
        "unresolved": counts,
    })
}

/// Prints anchors and the resolved timeline as text
pub fn print_text(
    config: &Config,
    anchors: &AnchorSet,
    milestones: &[Milestone],
    report: &ResolutionReport,
) {
    if !anchors.is_empty() {
        println!("Anchors:");
        for (name, date) in anchors.iter() {
            println!("  {:<20} {}", name, config.format_date(date));
        }
        println!();
    }

    if milestones.is_empty() {
        println!("No milestones.");
        return;
    }

    println!("{:<12} {:<30} SOURCE", "DATE", "MILESTONE");
    println!("{}", "-".repeat(70));

    for (milestone, entry) in rows(milestones, report) {
        match &entry.resolution {
            Resolution::Resolved { date } => {
                println!(
                    "{:<12} {:<30} {}",
                    config.format_date(*date),
                    entry.label,
                    describe(milestone)
                );
            }
            Resolution::Unresolved { reason, via } => {
                let via = via
                    .as_deref()
                    .map(|v| format!(" (via {})", v))
                    .unwrap_or_default();
                println!(
                    "{:<12} {:<30} {} [{}]{}",
                    "!",
                    entry.label,
                    reason.message(),
                    reason.code(),
                    via
                );
            }
        }
    }

    println!();
    let unresolved = report.unresolved().count();
    if unresolved == 0 {
        println!("All {} milestone(s) resolved.", report.len());
    } else {
        println!(
            "{} resolved, {} unresolved",
            report.len() - unresolved,
            unresolved
        );
    }
}

/// Prints a timeline in the selected format
pub fn render(
    output: &Output,
    config: &Config,
    header: Value,
    anchors: &AnchorSet,
    milestones: &[Milestone],
    report: &ResolutionReport,
) {
    if output.is_json() {
        let mut body = to_json(anchors, report);
        if let (Value::Object(body), Value::Object(header)) = (&mut body, header) {
            body.extend(header);
        }
        output.data(&body);
    } else {
        print_text(config, anchors, milestones, report);
    }
}

/// Fails when `strict` is set and anything is unresolved
pub fn enforce_strict(strict: bool, report: &ResolutionReport) -> Result<()> {
    let unresolved = report.unresolved().count();
    if strict && unresolved > 0 {
        anyhow::bail!("{} milestone(s) could not be resolved", unresolved);
    }
    Ok(())
}
