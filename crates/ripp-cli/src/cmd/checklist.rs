use crate::output;
use anyhow::Context;
use clap::Subcommand;
use ripp_core::checklist::{parse_checklist, render_checklist};
use ripp_core::candidate::CandidateSet;
use ripp_core::config::RippConfig;
use ripp_core::confirm::{validate_confirmed_blocks, ConfirmPolicy, ConfirmedSet};
use ripp_core::{io, paths};
use std::path::Path;

#[derive(Subcommand)]
pub enum ChecklistSubcommand {
    /// Re-render the checklist from the stored candidate set (discards edits)
    Render,

    /// Parse the edited checklist and report what would be accepted
    Parse {
        /// Persist accepted blocks to the confirmed artifact
        #[arg(long)]
        write: bool,
    },
}

pub fn run(root: &Path, subcommand: ChecklistSubcommand, json: bool) -> anyhow::Result<()> {
    match subcommand {
        ChecklistSubcommand::Render => render(root),
        ChecklistSubcommand::Parse { write } => parse(root, write, json),
    }
}

fn render(root: &Path) -> anyhow::Result<()> {
    let candidates_path = paths::candidates_path(root);
    anyhow::ensure!(
        candidates_path.exists(),
        "no candidate set found: run 'ripp discover' first"
    );
    let set = CandidateSet::load(&candidates_path)?;
    let text = render_checklist(&set);
    io::atomic_write(&paths::checklist_path(root), text.as_bytes())?;
    println!("Checklist written: {}", paths::CHECKLIST_FILE);
    Ok(())
}

fn parse(root: &Path, write: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::checklist_path(root);
    anyhow::ensure!(
        path.exists(),
        "checklist not found: run 'ripp discover' first"
    );
    let text = std::fs::read_to_string(&path).context("reading checklist")?;

    let parsed = parse_checklist(&text);
    let policy = ConfirmPolicy {
        min_confidence: RippConfig::load(root)?.discovery.min_confidence,
    };
    let confirmation = validate_confirmed_blocks(parsed.blocks, &policy);

    if json {
        output::print_json(&serde_json::json!({
            "accepted": confirmation.accepted.iter().map(|b| &b.section).collect::<Vec<_>>(),
            "rejected": confirmation.reasons,
            "parse_errors": parsed.errors,
            "parse_warnings": parsed.warnings,
        }))?;
    } else {
        for e in &parsed.errors {
            eprintln!("parse error: {e}");
        }
        for w in &parsed.warnings {
            eprintln!("parse warning: {w}");
        }
        for (section, reasons) in &confirmation.reasons {
            for r in reasons {
                eprintln!("rejected {section}: {r}");
            }
        }
        println!("Accepted {} block(s)", confirmation.accepted.len());
        for b in &confirmation.accepted {
            println!("  - {}", b.section);
        }
    }

    if write {
        anyhow::ensure!(
            !confirmation.accepted.is_empty(),
            "no accepted blocks to write"
        );
        ConfirmedSet::new(confirmation.accepted).save(root)?;
        println!("Confirmed artifact written: {}", paths::CONFIRMED_FILE);
    }
    Ok(())
}
