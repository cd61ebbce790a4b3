use crate::output;
use anyhow::Context;
use clap::Subcommand;
use ripp_core::config::{RippConfig, WarnLevel};
use ripp_core::evidence;
use std::path::Path;

#[derive(Subcommand)]
pub enum EvidenceSubcommand {
    /// Scan the tree and write the evidence pack
    Build,

    /// Show the evidence index summary
    Show,
}

pub fn run(root: &Path, subcommand: EvidenceSubcommand, json: bool) -> anyhow::Result<()> {
    match subcommand {
        EvidenceSubcommand::Build => build(root, json),
        EvidenceSubcommand::Show => show(root, json),
    }
}

/// Surface config problems before a scan; errors are fatal, warnings print.
fn check_config(cfg: &RippConfig) -> anyhow::Result<()> {
    let mut fatal = false;
    for w in cfg.validate() {
        match w.level {
            WarnLevel::Error => {
                fatal = true;
                eprintln!("config error: {}", w.message);
            }
            WarnLevel::Warning => eprintln!("config warning: {}", w.message),
        }
    }
    if fatal {
        anyhow::bail!("configuration is invalid, fix .ripp/config.yaml");
    }
    Ok(())
}

fn build(root: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = RippConfig::load(root).context("loading .ripp/config.yaml")?;
    check_config(&cfg)?;

    let (pack, path) = evidence::write_evidence_pack(root, &cfg.evidence)?;
    let hash = pack.content_hash()?;

    if json {
        output::print_json(&serde_json::json!({
            "pack": path,
            "content_hash": hash,
            "stats": pack.stats,
            "counts": {
                "dependencies": pack.evidence.dependencies.len(),
                "routes": pack.evidence.routes.len(),
                "schemas": pack.evidence.schemas.len(),
                "auth": pack.evidence.auth.len(),
                "workflows": pack.evidence.workflows.len(),
            },
        }))?;
    } else {
        println!("Evidence pack written: {}", path.display());
        println!("Content hash: {hash}");
        output::print_table(
            &["category", "items"],
            vec![
                vec![
                    "dependencies".to_string(),
                    pack.evidence.dependencies.len().to_string(),
                ],
                vec!["routes".to_string(), pack.evidence.routes.len().to_string()],
                vec![
                    "schemas".to_string(),
                    pack.evidence.schemas.len().to_string(),
                ],
                vec!["auth".to_string(), pack.evidence.auth.len().to_string()],
                vec![
                    "workflows".to_string(),
                    pack.evidence.workflows.len().to_string(),
                ],
            ],
        );
        println!(
            "\nScanned {} files ({} included, {} excluded)",
            pack.stats.total_files, pack.stats.included_files, pack.stats.excluded_files
        );
        if cfg.evidence.redact_secrets {
            println!("note: secret redaction is best effort; review the pack before sharing");
        }
    }
    Ok(())
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let index = evidence::load_evidence_index(root)?;
    if json {
        output::print_json(&index)?;
    } else {
        println!("Evidence pack: {}", index.pack_file);
        println!("Created:       {}", index.created.to_rfc3339());
        println!("Content hash:  {}", index.content_hash);
        println!(
            "Files:         {} total, {} included, {} excluded",
            index.stats.total_files, index.stats.included_files, index.stats.excluded_files
        );
    }
    Ok(())
}
