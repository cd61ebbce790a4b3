use crate::output;
use anyhow::Context;
use ripp_agent::{infer_with_retry, HeuristicAdapter, InferOptions, RetryPolicy};
use ripp_core::{checklist, config::RippConfig, evidence, io, paths};
use std::path::Path;

pub fn run(
    root: &Path,
    level: Option<u8>,
    provider: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = RippConfig::load(root)?;
    let pack = evidence::load_evidence_pack(root)?;

    let target_level = level.unwrap_or(cfg.discovery.target_level);
    anyhow::ensure!(
        (1..=3).contains(&target_level),
        "target level must be 1, 2, or 3 (got {target_level})"
    );

    let provider = provider.unwrap_or(&cfg.discovery.provider);
    if provider != "heuristic" {
        tracing::warn!(
            "provider '{provider}' is not available in this build, falling back to heuristic"
        );
    }

    let adapter = HeuristicAdapter;
    let opts = InferOptions { target_level };
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let set = runtime
        .block_on(infer_with_retry(
            &adapter,
            &pack,
            &opts,
            &RetryPolicy::default(),
        ))
        .context("candidate inference failed")?;

    // Contract check before anything is written. A set that violates it is
    // discarded wholesale.
    set.validate()
        .context("adapter emitted an invalid candidate set")?;

    set.save(&paths::candidates_path(root))?;
    let text = checklist::render_checklist(&set);
    io::atomic_write(&paths::checklist_path(root), text.as_bytes())?;

    if json {
        output::print_json(&serde_json::json!({
            "candidates": set.candidates.len(),
            "candidates_file": paths::CANDIDATES_FILE,
            "checklist": paths::CHECKLIST_FILE,
            "provider": set.generated_by.provider,
            "target_level": target_level,
        }))?;
    } else if set.candidates.is_empty() {
        println!("No candidates inferred; the evidence pack may be empty.");
        println!("Checklist written: {}", paths::CHECKLIST_FILE);
    } else {
        println!(
            "Inferred {} candidate(s) at target level {target_level}",
            set.candidates.len()
        );
        println!("Checklist written: {}", paths::CHECKLIST_FILE);
        println!("\nReview it, check the blocks you accept, then run 'ripp build <id> --from-checklist'.");
    }
    Ok(())
}
