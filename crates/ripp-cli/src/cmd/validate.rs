use crate::output;
use anyhow::Context;
use ripp_core::validator::{load_schema, validate_packet_file, ValidateOptions};
use ripp_core::paths;
use std::path::{Path, PathBuf};

pub fn run(
    root: &Path,
    files: &[PathBuf],
    min_level: Option<u8>,
    schema_path: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let schema = load_schema(schema_path)?;
    let options = ValidateOptions { min_level };

    let files = if files.is_empty() {
        default_packet_files(root)?
    } else {
        files.to_vec()
    };
    anyhow::ensure!(
        !files.is_empty(),
        "no packet files found under {}",
        paths::PACKETS_DIR
    );

    let mut failed = 0usize;
    let mut reports = Vec::new();
    for file in &files {
        let result = validate_packet_file(file, &schema, &options)
            .with_context(|| format!("validating {}", file.display()))?;
        if !result.valid {
            failed += 1;
        }
        if json {
            reports.push(serde_json::json!({
                "file": file,
                "valid": result.valid,
                "level": result.level,
                "errors": result.errors,
                "warnings": result.warnings,
            }));
        } else {
            let verdict = if result.valid { "ok" } else { "FAIL" };
            let level = result
                .level
                .map(|l| format!("level {l}"))
                .unwrap_or_else(|| "level ?".to_string());
            println!("{verdict}  {}  ({level})", file.display());
            for e in &result.errors {
                println!("    error: {e}");
            }
            for w in &result.warnings {
                println!("    warning: {w}");
            }
        }
    }

    if json {
        output::print_json(&reports)?;
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} packet(s) failed validation", files.len());
    }
    Ok(())
}

/// Every `*.ripp.yaml` under `.ripp/packets/`, sorted for stable output.
fn default_packet_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let dir = root.join(paths::PACKETS_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(paths::PACKET_SUFFIX))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
