use crate::output;
use ripp_core::compile::{build_canonical_artifacts, BuildOptions};
use std::path::Path;

pub fn run(
    root: &Path,
    id: &str,
    title: Option<String>,
    from_checklist: bool,
    json: bool,
) -> anyhow::Result<()> {
    let options = BuildOptions {
        packet_id: id.to_string(),
        title,
        from_checklist,
    };
    let out = build_canonical_artifacts(root, &options)?;

    for w in &out.warnings {
        eprintln!("warning: {w}");
    }

    if json {
        output::print_json(&serde_json::json!({
            "packet": out.packet_path,
            "markdown": out.markdown_path,
            "level": out.level,
            "warnings": out.warnings,
        }))?;
    } else {
        println!("Packet written:   {}", out.packet_path.display());
        println!("Markdown written: {}", out.markdown_path.display());
        println!("Level: {}", out.level);
    }
    Ok(())
}
