use crate::checklist;
use crate::config::RippConfig;
use crate::confirm::{validate_confirmed_blocks, ConfirmPolicy, ConfirmedBlock, ConfirmedSet};
use crate::error::{Result, RippError};
use crate::packet::CanonicalPacket;
use crate::section::SectionKind;
use crate::{io, paths};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Options / output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub packet_id: String,
    /// Defaults to a titlecased form of the packet id.
    pub title: Option<String>,
    /// Re-parse and re-validate `.ripp/checklist.md` instead of reading the
    /// confirmed artifact from an interactive flow.
    pub from_checklist: bool,
}

#[derive(Debug)]
pub struct BuildOutput {
    pub packet_path: PathBuf,
    pub markdown_path: PathBuf,
    pub level: u8,
    /// Non-fatal notes collected along the way: parse warnings, per-section
    /// rejections, duplicate merges.
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Merge accepted blocks into a canonical packet and write both the packet
/// and its human-readable markdown rendering.
///
/// Fails fast with [`RippError::NothingToCompile`] before touching disk when
/// zero blocks are accepted. The two writes are a unit: if the markdown write
/// fails after the packet write succeeded, the build still reports failure.
pub fn build_canonical_artifacts(root: &Path, options: &BuildOptions) -> Result<BuildOutput> {
    paths::validate_packet_id(&options.packet_id)?;
    let config = RippConfig::load(root)?;
    let policy = ConfirmPolicy {
        min_confidence: config.discovery.min_confidence,
    };

    let mut warnings = Vec::new();
    let accepted = if options.from_checklist {
        accepted_from_checklist(root, &policy, &mut warnings)?
    } else {
        ConfirmedSet::load(root)?.blocks
    };

    if accepted.is_empty() {
        let hint = if options.from_checklist {
            format!(
                "no candidates are accepted in {}; mark sections with [x] and re-run",
                paths::CHECKLIST_FILE
            )
        } else {
            format!(
                "{} holds no accepted blocks; run 'ripp discover' and accept candidates first",
                paths::CONFIRMED_FILE
            )
        };
        return Err(RippError::NothingToCompile { hint });
    }

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| titlecase_id(&options.packet_id));
    let mut packet = CanonicalPacket::new(&options.packet_id, title);
    for block in &accepted {
        let kind = SectionKind::from_str(&block.section)?;
        if !packet.set_section_if_empty(kind, block.content.clone()) {
            warnings.push(format!(
                "duplicate accepted block for '{kind}' ignored (first occurrence wins)"
            ));
        }
    }
    packet.level = packet.derive_level();

    let packet_path = paths::packet_path(root, &options.packet_id);
    let markdown_path = paths::packet_markdown_path(root, &options.packet_id);
    packet.save(&packet_path)?;
    io::atomic_write(&markdown_path, render_markdown(&packet).as_bytes())?;

    tracing::info!(packet = %options.packet_id, level = packet.level, "packet compiled");
    Ok(BuildOutput {
        packet_path,
        markdown_path,
        level: packet.level,
        warnings,
    })
}

fn accepted_from_checklist(
    root: &Path,
    policy: &ConfirmPolicy,
    warnings: &mut Vec<String>,
) -> Result<Vec<ConfirmedBlock>> {
    let path = paths::checklist_path(root);
    if !path.exists() {
        return Err(RippError::ChecklistNotFound);
    }
    let text = std::fs::read_to_string(&path)?;
    let parsed = checklist::parse_checklist(&text);
    warnings.extend(parsed.warnings);
    // Parse defects are per-item and non-fatal: surfaced as warnings while
    // the remaining valid items proceed. Zero accepted items fails later.
    warnings.extend(parsed.errors);

    let confirmation = validate_confirmed_blocks(parsed.blocks, policy);
    for (section, reasons) in &confirmation.reasons {
        for reason in reasons {
            warnings.push(format!("rejected '{section}': {reason}"));
        }
    }
    Ok(confirmation.accepted)
}

fn titlecase_id(id: &str) -> String {
    id.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Markdown rendering
// ---------------------------------------------------------------------------

/// Human-readable derivation of a packet. Regenerated on every build; the
/// YAML packet stays the canonical form.
pub fn render_markdown(packet: &CanonicalPacket) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", packet.title);
    let _ = writeln!(out, "- **Packet**: `{}`", packet.packet_id);
    let _ = writeln!(out, "- **Level**: {}", packet.level);
    let _ = writeln!(out, "- **Status**: {}", packet.status);
    let _ = writeln!(out, "- **RIPP version**: {}", packet.ripp_version);
    let _ = writeln!(out, "- **Updated**: {}", packet.updated.to_rfc3339());

    for kind in SectionKind::all() {
        if let Some(content) = packet.section(*kind) {
            let _ = writeln!(out, "\n## {kind}\n");
            out.push_str("```yaml\n");
            let yaml = serde_yaml::to_string(content).unwrap_or_default();
            out.push_str(&yaml);
            if !yaml.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
