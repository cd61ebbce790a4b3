use crate::error::{Result, RippError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RIPP_DIR: &str = ".ripp";
pub const EVIDENCE_DIR: &str = ".ripp/evidence";
pub const PACKETS_DIR: &str = ".ripp/packets";

pub const CONFIG_FILE: &str = ".ripp/config.yaml";
pub const EVIDENCE_PACK_FILE: &str = ".ripp/evidence/pack.yaml";
pub const EVIDENCE_INDEX_FILE: &str = ".ripp/evidence/index.yaml";
pub const CANDIDATES_FILE: &str = ".ripp/candidates.yaml";
pub const CHECKLIST_FILE: &str = ".ripp/checklist.md";
pub const CONFIRMED_FILE: &str = ".ripp/confirmed.yaml";

/// Filename suffix every canonical packet must carry.
pub const PACKET_SUFFIX: &str = ".ripp.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn ripp_dir(root: &Path) -> PathBuf {
    root.join(RIPP_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn evidence_pack_path(root: &Path) -> PathBuf {
    root.join(EVIDENCE_PACK_FILE)
}

pub fn evidence_index_path(root: &Path) -> PathBuf {
    root.join(EVIDENCE_INDEX_FILE)
}

pub fn candidates_path(root: &Path) -> PathBuf {
    root.join(CANDIDATES_FILE)
}

pub fn checklist_path(root: &Path) -> PathBuf {
    root.join(CHECKLIST_FILE)
}

pub fn confirmed_path(root: &Path) -> PathBuf {
    root.join(CONFIRMED_FILE)
}

pub fn packet_path(root: &Path, packet_id: &str) -> PathBuf {
    root.join(PACKETS_DIR).join(format!("{packet_id}{PACKET_SUFFIX}"))
}

pub fn packet_markdown_path(root: &Path, packet_id: &str) -> PathBuf {
    root.join(PACKETS_DIR).join(format!("{packet_id}.ripp.md"))
}

// ---------------------------------------------------------------------------
// Packet id validation
// ---------------------------------------------------------------------------

static PACKET_ID_RE: OnceLock<Regex> = OnceLock::new();

fn packet_id_re() -> &'static Regex {
    PACKET_ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_packet_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !packet_id_re().is_match(id) {
        return Err(RippError::InvalidPacketId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
