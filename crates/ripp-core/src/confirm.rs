use crate::section::SectionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const SOURCE_CONFIRMED: &str = "confirmed";

/// Placeholder tokens that mark unfinished content. A confirmed block whose
/// serialized content still carries one of these is rejected outright.
const PLACEHOLDER_MARKERS: &[&str] = &["TODO", "TBD", "FIXME", "<placeholder>", "<fill-in>"];

// ---------------------------------------------------------------------------
// ConfirmedBlock
// ---------------------------------------------------------------------------

/// A candidate whose content a human explicitly accepted via the checklist
/// (or an interactive flow). `section` stays a raw string here: quality
/// gating, not parsing, decides whether it names a known section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedBlock {
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_confidence: Option<f64>,
    pub content: serde_yaml::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,
    pub confirmed_at: DateTime<Utc>,
    pub source: String,
}

impl ConfirmedBlock {
    pub fn new(section: impl Into<String>, content: serde_yaml::Value) -> Self {
        Self {
            section: section.into(),
            original_confidence: None,
            content,
            confirmed_by: None,
            confirmed_at: Utc::now(),
            source: SOURCE_CONFIRMED.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfirmedSet (persisted artifact)
// ---------------------------------------------------------------------------

/// The on-disk artifact an interactive confirmation flow leaves behind at
/// `.ripp/confirmed.yaml`. Holds blocks that already passed the gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedSet {
    pub version: u32,
    pub created: DateTime<Utc>,
    pub blocks: Vec<ConfirmedBlock>,
}

impl ConfirmedSet {
    pub fn new(blocks: Vec<ConfirmedBlock>) -> Self {
        Self {
            version: 1,
            created: Utc::now(),
            blocks,
        }
    }

    pub fn save(&self, root: &std::path::Path) -> crate::error::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&crate::paths::confirmed_path(root), yaml.as_bytes())
    }

    pub fn load(root: &std::path::Path) -> crate::error::Result<Self> {
        let path = crate::paths::confirmed_path(root);
        if !path.exists() {
            return Err(crate::error::RippError::ConfirmedNotFound);
        }
        let data = std::fs::read_to_string(&path)?;
        let set: ConfirmedSet = serde_yaml::from_str(&data)?;
        Ok(set)
    }
}

// ---------------------------------------------------------------------------
// Quality gates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConfirmPolicy {
    /// Blocks with a recorded confidence below this are rejected even though
    /// a human checked the box; accidental acceptance of low-confidence
    /// fragments is a known failure mode of interactive review. Blocks with
    /// NO recorded confidence pass this gate (no claim was made).
    pub min_confidence: f64,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self { min_confidence: 0.3 }
    }
}

#[derive(Debug, Default)]
pub struct Confirmation {
    pub accepted: Vec<ConfirmedBlock>,
    pub rejected: Vec<ConfirmedBlock>,
    /// Rejection reasons keyed by section name. Every failed gate for a
    /// block is listed, never just the first.
    pub reasons: BTreeMap<String, Vec<String>>,
}

/// Apply the four quality gates to each block independently and collect all
/// failures. Accepted and rejected blocks both preserve input order.
pub fn validate_confirmed_blocks(
    blocks: Vec<ConfirmedBlock>,
    policy: &ConfirmPolicy,
) -> Confirmation {
    let mut result = Confirmation::default();

    for block in blocks {
        let mut reasons = Vec::new();

        if SectionKind::from_str(&block.section).is_err() {
            reasons.push(format!("unknown section type '{}'", block.section));
        }

        if content_is_empty(&block.content) {
            reasons.push("content is empty".to_string());
        }

        if let Some(marker) = find_placeholder(&block.content) {
            reasons.push(format!("contains placeholder value '{marker}'"));
        }

        if let Some(confidence) = block.original_confidence {
            if confidence < policy.min_confidence {
                reasons.push(format!(
                    "low confidence ({confidence:.2} < {:.2})",
                    policy.min_confidence
                ));
            }
        }

        if reasons.is_empty() {
            result.accepted.push(block);
        } else {
            result
                .reasons
                .entry(block.section.clone())
                .or_default()
                .extend(reasons);
            result.rejected.push(block);
        }
    }

    result
}

fn content_is_empty(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::String(s) => s.trim().is_empty(),
        serde_yaml::Value::Sequence(seq) => seq.is_empty(),
        serde_yaml::Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}

fn find_placeholder(value: &serde_yaml::Value) -> Option<&'static str> {
    let serialized = serde_yaml::to_string(value).unwrap_or_default();
    PLACEHOLDER_MARKERS
        .iter()
        .find(|marker| serialized.contains(*marker))
        .copied()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn block(section: &str, yaml: &str) -> ConfirmedBlock {
        ConfirmedBlock::new(section, serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn good_block_accepted() {
        let result = validate_confirmed_blocks(
            vec![block("purpose", "summary: users can log in\n")],
            &ConfirmPolicy::default(),
        );
        assert_eq!(result.accepted.len(), 1);
        assert!(result.rejected.is_empty());
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn unknown_section_rejected() {
        let result = validate_confirmed_blocks(
            vec![block("deployment_notes", "x: 1\n")],
            &ConfirmPolicy::default(),
        );
        assert_eq!(result.rejected.len(), 1);
        assert!(result.reasons["deployment_notes"][0].contains("unknown section type"));
    }

    #[test]
    fn empty_content_rejected() {
        for yaml in ["{}", "[]", "\"\"", "null"] {
            let result = validate_confirmed_blocks(
                vec![block("purpose", yaml)],
                &ConfirmPolicy::default(),
            );
            assert_eq!(result.rejected.len(), 1, "for {yaml}");
            assert!(result.reasons["purpose"]
                .iter()
                .any(|r| r.contains("content is empty")));
        }
    }

    #[test]
    fn placeholder_always_rejected() {
        // Every other gate passes; the placeholder alone must sink it.
        let result = validate_confirmed_blocks(
            vec![block("permissions", "roles:\n  - admin\n  - TODO\n")],
            &ConfirmPolicy::default(),
        );
        assert_eq!(result.rejected.len(), 1);
        assert!(result.reasons["permissions"]
            .iter()
            .any(|r| r.contains("placeholder")));
    }

    #[test]
    fn low_confidence_rejected_even_when_checked() {
        let mut b = block("purpose", "summary: ok\n");
        b.original_confidence = Some(0.1);
        let result = validate_confirmed_blocks(vec![b], &ConfirmPolicy::default());
        assert_eq!(result.rejected.len(), 1);
        assert!(result.reasons["purpose"]
            .iter()
            .any(|r| r.contains("low confidence")));
    }

    #[test]
    fn absent_confidence_passes_the_gate() {
        // No claim was made, so there is nothing to gate on.
        let b = block("purpose", "summary: ok\n");
        assert!(b.original_confidence.is_none());
        let result = validate_confirmed_blocks(vec![b], &ConfirmPolicy::default());
        assert_eq!(result.accepted.len(), 1);
    }

    #[test]
    fn all_failed_gates_are_reported_not_just_the_first() {
        let mut b = block("bogus_section", "note: TODO\n");
        b.original_confidence = Some(0.05);
        let result = validate_confirmed_blocks(vec![b], &ConfirmPolicy::default());
        let reasons = &result.reasons["bogus_section"];
        assert_eq!(reasons.len(), 3, "got: {reasons:?}");
        assert!(reasons.iter().any(|r| r.contains("unknown section")));
        assert!(reasons.iter().any(|r| r.contains("placeholder")));
        assert!(reasons.iter().any(|r| r.contains("low confidence")));
    }

    #[test]
    fn accepted_blocks_still_proceed_past_rejections() {
        let good = block("purpose", "summary: ok\n");
        let bad = block("purpose", "{}");
        let result = validate_confirmed_blocks(vec![bad, good], &ConfirmPolicy::default());
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected.len(), 1);
    }

    #[test]
    fn policy_threshold_is_respected() {
        let mut b = block("purpose", "summary: ok\n");
        b.original_confidence = Some(0.5);
        let strict = ConfirmPolicy {
            min_confidence: 0.9,
        };
        let result = validate_confirmed_blocks(vec![b], &strict);
        assert_eq!(result.rejected.len(), 1);
    }
}
