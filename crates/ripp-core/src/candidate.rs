use crate::error::{Result, RippError};
use crate::evidence::EvidenceRef;
use crate::section::SectionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed `source` tag for inferred fragments. Anything else fails contract
/// validation; the value exists so the provenance of a packet field remains
/// traceable after merging.
pub const SOURCE_INFERRED: &str = "inferred";

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// An inferred, unconfirmed fragment of an intent packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub section: SectionKind,
    pub source: String,
    pub confidence: f64,
    pub evidence: Vec<EvidenceRef>,
    pub requires_human_confirmation: bool,
    pub content: serde_yaml::Value,
}

impl Candidate {
    pub fn new(
        section: SectionKind,
        confidence: f64,
        evidence: Vec<EvidenceRef>,
        content: serde_yaml::Value,
    ) -> Self {
        Self {
            section,
            source: SOURCE_INFERRED.to_string(),
            confidence,
            evidence,
            // Invariant: an inferred candidate can never assert it needs no
            // review, so this is not a parameter.
            requires_human_confirmation: true,
            content,
        }
    }
}

// ---------------------------------------------------------------------------
// CandidateSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedBy {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub evidence_pack_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSet {
    pub version: u32,
    pub created: DateTime<Utc>,
    pub generated_by: GeneratedBy,
    pub candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Structural contract validation applied to every set an adapter emits.
    ///
    /// Fails the WHOLE set on the first violation, naming the candidate and
    /// the violated field. Partial trust would break traceability, so a bad
    /// candidate is never silently dropped.
    pub fn validate(&self) -> Result<()> {
        for (index, c) in self.candidates.iter().enumerate() {
            if c.source != SOURCE_INFERRED {
                return Err(RippError::InvalidCandidate {
                    index,
                    field: "source",
                    reason: format!("expected \"{SOURCE_INFERRED}\", got \"{}\"", c.source),
                });
            }
            // NaN fails the range check too.
            if !(0.0..=1.0).contains(&c.confidence) {
                return Err(RippError::InvalidCandidate {
                    index,
                    field: "confidence",
                    reason: format!("{} is outside [0, 1]", c.confidence),
                });
            }
            if c.evidence.is_empty() {
                return Err(RippError::InvalidCandidate {
                    index,
                    field: "evidence",
                    reason: "candidate cites no evidence references".to_string(),
                });
            }
            if !c.requires_human_confirmation {
                return Err(RippError::InvalidCandidate {
                    index,
                    field: "requires_human_confirmation",
                    reason: "must be true for every inferred candidate".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, yaml.as_bytes())
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let set: CandidateSet = serde_yaml::from_str(&data)?;
        Ok(set)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
