use crate::error::{Result, RippError};
use crate::section::SectionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const RIPP_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// PacketStatus
// ---------------------------------------------------------------------------

/// Lifecycle status. Human-set; the pipeline only ever constructs drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketStatus {
    Draft,
    Approved,
    Implemented,
    Deprecated,
}

impl PacketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PacketStatus::Draft => "draft",
            PacketStatus::Approved => "approved",
            PacketStatus::Implemented => "implemented",
            PacketStatus::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for PacketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CanonicalPacket
// ---------------------------------------------------------------------------

/// The final, levelled intent packet. Constructed by the compiler, owned by
/// the repository as a versioned artifact afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalPacket {
    pub ripp_version: String,
    pub packet_id: String,
    pub title: String,
    pub level: u8,
    pub status: PacketStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub purpose: serde_yaml::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ux_flow: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_contracts: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_contracts: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_modes: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_events: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfrs: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_tests: Option<serde_yaml::Value>,
}

impl CanonicalPacket {
    pub fn new(packet_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            ripp_version: RIPP_VERSION.to_string(),
            packet_id: packet_id.into(),
            title: title.into(),
            level: 1,
            status: PacketStatus::Draft,
            created: now,
            updated: now,
            purpose: serde_yaml::Value::Null,
            ux_flow: None,
            data_contracts: None,
            api_contracts: None,
            permissions: None,
            failure_modes: None,
            audit_events: None,
            nfrs: None,
            acceptance_tests: None,
        }
    }

    pub fn section(&self, kind: SectionKind) -> Option<&serde_yaml::Value> {
        let field = match kind {
            SectionKind::Purpose => {
                return (!self.purpose.is_null()).then_some(&self.purpose);
            }
            SectionKind::UxFlow => &self.ux_flow,
            SectionKind::DataContracts => &self.data_contracts,
            SectionKind::ApiContracts => &self.api_contracts,
            SectionKind::Permissions => &self.permissions,
            SectionKind::FailureModes => &self.failure_modes,
            SectionKind::AuditEvents => &self.audit_events,
            SectionKind::Nfrs => &self.nfrs,
            SectionKind::AcceptanceTests => &self.acceptance_tests,
        };
        field.as_ref()
    }

    /// Write `content` into the field for `kind`. Existing content is left
    /// alone (first-wins merge policy); returns whether the write happened.
    pub fn set_section_if_empty(&mut self, kind: SectionKind, content: serde_yaml::Value) -> bool {
        if self.section(kind).is_some() {
            return false;
        }
        match kind {
            SectionKind::Purpose => self.purpose = content,
            SectionKind::UxFlow => self.ux_flow = Some(content),
            SectionKind::DataContracts => self.data_contracts = Some(content),
            SectionKind::ApiContracts => self.api_contracts = Some(content),
            SectionKind::Permissions => self.permissions = Some(content),
            SectionKind::FailureModes => self.failure_modes = Some(content),
            SectionKind::AuditEvents => self.audit_events = Some(content),
            SectionKind::Nfrs => self.nfrs = Some(content),
            SectionKind::AcceptanceTests => self.acceptance_tests = Some(content),
        }
        true
    }

    /// Completeness level derivable from the sections actually present.
    ///
    /// Start at 1; level 2 needs the full {api_contracts, permissions,
    /// failure_modes} set; level 3 additionally needs {audit_events, nfrs,
    /// acceptance_tests}. Missing even one field of a tier denies the tier.
    pub fn derive_level(&self) -> u8 {
        let has_all = |kinds: &[SectionKind]| kinds.iter().all(|k| self.section(*k).is_some());
        if !has_all(SectionKind::level2_required()) {
            return 1;
        }
        if !has_all(SectionKind::level3_required()) {
            return 2;
        }
        3
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, yaml.as_bytes())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RippError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("packet not found: {}", path.display()),
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let packet: CanonicalPacket = serde_yaml::from_str(&data)?;
        Ok(packet)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
