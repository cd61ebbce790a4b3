use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SectionKind
// ---------------------------------------------------------------------------

/// The closed set of packet sections. Every candidate, confirmed block, and
/// packet field is keyed by one of these; unknown section strings are
/// rejected at the parse boundary, never carried as open-ended strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Purpose,
    UxFlow,
    DataContracts,
    ApiContracts,
    Permissions,
    FailureModes,
    AuditEvents,
    Nfrs,
    AcceptanceTests,
}

impl SectionKind {
    pub fn all() -> &'static [SectionKind] {
        &[
            SectionKind::Purpose,
            SectionKind::UxFlow,
            SectionKind::DataContracts,
            SectionKind::ApiContracts,
            SectionKind::Permissions,
            SectionKind::FailureModes,
            SectionKind::AuditEvents,
            SectionKind::Nfrs,
            SectionKind::AcceptanceTests,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Purpose => "purpose",
            SectionKind::UxFlow => "ux_flow",
            SectionKind::DataContracts => "data_contracts",
            SectionKind::ApiContracts => "api_contracts",
            SectionKind::Permissions => "permissions",
            SectionKind::FailureModes => "failure_modes",
            SectionKind::AuditEvents => "audit_events",
            SectionKind::Nfrs => "nfrs",
            SectionKind::AcceptanceTests => "acceptance_tests",
        }
    }

    /// Sections required (beyond level 1) for a packet to claim level 2.
    pub fn level2_required() -> &'static [SectionKind] {
        &[
            SectionKind::ApiContracts,
            SectionKind::Permissions,
            SectionKind::FailureModes,
        ]
    }

    /// Sections required, in addition to the level 2 set, to claim level 3.
    pub fn level3_required() -> &'static [SectionKind] {
        &[
            SectionKind::AuditEvents,
            SectionKind::Nfrs,
            SectionKind::AcceptanceTests,
        ]
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionKind {
    type Err = crate::error::RippError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purpose" => Ok(SectionKind::Purpose),
            "ux_flow" => Ok(SectionKind::UxFlow),
            "data_contracts" => Ok(SectionKind::DataContracts),
            "api_contracts" => Ok(SectionKind::ApiContracts),
            "permissions" => Ok(SectionKind::Permissions),
            "failure_modes" => Ok(SectionKind::FailureModes),
            "audit_events" => Ok(SectionKind::AuditEvents),
            "nfrs" => Ok(SectionKind::Nfrs),
            "acceptance_tests" => Ok(SectionKind::AcceptanceTests),
            _ => Err(crate::error::RippError::UnknownSection(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
