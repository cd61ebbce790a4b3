use thiserror::Error;

#[derive(Debug, Error)]
pub enum RippError {
    #[error("not initialized: run 'ripp init'")]
    NotInitialized,

    #[error("unknown section type: {0}")]
    UnknownSection(String),

    #[error("invalid packet id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidPacketId(String),

    #[error("invalid candidate set: candidate {index} has invalid '{field}': {reason}")]
    InvalidCandidate {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("evidence pack not found: run 'ripp evidence build' first")]
    EvidencePackNotFound,

    #[error("checklist not found: run 'ripp checklist render' first")]
    ChecklistNotFound,

    #[error("no confirmed intent found: run 'ripp discover' and accept candidates first")]
    ConfirmedNotFound,

    #[error("nothing to compile: {hint}")]
    NothingToCompile { hint: String },

    #[error("schema resource error: {0}")]
    SchemaResource(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RippError>;
