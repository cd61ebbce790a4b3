use thiserror::Error;

/// Adapter-boundary failures. Deliberately distinct from the pipeline's
/// validation errors: "the adapter could not answer" and "the adapter's
/// answer violates the contract" are different failures with different
/// handling (the former may retry, the latter never).
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("adapter unavailable: {0}")]
    Unavailable(String),

    #[error("adapter timed out after {0}s")]
    TimedOut(u64),

    #[error("adapter produced malformed output: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
