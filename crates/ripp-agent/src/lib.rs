//! Candidate-inference adapter boundary.
//!
//! The pipeline never inspects *how* candidates were produced; it only
//! requires the emitted [`CandidateSet`](ripp_core::candidate::CandidateSet)
//! to satisfy the structural contract (evidence-linked, confidence in range,
//! confirmation-required). Any engine that implements [`InferenceAdapter`]
//! can plug in here; [`HeuristicAdapter`] is the built-in, fully
//! deterministic one.

mod error;
pub mod heuristic;
pub mod runner;

pub use error::{AgentError, Result};
pub use heuristic::HeuristicAdapter;
pub use runner::{infer_with_retry, RetryPolicy};

use ripp_core::candidate::CandidateSet;
use ripp_core::evidence::EvidencePack;
use std::future::Future;

/// Options threaded into an inference call.
#[derive(Debug, Clone)]
pub struct InferOptions {
    /// Completeness tier the caller is aiming for; adapters may emit extra
    /// sections (audit events, NFRs, acceptance tests) only when asked for
    /// level 3.
    pub target_level: u8,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self { target_level: 2 }
    }
}

/// The seam where an external capability (AI model or heuristic engine)
/// plugs in. Implementations may be network-bound; callers drive the future
/// under a timeout and may cancel it by dropping it.
pub trait InferenceAdapter {
    fn provider(&self) -> &str;

    fn model(&self) -> Option<&str> {
        None
    }

    fn infer(
        &self,
        pack: &EvidencePack,
        opts: &InferOptions,
    ) -> impl Future<Output = Result<CandidateSet>> + Send;
}
