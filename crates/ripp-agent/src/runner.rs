use crate::{AgentError, InferOptions, InferenceAdapter, Result};
use ripp_core::candidate::CandidateSet;
use ripp_core::evidence::EvidencePack;
use std::time::Duration;

/// Retry behaviour for adapter calls. Only transient failures (unavailable,
/// timed out) are retried; malformed output is a contract violation and
/// retrying it would just launder a broken adapter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Drives an adapter call under a per-attempt timeout, retrying transient
/// failures up to the policy's budget. Returns the last error when the
/// budget is exhausted.
pub async fn infer_with_retry<A: InferenceAdapter>(
    adapter: &A,
    pack: &EvidencePack,
    opts: &InferOptions,
    policy: &RetryPolicy,
) -> Result<CandidateSet> {
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, adapter.infer(pack, opts)).await {
            Ok(r) => r,
            Err(_) => Err(AgentError::TimedOut(policy.timeout.as_secs())),
        };
        match result {
            Ok(set) => return Ok(set),
            Err(e @ AgentError::Malformed(_)) => return Err(e),
            Err(e) => {
                if attempt >= policy.max_retries {
                    return Err(e);
                }
                attempt += 1;
                tracing::warn!(
                    provider = adapter.provider(),
                    attempt,
                    max = policy.max_retries,
                    "inference attempt failed, retrying: {e}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ripp_core::candidate::GeneratedBy;
    use ripp_core::evidence::{EvidenceSet, EvidenceStats};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn pack() -> EvidencePack {
        EvidencePack {
            version: 1,
            created: Utc::now(),
            stats: EvidenceStats::default(),
            evidence: EvidenceSet::default(),
        }
    }

    fn empty_set() -> CandidateSet {
        CandidateSet {
            version: 1,
            created: Utc::now(),
            generated_by: GeneratedBy {
                provider: "flaky".to_string(),
                model: None,
                evidence_pack_hash: "h".to_string(),
            },
            candidates: Vec::new(),
        }
    }

    /// Fails with the given error until `succeed_after` calls have happened.
    struct FlakyAdapter {
        calls: AtomicU32,
        succeed_after: u32,
        error: fn() -> AgentError,
    }

    impl InferenceAdapter for FlakyAdapter {
        fn provider(&self) -> &str {
            "flaky"
        }

        async fn infer(&self, _pack: &EvidencePack, _opts: &InferOptions) -> Result<CandidateSet> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.succeed_after {
                Err((self.error)())
            } else {
                Ok(empty_set())
            }
        }
    }

    struct SlowAdapter;

    impl InferenceAdapter for SlowAdapter {
        fn provider(&self) -> &str {
            "slow"
        }

        async fn infer(&self, _pack: &EvidencePack, _opts: &InferOptions) -> Result<CandidateSet> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(empty_set())
        }
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let adapter = FlakyAdapter {
            calls: AtomicU32::new(0),
            succeed_after: 2,
            error: || AgentError::Unavailable("connection refused".to_string()),
        };
        let result = infer_with_retry(
            &adapter,
            &pack(),
            &InferOptions::default(),
            &RetryPolicy::default(),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_returns_last_error() {
        let adapter = FlakyAdapter {
            calls: AtomicU32::new(0),
            succeed_after: u32::MAX,
            error: || AgentError::Unavailable("down".to_string()),
        };
        let policy = RetryPolicy {
            max_retries: 1,
            ..RetryPolicy::default()
        };
        let err = infer_with_retry(&adapter, &pack(), &InferOptions::default(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Unavailable(_)));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_output_is_never_retried() {
        let adapter = FlakyAdapter {
            calls: AtomicU32::new(0),
            succeed_after: u32::MAX,
            error: || AgentError::Malformed("not yaml".to_string()),
        };
        let err = infer_with_retry(
            &adapter,
            &pack(),
            &InferOptions::default(),
            &RetryPolicy::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::Malformed(_)));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn per_attempt_timeout_maps_to_timed_out() {
        let policy = RetryPolicy {
            max_retries: 0,
            timeout: Duration::from_millis(20),
        };
        let err = infer_with_retry(&SlowAdapter, &pack(), &InferOptions::default(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::TimedOut(_)));
    }
}
