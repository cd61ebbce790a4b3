use crate::{AgentError, InferOptions, InferenceAdapter, Result};
use chrono::Utc;
use ripp_core::candidate::{Candidate, CandidateSet, GeneratedBy};
use ripp_core::evidence::{EvidencePack, EvidenceRef};
use ripp_core::section::SectionKind;
use serde::Serialize;
use std::collections::BTreeSet;

/// Deterministic rule-based inference engine.
///
/// Maps evidence categories straight onto packet sections: routes become API
/// contract candidates, auth signals become permission candidates, and so
/// on. Every candidate cites the evidence it was derived from, so an empty
/// evidence pack yields an empty candidate set rather than fabricated
/// fragments.
#[derive(Debug, Default)]
pub struct HeuristicAdapter;

const MAX_REFS_PER_CANDIDATE: usize = 10;

#[derive(Serialize)]
struct PurposeContent {
    summary: String,
}

#[derive(Serialize)]
struct Endpoint {
    method: String,
    path: String,
}

#[derive(Serialize)]
struct ApiContent {
    endpoints: Vec<Endpoint>,
}

#[derive(Serialize)]
struct PermissionsContent {
    signals: Vec<String>,
    note: String,
}

#[derive(Serialize)]
struct Entity {
    name: String,
    kind: String,
}

#[derive(Serialize)]
struct DataContent {
    entities: Vec<Entity>,
}

#[derive(Serialize)]
struct FailureContent {
    modes: Vec<String>,
}

#[derive(Serialize)]
struct AuditContent {
    events: Vec<String>,
}

#[derive(Serialize)]
struct NfrContent {
    availability: String,
    latency_note: String,
}

#[derive(Serialize)]
struct AcceptanceContent {
    cases: Vec<String>,
}

impl InferenceAdapter for HeuristicAdapter {
    fn provider(&self) -> &str {
        "heuristic"
    }

    async fn infer(&self, pack: &EvidencePack, opts: &InferOptions) -> Result<CandidateSet> {
        let mut candidates = Vec::new();

        if let Some(c) = purpose_candidate(pack)? {
            candidates.push(c);
        }
        if let Some(c) = api_candidate(pack)? {
            candidates.push(c);
        }
        if let Some(c) = permissions_candidate(pack)? {
            candidates.push(c);
        }
        if let Some(c) = data_candidate(pack)? {
            candidates.push(c);
        }
        if let Some(c) = failure_candidate(pack)? {
            candidates.push(c);
        }
        if opts.target_level >= 3 {
            if let Some(c) = audit_candidate(pack)? {
                candidates.push(c);
            }
            if let Some(c) = nfr_candidate(pack)? {
                candidates.push(c);
            }
            if let Some(c) = acceptance_candidate(pack)? {
                candidates.push(c);
            }
        }

        let hash = pack
            .content_hash()
            .map_err(|e| AgentError::Malformed(e.to_string()))?;
        Ok(CandidateSet {
            version: 1,
            created: Utc::now(),
            generated_by: GeneratedBy {
                provider: self.provider().to_string(),
                model: None,
                evidence_pack_hash: hash,
            },
            candidates,
        })
    }
}

fn to_content<T: Serialize>(content: &T) -> Result<serde_yaml::Value> {
    serde_yaml::to_value(content).map_err(|e| AgentError::Malformed(e.to_string()))
}

fn refs<'a, I>(items: I) -> Vec<EvidenceRef>
where
    I: Iterator<Item = (&'a String, u32)>,
{
    items
        .take(MAX_REFS_PER_CANDIDATE)
        .map(|(file, line)| EvidenceRef {
            file: file.clone(),
            line,
        })
        .collect()
}

fn purpose_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let ev = &pack.evidence;
    let mut fragments = Vec::new();
    if !ev.routes.is_empty() {
        fragments.push(format!("exposes {} HTTP endpoint(s)", ev.routes.len()));
    }
    if !ev.schemas.is_empty() {
        fragments.push(format!("persists {} declared entit(ies)", ev.schemas.len()));
    }
    if !ev.dependencies.is_empty() {
        fragments.push(format!("builds on {} dependencies", ev.dependencies.len()));
    }
    if fragments.is_empty() {
        return Ok(None);
    }
    let evidence = refs(
        ev.routes
            .iter()
            .map(|r| (&r.file, r.line))
            .chain(ev.schemas.iter().map(|s| (&s.file, s.line)))
            .chain(ev.dependencies.iter().map(|d| (&d.file, d.line))),
    );
    Ok(Some(Candidate::new(
        SectionKind::Purpose,
        0.5,
        evidence,
        to_content(&PurposeContent {
            summary: format!("Feature that {}", fragments.join(", ")),
        })?,
    )))
}

fn api_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let routes = &pack.evidence.routes;
    if routes.is_empty() {
        return Ok(None);
    }
    let mut seen = BTreeSet::new();
    let endpoints: Vec<Endpoint> = routes
        .iter()
        .filter(|r| seen.insert((r.method.clone(), r.path.clone())))
        .map(|r| Endpoint {
            method: r.method.clone(),
            path: r.path.clone(),
        })
        .collect();
    let confidence = if endpoints.len() >= 3 { 0.85 } else { 0.65 };
    Ok(Some(Candidate::new(
        SectionKind::ApiContracts,
        confidence,
        refs(routes.iter().map(|r| (&r.file, r.line))),
        to_content(&ApiContent { endpoints })?,
    )))
}

fn permissions_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let auth = &pack.evidence.auth;
    if auth.is_empty() {
        return Ok(None);
    }
    let signals: Vec<String> = auth
        .iter()
        .map(|a| a.signal.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    Ok(Some(Candidate::new(
        SectionKind::Permissions,
        0.6,
        refs(auth.iter().map(|a| (&a.file, a.line))),
        to_content(&PermissionsContent {
            signals,
            note: "access appears gated; confirm the role model".to_string(),
        })?,
    )))
}

fn data_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let schemas = &pack.evidence.schemas;
    if schemas.is_empty() {
        return Ok(None);
    }
    let mut seen = BTreeSet::new();
    let entities: Vec<Entity> = schemas
        .iter()
        .filter(|s| seen.insert(s.name.clone()))
        .map(|s| Entity {
            name: s.name.clone(),
            kind: s.kind.clone(),
        })
        .collect();
    Ok(Some(Candidate::new(
        SectionKind::DataContracts,
        0.7,
        refs(schemas.iter().map(|s| (&s.file, s.line))),
        to_content(&DataContent { entities })?,
    )))
}

fn failure_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let workflows = &pack.evidence.workflows;
    if workflows.is_empty() {
        return Ok(None);
    }
    let mut modes: BTreeSet<String> = BTreeSet::new();
    for item in workflows {
        let mode = match item.hint.as_str() {
            "queue" | "worker" => "queue backlog or dead-letter growth",
            "retry" => "retry exhaustion against a failing upstream",
            "cron" | "scheduler" => "missed or overlapping scheduled runs",
            "webhook" => "webhook delivery failure or duplicate delivery",
            _ => "pipeline step failure leaves partial state",
        };
        modes.insert(mode.to_string());
    }
    Ok(Some(Candidate::new(
        SectionKind::FailureModes,
        0.45,
        refs(workflows.iter().map(|w| (&w.file, w.line))),
        to_content(&FailureContent {
            modes: modes.into_iter().collect(),
        })?,
    )))
}

fn audit_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let auth = &pack.evidence.auth;
    if auth.is_empty() {
        return Ok(None);
    }
    Ok(Some(Candidate::new(
        SectionKind::AuditEvents,
        0.4,
        refs(auth.iter().map(|a| (&a.file, a.line))),
        to_content(&AuditContent {
            events: vec![
                "authentication_succeeded".to_string(),
                "authentication_failed".to_string(),
                "permission_denied".to_string(),
            ],
        })?,
    )))
}

fn nfr_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let routes = &pack.evidence.routes;
    if routes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Candidate::new(
        SectionKind::Nfrs,
        0.35,
        refs(routes.iter().map(|r| (&r.file, r.line))),
        to_content(&NfrContent {
            availability: "endpoint availability matches the service baseline".to_string(),
            latency_note: "no latency budget found in evidence; set one explicitly".to_string(),
        })?,
    )))
}

fn acceptance_candidate(pack: &EvidencePack) -> Result<Option<Candidate>> {
    let routes = &pack.evidence.routes;
    if routes.is_empty() {
        return Ok(None);
    }
    let mut seen = BTreeSet::new();
    let cases: Vec<String> = routes
        .iter()
        .filter(|r| seen.insert((r.method.clone(), r.path.clone())))
        .map(|r| format!("{} {} responds successfully for an authorized caller", r.method, r.path))
        .collect();
    Ok(Some(Candidate::new(
        SectionKind::AcceptanceTests,
        0.4,
        refs(routes.iter().map(|r| (&r.file, r.line))),
        to_content(&AcceptanceContent { cases })?,
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
