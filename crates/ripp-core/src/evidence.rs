use crate::config::EvidenceConfig;
use crate::error::{Result, RippError};
use crate::{io, paths, redact};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Evidence model
// ---------------------------------------------------------------------------

/// Locator for a single fact. Candidates cite these back-references, so every
/// evidence item must be able to produce one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEvidence {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEvidence {
    pub method: String,
    pub path: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEvidence {
    pub name: String,
    /// "table", "model", or "struct".
    pub kind: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvidence {
    pub signal: String,
    pub detail: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvidence {
    pub hint: String,
    pub detail: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    #[serde(default)]
    pub dependencies: Vec<DependencyEvidence>,
    #[serde(default)]
    pub routes: Vec<RouteEvidence>,
    #[serde(default)]
    pub schemas: Vec<SchemaEvidence>,
    #[serde(default)]
    pub auth: Vec<AuthEvidence>,
    #[serde(default)]
    pub workflows: Vec<WorkflowEvidence>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceStats {
    pub total_files: u64,
    pub total_size: u64,
    pub included_files: u64,
    pub excluded_files: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePack {
    pub version: u32,
    pub created: DateTime<Utc>,
    pub stats: EvidenceStats,
    pub evidence: EvidenceSet,
}

impl EvidencePack {
    pub fn is_empty(&self) -> bool {
        self.evidence.dependencies.is_empty()
            && self.evidence.routes.is_empty()
            && self.evidence.schemas.is_empty()
            && self.evidence.auth.is_empty()
            && self.evidence.workflows.is_empty()
    }

    /// Content hash over the pack with `created` pinned to the epoch, so two
    /// runs over an unchanged tree hash identically.
    pub fn content_hash(&self) -> Result<String> {
        let mut pinned = self.clone();
        pinned.created = DateTime::UNIX_EPOCH;
        let yaml = serde_yaml::to_string(&pinned)?;
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Small index written next to the pack, consumed by the inference adapter
/// and diagnostics tooling without loading the full pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceIndex {
    pub version: u32,
    pub created: DateTime<Utc>,
    pub pack_file: String,
    pub content_hash: String,
    pub stats: EvidenceStats,
}

// ---------------------------------------------------------------------------
// Extraction regexes
// ---------------------------------------------------------------------------

static ROUTE_CALL_RE: OnceLock<Regex> = OnceLock::new();
static ROUTE_AXUM_RE: OnceLock<Regex> = OnceLock::new();
static ROUTE_DECORATOR_RE: OnceLock<Regex> = OnceLock::new();
static CREATE_TABLE_RE: OnceLock<Regex> = OnceLock::new();
static MODEL_CLASS_RE: OnceLock<Regex> = OnceLock::new();
static STRUCT_RE: OnceLock<Regex> = OnceLock::new();
static AUTH_RE: OnceLock<Regex> = OnceLock::new();
static WORKFLOW_RE: OnceLock<Regex> = OnceLock::new();
static REQUIREMENT_RE: OnceLock<Regex> = OnceLock::new();
static CARGO_DEP_RE: OnceLock<Regex> = OnceLock::new();
static JSON_DEP_RE: OnceLock<Regex> = OnceLock::new();
static GO_REQUIRE_RE: OnceLock<Regex> = OnceLock::new();

fn route_call_re() -> &'static Regex {
    // router.get("/users", ...) / app.post('/login', ...)
    ROUTE_CALL_RE.get_or_init(|| {
        Regex::new(r#"(?i)\.(get|post|put|patch|delete)\s*\(\s*["'](/[^"']*)["']"#).unwrap()
    })
}

fn route_axum_re() -> &'static Regex {
    // .route("/users", get(list_users))
    ROUTE_AXUM_RE.get_or_init(|| {
        Regex::new(r#"\.route\s*\(\s*["'](/[^"']*)["']\s*,\s*(get|post|put|patch|delete)"#).unwrap()
    })
}

fn route_decorator_re() -> &'static Regex {
    // @app.route("/users", methods=["POST"]) / @router.get("/users")
    ROUTE_DECORATOR_RE.get_or_init(|| {
        Regex::new(r#"(?i)@\w+\.(route|get|post|put|patch|delete)\s*\(\s*["'](/[^"']*)["']"#)
            .unwrap()
    })
}

fn create_table_re() -> &'static Regex {
    CREATE_TABLE_RE.get_or_init(|| {
        Regex::new(r#"(?i)create\s+table\s+(?:if\s+not\s+exists\s+)?["`]?([A-Za-z_][A-Za-z0-9_]*)"#)
            .unwrap()
    })
}

fn model_class_re() -> &'static Regex {
    // class User(models.Model): / const User = mongoose.model("User", ...)
    MODEL_CLASS_RE.get_or_init(|| {
        Regex::new(
            r#"class\s+([A-Z][A-Za-z0-9_]*)\s*\(\s*\w*models\.Model|mongoose\.model\s*\(\s*["']([A-Za-z0-9_]+)["']"#,
        )
        .unwrap()
    })
}

fn struct_re() -> &'static Regex {
    STRUCT_RE.get_or_init(|| {
        Regex::new(r"^\s*(?:pub(?:\([a-z]+\))?\s+)?struct\s+([A-Z][A-Za-z0-9_]*)").unwrap()
    })
}

fn auth_re() -> &'static Regex {
    AUTH_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(authenticate|authorization|requires?_auth|auth_middleware|jwt|oauth2?|api[_-]?key|passport|bearer|rbac|acl)\b",
        )
        .unwrap()
    })
}

fn workflow_re() -> &'static Regex {
    WORKFLOW_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(cron|queue|worker|scheduler|webhook|saga|outbox|retry)\b").unwrap()
    })
}

fn requirement_re() -> &'static Regex {
    // requests==2.31.0 / fastapi>=0.100
    REQUIREMENT_RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._\-]*)\s*(?:[=<>!~]=?\s*([^\s#;]+))?").unwrap()
    })
}

fn cargo_dep_re() -> &'static Regex {
    // serde = "1" / tokio = { version = "1", ... }
    CARGO_DEP_RE.get_or_init(|| {
        Regex::new(r#"^\s*([A-Za-z0-9_\-]+)\s*=\s*(?:"([^"]+)"|\{.*version\s*=\s*"([^"]+)")"#)
            .unwrap()
    })
}

fn json_dep_re() -> &'static Regex {
    // "express": "^4.18.2",
    JSON_DEP_RE
        .get_or_init(|| Regex::new(r#"^\s*"([^"]+)"\s*:\s*"([^"]+)",?\s*$"#).unwrap())
}

fn go_require_re() -> &'static Regex {
    GO_REQUIRE_RE
        .get_or_init(|| Regex::new(r"^\s*([a-z0-9][^\s]+\.[a-z]{2,}[^\s]*)\s+v([^\s]+)").unwrap())
}

const MAX_DETAIL_CHARS: usize = 160;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

struct IncludePolicy {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl IncludePolicy {
    fn from_config(config: &EvidenceConfig) -> Result<Self> {
        let include = if config.include.is_empty() {
            None
        } else {
            Some(build_globset(&config.include)?)
        };
        Ok(Self {
            include,
            exclude: build_globset(&config.exclude)?,
        })
    }

    fn includes(&self, rel: &str) -> bool {
        if self.exclude.is_match(rel) {
            return false;
        }
        match &self.include {
            Some(set) => set.is_match(rel),
            None => true,
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| RippError::SchemaResource(format!("invalid glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RippError::SchemaResource(format!("glob set: {e}")))
}

/// Scan `root` and produce a deterministic, size-bounded evidence pack.
///
/// Deterministic for a fixed tree: files are visited in sorted relative-path
/// order and every category is sorted by (file, line). The only wall-clock
/// content is the top-level `created` timestamp, which `content_hash`
/// excludes. Secret redaction is best effort only.
pub fn build_evidence_pack(root: &Path, config: &EvidenceConfig) -> Result<EvidencePack> {
    let policy = IncludePolicy::from_config(config)?;
    let mut stats = EvidenceStats::default();
    let mut included: Vec<(String, std::path::PathBuf)> = Vec::new();

    let walker = ignore::WalkBuilder::new(root)
        .hidden(false)
        .follow_links(false)
        .build();
    for entry in walker.flatten() {
        let path = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let rel = relative_slash_path(root, path);
        if rel.starts_with(".git/") || rel.starts_with(".ripp/") {
            continue;
        }
        stats.total_files += 1;
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        stats.total_size += size;
        if !policy.includes(&rel) || size > config.max_file_bytes {
            stats.excluded_files += 1;
            continue;
        }
        stats.included_files += 1;
        included.push((rel, path.to_path_buf()));
    }
    // Stable visit order regardless of walker internals.
    included.sort();

    let mut set = EvidenceSet::default();
    for (rel, path) in &included {
        let Some(text) = read_text(path) else {
            continue;
        };
        scan_file(rel, &text, config, &mut set);
    }

    finalize(&mut set, config.max_items_per_category);

    Ok(EvidencePack {
        version: 1,
        created: Utc::now(),
        stats,
        evidence: set,
    })
}

/// Build the pack and write it plus its index under `.ripp/evidence/`.
///
/// The index write is verified after the atomic rename: if the written file
/// does not parse back, it is deleted and the error propagated, so a crash or
/// defect never leaves a parseable-but-truncated index behind.
pub fn write_evidence_pack(
    root: &Path,
    config: &EvidenceConfig,
) -> Result<(EvidencePack, std::path::PathBuf)> {
    let pack = build_evidence_pack(root, config)?;
    let pack_path = paths::evidence_pack_path(root);
    let pack_yaml = serde_yaml::to_string(&pack)?;
    io::atomic_write(&pack_path, pack_yaml.as_bytes())?;

    let index = EvidenceIndex {
        version: pack.version,
        created: pack.created,
        pack_file: paths::EVIDENCE_PACK_FILE.to_string(),
        content_hash: pack.content_hash()?,
        stats: pack.stats.clone(),
    };
    let index_yaml = serde_yaml::to_string(&index)?;
    io::atomic_write_verified::<EvidenceIndex>(&paths::evidence_index_path(root), index_yaml.as_bytes())?;

    tracing::info!(
        files = pack.stats.included_files,
        "evidence pack written (secret redaction is best effort)"
    );
    Ok((pack, pack_path))
}

pub fn load_evidence_pack(root: &Path) -> Result<EvidencePack> {
    let path = paths::evidence_pack_path(root);
    if !path.exists() {
        return Err(RippError::EvidencePackNotFound);
    }
    let data = std::fs::read_to_string(&path)?;
    let pack: EvidencePack = serde_yaml::from_str(&data)?;
    Ok(pack)
}

pub fn load_evidence_index(root: &Path) -> Result<EvidenceIndex> {
    let path = paths::evidence_index_path(root);
    if !path.exists() {
        return Err(RippError::EvidencePackNotFound);
    }
    let data = std::fs::read_to_string(&path)?;
    let index: EvidenceIndex = serde_yaml::from_str(&data)?;
    Ok(index)
}

// ---------------------------------------------------------------------------
// Per-file scanning
// ---------------------------------------------------------------------------

fn scan_file(rel: &str, text: &str, config: &EvidenceConfig, set: &mut EvidenceSet) {
    let file_name = rel.rsplit('/').next().unwrap_or(rel);
    let is_model_file = rel.contains("model") || rel.contains("schema") || rel.contains("entit");
    let is_ci_file = rel.starts_with(".github/workflows/")
        || file_name == ".gitlab-ci.yml"
        || file_name == "Jenkinsfile";

    match file_name {
        "Cargo.toml" => scan_cargo_manifest(rel, text, set),
        "package.json" => scan_package_json(rel, text, set),
        "requirements.txt" => scan_requirements(rel, text, set),
        "go.mod" => scan_go_mod(rel, text, set),
        _ => {}
    }

    for (idx, raw_line) in text.lines().enumerate() {
        let line = (idx + 1) as u32;

        if let Some(caps) = route_call_re().captures(raw_line) {
            set.routes.push(RouteEvidence {
                method: caps[1].to_uppercase(),
                path: caps[2].to_string(),
                file: rel.to_string(),
                line,
            });
        } else if let Some(caps) = route_axum_re().captures(raw_line) {
            set.routes.push(RouteEvidence {
                method: caps[2].to_uppercase(),
                path: caps[1].to_string(),
                file: rel.to_string(),
                line,
            });
        } else if let Some(caps) = route_decorator_re().captures(raw_line) {
            let method = match &caps[1] {
                "route" => "GET".to_string(),
                m => m.to_uppercase(),
            };
            set.routes.push(RouteEvidence {
                method,
                path: caps[2].to_string(),
                file: rel.to_string(),
                line,
            });
        }

        if let Some(caps) = create_table_re().captures(raw_line) {
            set.schemas.push(SchemaEvidence {
                name: caps[1].to_string(),
                kind: "table".to_string(),
                file: rel.to_string(),
                line,
            });
        } else if let Some(caps) = model_class_re().captures(raw_line) {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            set.schemas.push(SchemaEvidence {
                name,
                kind: "model".to_string(),
                file: rel.to_string(),
                line,
            });
        } else if is_model_file {
            if let Some(caps) = struct_re().captures(raw_line) {
                set.schemas.push(SchemaEvidence {
                    name: caps[1].to_string(),
                    kind: "struct".to_string(),
                    file: rel.to_string(),
                    line,
                });
            }
        }

        if let Some(caps) = auth_re().captures(raw_line) {
            set.auth.push(AuthEvidence {
                signal: caps[1].to_lowercase(),
                detail: detail_excerpt(raw_line, config),
                file: rel.to_string(),
                line,
            });
        }

        if is_ci_file {
            if raw_line.trim_start().starts_with("name:") {
                set.workflows.push(WorkflowEvidence {
                    hint: "ci".to_string(),
                    detail: detail_excerpt(raw_line, config),
                    file: rel.to_string(),
                    line,
                });
            }
        } else if let Some(caps) = workflow_re().captures(raw_line) {
            set.workflows.push(WorkflowEvidence {
                hint: caps[1].to_lowercase(),
                detail: detail_excerpt(raw_line, config),
                file: rel.to_string(),
                line,
            });
        }
    }
}

fn scan_cargo_manifest(rel: &str, text: &str, set: &mut EvidenceSet) {
    let mut in_deps = false;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_deps = trimmed.contains("dependencies");
            continue;
        }
        if !in_deps {
            continue;
        }
        if let Some(caps) = cargo_dep_re().captures(line) {
            let version = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string());
            set.dependencies.push(DependencyEvidence {
                name: caps[1].to_string(),
                version,
                file: rel.to_string(),
                line: (idx + 1) as u32,
            });
        }
    }
}

fn scan_package_json(rel: &str, text: &str, set: &mut EvidenceSet) {
    let mut in_deps = false;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("\"dependencies\"") || trimmed.starts_with("\"devDependencies\"") {
            in_deps = true;
            continue;
        }
        if in_deps && trimmed.starts_with('}') {
            in_deps = false;
            continue;
        }
        if !in_deps {
            continue;
        }
        if let Some(caps) = json_dep_re().captures(line) {
            set.dependencies.push(DependencyEvidence {
                name: caps[1].to_string(),
                version: Some(caps[2].to_string()),
                file: rel.to_string(),
                line: (idx + 1) as u32,
            });
        }
    }
}

fn scan_requirements(rel: &str, text: &str, set: &mut EvidenceSet) {
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
            continue;
        }
        if let Some(caps) = requirement_re().captures(trimmed) {
            set.dependencies.push(DependencyEvidence {
                name: caps[1].to_string(),
                version: caps.get(2).map(|m| m.as_str().to_string()),
                file: rel.to_string(),
                line: (idx + 1) as u32,
            });
        }
    }
}

fn scan_go_mod(rel: &str, text: &str, set: &mut EvidenceSet) {
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("module ") || trimmed.starts_with("go ") {
            continue;
        }
        let candidate = trimmed.strip_prefix("require ").unwrap_or(trimmed);
        if let Some(caps) = go_require_re().captures(candidate) {
            set.dependencies.push(DependencyEvidence {
                name: caps[1].to_string(),
                version: Some(caps[2].to_string()),
                file: rel.to_string(),
                line: (idx + 1) as u32,
            });
        }
    }
}

fn detail_excerpt(line: &str, config: &EvidenceConfig) -> String {
    let trimmed = line.trim();
    let excerpt: String = trimmed.chars().take(MAX_DETAIL_CHARS).collect();
    if config.redact_secrets {
        redact::redact_line(&excerpt)
    } else {
        excerpt
    }
}

fn finalize(set: &mut EvidenceSet, cap: usize) {
    set.dependencies
        .sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    set.routes
        .sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    set.schemas
        .sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    set.auth
        .sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    set.workflows
        .sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    set.dependencies.truncate(cap);
    set.routes.truncate(cap);
    set.schemas.truncate(cap);
    set.auth.truncate(cap);
    set.workflows.truncate(cap);
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read a file as text, skipping binary content (NUL byte in the head).
fn read_text(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    if bytes.iter().take(1024).any(|b| *b == 0) {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvidenceConfig;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "package.json",
            r#"{
  "name": "shop",
  "dependencies": {
    "express": "^4.18.2",
    "pg": "^8.11.0"
  }
}
"#,
        );
        write(
            &dir,
            "src/routes.js",
            "router.get(\"/users\", listUsers);\nrouter.post(\"/login\", login);\n",
        );
        write(
            &dir,
            "migrations/001_init.sql",
            "CREATE TABLE users (id serial);\nCREATE TABLE IF NOT EXISTS sessions (id serial);\n",
        );
        write(
            &dir,
            "src/auth.js",
            "const token = jwt.sign(payload, secret);\napp.use(authMiddleware); // authorization\n",
        );
        write(
            &dir,
            ".github/workflows/ci.yml",
            "name: ci\non: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n",
        );
        dir
    }

    #[test]
    fn extracts_dependencies_routes_schemas() {
        let dir = sample_tree();
        let pack = build_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();

        let dep_names: Vec<_> = pack
            .evidence
            .dependencies
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert!(dep_names.contains(&"express"));
        assert!(dep_names.contains(&"pg"));

        assert_eq!(pack.evidence.routes.len(), 2);
        assert_eq!(pack.evidence.routes[0].method, "GET");
        assert_eq!(pack.evidence.routes[0].path, "/users");
        assert_eq!(pack.evidence.routes[1].method, "POST");

        let tables: Vec<_> = pack
            .evidence
            .schemas
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert!(tables.contains(&"users"));
        assert!(tables.contains(&"sessions"));

        assert!(pack.evidence.auth.iter().any(|a| a.signal == "jwt"));
        assert!(pack.evidence.workflows.iter().any(|w| w.hint == "ci"));
    }

    #[test]
    fn evidence_items_carry_locators() {
        let dir = sample_tree();
        let pack = build_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();
        let route = &pack.evidence.routes[0];
        assert_eq!(route.file, "src/routes.js");
        assert_eq!(route.line, 1);
    }

    #[test]
    fn deterministic_for_fixed_tree() {
        let dir = sample_tree();
        let a = build_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();
        let b = build_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();
        // Timestamps aside, content must be byte-identical.
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn exclude_globs_are_applied() {
        let dir = sample_tree();
        let mut config = EvidenceConfig::default();
        config.exclude.push("migrations/**".to_string());
        let pack = build_evidence_pack(dir.path(), &config).unwrap();
        assert!(pack.evidence.schemas.is_empty());
        assert!(pack.stats.excluded_files >= 1);
    }

    #[test]
    fn include_globs_narrow_the_scan() {
        let dir = sample_tree();
        let config = EvidenceConfig {
            include: vec!["src/**".to_string()],
            ..EvidenceConfig::default()
        };
        let pack = build_evidence_pack(dir.path(), &config).unwrap();
        assert!(pack.evidence.dependencies.is_empty(), "package.json excluded");
        assert_eq!(pack.evidence.routes.len(), 2);
    }

    #[test]
    fn secrets_are_redacted_in_details() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "src/auth.py",
            "API_KEY = 'sk-abc123def456ghi789jkl'  # bearer auth\n",
        );
        let pack = build_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();
        assert!(!pack.evidence.auth.is_empty());
        for item in &pack.evidence.auth {
            assert!(!item.detail.contains("sk-abc123"), "secret leaked: {}", item.detail);
        }
    }

    #[test]
    fn oversized_files_are_excluded() {
        let dir = TempDir::new().unwrap();
        write(&dir, "big.sql", "CREATE TABLE huge (id serial);\n");
        let config = EvidenceConfig {
            max_file_bytes: 4,
            ..EvidenceConfig::default()
        };
        let pack = build_evidence_pack(dir.path(), &config).unwrap();
        assert!(pack.evidence.schemas.is_empty());
        assert_eq!(pack.stats.excluded_files, 1);
    }

    #[test]
    fn category_caps_bound_the_pack() {
        let dir = TempDir::new().unwrap();
        let mut sql = String::new();
        for i in 0..50 {
            sql.push_str(&format!("CREATE TABLE t{i} (id serial);\n"));
        }
        write(&dir, "schema.sql", &sql);
        let config = EvidenceConfig {
            max_items_per_category: 10,
            ..EvidenceConfig::default()
        };
        let pack = build_evidence_pack(dir.path(), &config).unwrap();
        assert_eq!(pack.evidence.schemas.len(), 10);
    }

    #[test]
    fn write_produces_pack_and_verified_index() {
        let dir = sample_tree();
        let (pack, pack_path) =
            write_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();
        assert!(pack_path.exists());
        let index = load_evidence_index(dir.path()).unwrap();
        assert_eq!(index.content_hash, pack.content_hash().unwrap());
        assert_eq!(index.stats, pack.stats);

        let reloaded = load_evidence_pack(dir.path()).unwrap();
        assert_eq!(reloaded.content_hash().unwrap(), pack.content_hash().unwrap());
    }

    #[test]
    fn load_without_pack_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        let err = load_evidence_pack(dir.path()).unwrap_err();
        assert!(err.to_string().contains("ripp evidence build"));
    }

    #[test]
    fn cargo_manifest_dependencies() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "Cargo.toml",
            "[package]\nname = \"x\"\n\n[dependencies]\nserde = \"1\"\ntokio = { version = \"1\", features = [\"full\"] }\n",
        );
        let pack = build_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();
        let deps: Vec<_> = pack
            .evidence
            .dependencies
            .iter()
            .map(|d| (d.name.as_str(), d.version.as_deref()))
            .collect();
        assert!(deps.contains(&("serde", Some("1"))));
        assert!(deps.contains(&("tokio", Some("1"))));
        // [package] name must not be picked up as a dependency
        assert!(!deps.iter().any(|(n, _)| *n == "name"));
    }

    #[test]
    fn own_state_dir_is_never_scanned() {
        let dir = sample_tree();
        write(
            &dir,
            ".ripp/evidence/pack.yaml",
            "version: 1\n# CREATE TABLE bogus (id serial);\n",
        );
        let pack = build_evidence_pack(dir.path(), &EvidenceConfig::default()).unwrap();
        assert!(!pack.evidence.schemas.iter().any(|s| s.name == "bogus"));
    }
}
