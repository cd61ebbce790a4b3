use crate::error::{Result, RippError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EvidenceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Include globs applied after the gitignore-aware walk. Empty = include all.
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Files larger than this are counted but not scanned.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Per-category cap keeping the pack size-bounded.
    #[serde(default = "default_max_items")]
    pub max_items_per_category: usize,
    #[serde(default = "default_redact")]
    pub redact_secrets: bool,
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
        "**/dist/**".to_string(),
        "**/.git/**".to_string(),
        "**/vendor/**".to_string(),
    ]
}

fn default_max_file_bytes() -> u64 {
    512 * 1024
}

fn default_max_items() -> usize {
    200
}

fn default_redact() -> bool {
    true
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_exclude(),
            max_file_bytes: default_max_file_bytes(),
            max_items_per_category: default_max_items(),
            redact_secrets: default_redact(),
        }
    }
}

// ---------------------------------------------------------------------------
// DiscoveryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_target_level")]
    pub target_level: u8,
    /// Confirmed blocks below this confidence are rejected even when the
    /// human checked the box. Accidental acceptance of a low-confidence
    /// fragment is a known failure mode of interactive review.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_provider() -> String {
    "heuristic".to_string()
}

fn default_target_level() -> u8 {
    2
}

fn default_min_confidence() -> f64 {
    0.3
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            target_level: default_target_level(),
            min_confidence: default_min_confidence(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// RippConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RippConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectInfo,
    #[serde(default)]
    pub evidence: EvidenceConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

fn default_version() -> u32 {
    1
}

impl RippConfig {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectInfo {
                name: project_name.into(),
                description: None,
            },
            evidence: EvidenceConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RippError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: RippConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for glob in self.evidence.include.iter().chain(&self.evidence.exclude) {
            if globset::Glob::new(glob).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("invalid glob pattern '{glob}' in evidence config"),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.discovery.min_confidence) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "discovery.min_confidence={} is outside [0, 1]",
                    self.discovery.min_confidence
                ),
            });
        }

        if !(1..=3).contains(&self.discovery.target_level) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "discovery.target_level={} must be 1, 2, or 3",
                    self.discovery.target_level
                ),
            });
        }

        if self.discovery.provider != "heuristic" && self.discovery.model.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "provider '{}' usually needs discovery.model set",
                    self.discovery.provider
                ),
            });
        }

        if self.evidence.max_file_bytes == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "evidence.max_file_bytes=0 excludes every file from scanning".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = RippConfig::new("test-project");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: RippConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project.name, "test-project");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.discovery.provider, "heuristic");
    }

    #[test]
    fn minimal_config_backward_compat() {
        // A config.yaml with only a project key must still deserialize
        let yaml = "version: 1\nproject:\n  name: my-project\n";
        let cfg: RippConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.evidence.redact_secrets);
        assert_eq!(cfg.evidence.max_items_per_category, 200);
        assert!((cfg.discovery.min_confidence - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_valid_config_no_warnings() {
        let cfg = RippConfig::new("test-project");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_bad_glob() {
        let mut cfg = RippConfig::new("test-project");
        cfg.evidence.exclude.push("**/{unclosed".to_string());
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("invalid glob pattern")));
    }

    #[test]
    fn validate_confidence_out_of_range() {
        let mut cfg = RippConfig::new("test-project");
        cfg.discovery.min_confidence = 1.5;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| {
            w.level == WarnLevel::Error && w.message.contains("min_confidence")
        }));
    }

    #[test]
    fn validate_target_level_out_of_range() {
        let mut cfg = RippConfig::new("test-project");
        cfg.discovery.target_level = 4;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("target_level")));
    }

    #[test]
    fn validate_ai_provider_without_model() {
        let mut cfg = RippConfig::new("test-project");
        cfg.discovery.provider = "anthropic".to_string();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("needs discovery.model")));
    }

    #[test]
    fn load_without_init_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = RippConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = RippConfig::new("proj");
        cfg.discovery.target_level = 3;
        cfg.save(dir.path()).unwrap();
        let loaded = RippConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.discovery.target_level, 3);
        assert_eq!(loaded.project.name, "proj");
    }
}
