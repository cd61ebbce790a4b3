use crate::error::{Result, RippError};
use crate::paths::{self, PACKET_SUFFIX};
use crate::section::SectionKind;
use serde_json::Value;
use std::path::Path;

/// Bundled copy of the externally versioned packet schema. The schema is a
/// contract this pipeline consumes, not one it owns; `--schema` can point at
/// a newer revision.
pub const BUNDLED_SCHEMA: &str = include_str!("../schema/ripp-v1.schema.json");

// ---------------------------------------------------------------------------
// Options / result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Reject structurally valid packets below this completeness tier.
    pub min_level: Option<u8>,
}

#[derive(Debug, Default)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Level derivable from the sections actually present.
    pub level: Option<u8>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn load_schema(path: Option<&Path>) -> Result<Value> {
    let text = match path {
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| RippError::SchemaResource(format!("{}: {e}", p.display())))?,
        None => BUNDLED_SCHEMA.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| RippError::SchemaResource(e.to_string()))
}

/// Validate a packet file: YAML parse, schema layer, convention layer.
pub fn validate_packet_file(
    path: &Path,
    schema: &Value,
    options: &ValidateOptions,
) -> Result<Validation> {
    let text = std::fs::read_to_string(path)?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&text)?;
    let doc = serde_json::to_value(&yaml)?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    Ok(validate_packet(&doc, schema, file_name, options))
}

/// Validate a canonical packet document.
///
/// Two independent layers: (1) structural schema validation, (2) convention
/// checks that produce clearer messages than raw schema errors (kebab-case
/// identifier, filename suffix, level-based field presence). Every defect is
/// collected; nothing short-circuits.
pub fn validate_packet(
    doc: &Value,
    schema: &Value,
    file_name: Option<&str>,
    options: &ValidateOptions,
) -> Validation {
    let mut result = Validation::default();

    schema_layer(doc, schema, &mut result);
    convention_layer(doc, file_name, options, &mut result);

    result.valid = result.errors.is_empty();
    result
}

// ---------------------------------------------------------------------------
// Layer 1: schema
// ---------------------------------------------------------------------------

fn schema_layer(doc: &Value, schema: &Value, result: &mut Validation) {
    let validator = match jsonschema::validator_for(schema) {
        Ok(v) => v,
        Err(e) => {
            result.errors.push(format!("schema resource error: {e}"));
            return;
        }
    };
    for error in validator.iter_errors(doc) {
        let location = error.instance_path.to_string();
        if location.is_empty() {
            result.errors.push(format!("schema: {error}"));
        } else {
            result.errors.push(format!("schema: {location}: {error}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Layer 2: conventions
// ---------------------------------------------------------------------------

fn convention_layer(
    doc: &Value,
    file_name: Option<&str>,
    options: &ValidateOptions,
    result: &mut Validation,
) {
    if let Some(name) = file_name {
        if !name.ends_with(PACKET_SUFFIX) {
            result.warnings.push(format!(
                "file '{name}' should use the '{PACKET_SUFFIX}' suffix"
            ));
        }
    }

    if let Some(id) = doc.get("packet_id").and_then(Value::as_str) {
        if paths::validate_packet_id(id).is_err() {
            result.errors.push(format!(
                "packet_id '{id}' must be lowercase alphanumeric with hyphens"
            ));
        }
    }

    let derived = derive_level(doc);
    result.level = Some(derived);

    if let Some(declared) = doc.get("level").and_then(Value::as_u64) {
        if declared > u64::from(derived) {
            // Friendlier than the raw schema error: name each missing field.
            for kind in missing_for_level(doc, declared as u8) {
                result.errors.push(format!(
                    "Level {declared} requires '{kind}' (missing)"
                ));
            }
        } else if declared < u64::from(derived) {
            result.warnings.push(format!(
                "packet declares level {declared} but qualifies for level {derived}"
            ));
        }
    }

    if let Some(min) = options.min_level {
        if derived < min {
            result.errors.push(format!(
                "packet is level {derived} but minimum level {min} is required"
            ));
        }
    }
}

fn section_present(doc: &Value, kind: SectionKind) -> bool {
    matches!(doc.get(kind.as_str()), Some(v) if !v.is_null())
}

fn derive_level(doc: &Value) -> u8 {
    let has_all = |kinds: &[SectionKind]| kinds.iter().all(|k| section_present(doc, *k));
    if !has_all(SectionKind::level2_required()) {
        return 1;
    }
    if !has_all(SectionKind::level3_required()) {
        return 2;
    }
    3
}

fn missing_for_level(doc: &Value, declared: u8) -> Vec<SectionKind> {
    let mut required: Vec<SectionKind> = Vec::new();
    if declared >= 2 {
        required.extend_from_slice(SectionKind::level2_required());
    }
    if declared >= 3 {
        required.extend_from_slice(SectionKind::level3_required());
    }
    required
        .into_iter()
        .filter(|k| !section_present(doc, *k))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
