use crate::candidate::CandidateSet;
use crate::confirm::ConfirmedBlock;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Render a candidate set as the human-editable checklist document.
///
/// Deterministic, append-only generation: one numbered section per candidate
/// with an unchecked box, a fenced YAML content block, and the evidence
/// references the candidate cites.
pub fn render_checklist(set: &CandidateSet) -> String {
    let mut out = String::new();
    out.push_str("# RIPP Discovery Checklist\n\n");
    let _ = writeln!(
        out,
        "Generated by: {}{} (evidence pack {})",
        set.generated_by.provider,
        set.generated_by
            .model
            .as_deref()
            .map(|m| format!("/{m}"))
            .unwrap_or_default(),
        set.generated_by.evidence_pack_hash
    );
    out.push_str("\nMark `[x]` to accept a candidate; leave `[ ]` to drop it.\n");
    out.push_str("Content blocks may be edited freely before accepting.\n");

    for (i, candidate) in set.candidates.iter().enumerate() {
        out.push_str("\n---\n\n");
        let _ = writeln!(
            out,
            "## {}. {} (confidence: {:.2})\n",
            i + 1,
            candidate.section,
            candidate.confidence
        );
        out.push_str("- [ ] Accept?\n\n");
        out.push_str("```yaml\n");
        let content = serde_yaml::to_string(&candidate.content).unwrap_or_default();
        out.push_str(&content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n\nEvidence:\n\n");
        for reference in &candidate.evidence {
            let _ = writeln!(out, "- {}:{}", reference.file, reference.line);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ChecklistParse {
    pub blocks: Vec<ConfirmedBlock>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();

fn header_re() -> &'static Regex {
    HEADER_RE.get_or_init(|| {
        Regex::new(
            r"^##\s+(?:\d+\.\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*(?:\(confidence:\s*([0-9]*\.?[0-9]+)\s*\))?\s*$",
        )
        .unwrap()
    })
}

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"^\s*-\s*\[([ xX])\]").unwrap())
}

/// One tokenized checklist line. Anything that is not a section header,
/// checkbox, or fence is prose and carries no structure. Every non-fence
/// token keeps the raw line so fenced content can be reassembled verbatim.
#[derive(Debug)]
enum Line<'a> {
    Header {
        raw: &'a str,
        section: &'a str,
        confidence: Option<f64>,
    },
    Checkbox {
        raw: &'a str,
        checked: bool,
    },
    Fence,
    Text(&'a str),
}

impl<'a> Line<'a> {
    fn raw(&self) -> &'a str {
        match self {
            Line::Header { raw, .. } | Line::Checkbox { raw, .. } | Line::Text(raw) => raw,
            Line::Fence => "",
        }
    }
}

fn tokenize(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .map(|raw| {
            if let Some(caps) = header_re().captures(raw) {
                let confidence = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
                Line::Header {
                    raw,
                    section: caps.get(1).unwrap().as_str(),
                    confidence,
                }
            } else if raw.trim_start().starts_with("```") {
                Line::Fence
            } else if let Some(caps) = checkbox_re().captures(raw) {
                Line::Checkbox {
                    raw,
                    checked: !caps[1].trim().is_empty(),
                }
            } else {
                Line::Text(raw)
            }
        })
        .collect()
}

/// Parse a (possibly hand-mangled) checklist back into confirmed blocks.
///
/// Recovery rules, in order of appearance in the grammar:
/// - CRLF is normalized before tokenizing;
/// - an empty document is a single error, as is a document with no section
///   headers at all;
/// - an unchecked section is skipped silently (a normal outcome, not a
///   defect);
/// - a checked section with no fenced block, an unterminated fence, or
///   unparseable YAML is excluded with an error naming the section;
/// - a repeated section id keeps the first occurrence and warns;
/// - stray prose between recognized blocks is ignored.
///
/// Results preserve document order.
pub fn parse_checklist(text: &str) -> ChecklistParse {
    let mut result = ChecklistParse::default();

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    if normalized.trim().is_empty() {
        result.errors.push("checklist document is empty".to_string());
        return result;
    }

    let lines = tokenize(&normalized);
    let header_indices: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| matches!(l, Line::Header { .. }).then_some(i))
        .collect();
    if header_indices.is_empty() {
        result
            .errors
            .push("no candidate sections found".to_string());
        return result;
    }

    let mut seen: HashSet<String> = HashSet::new();
    for (pos, &start) in header_indices.iter().enumerate() {
        let end = header_indices
            .get(pos + 1)
            .copied()
            .unwrap_or(lines.len());
        let Line::Header {
            section,
            confidence,
            ..
        } = &lines[start]
        else {
            continue;
        };

        if !seen.insert(section.to_string()) {
            result
                .warnings
                .push(format!("duplicate section '{section}' ignored (first occurrence wins)"));
            continue;
        }

        let span = &lines[start + 1..end];
        parse_section(section, *confidence, span, &mut result);
    }

    result
}

fn parse_section(
    section: &str,
    confidence: Option<f64>,
    span: &[Line<'_>],
    result: &mut ChecklistParse,
) {
    // The first checkbox before the content fence decides acceptance; a
    // checkbox-shaped line inside the fence is content, not a control. No
    // checkbox at all reads as unchecked.
    let checked = span
        .iter()
        .take_while(|l| !matches!(l, Line::Fence))
        .find_map(|l| match l {
            Line::Checkbox { checked, .. } => Some(*checked),
            _ => None,
        });
    if !checked.unwrap_or(false) {
        return;
    }

    let Some(open) = span.iter().position(|l| matches!(l, Line::Fence)) else {
        result.errors.push(format!("{section}: no content block found"));
        return;
    };
    let Some(close_offset) = span[open + 1..]
        .iter()
        .position(|l| matches!(l, Line::Fence))
    else {
        result
            .errors
            .push(format!("{section}: unterminated content block"));
        return;
    };

    // Raw lines, so checkbox- and header-shaped content survives verbatim.
    let content_text: String = span[open + 1..open + 1 + close_offset]
        .iter()
        .map(Line::raw)
        .collect::<Vec<_>>()
        .join("\n");

    match serde_yaml::from_str::<serde_yaml::Value>(&content_text) {
        Ok(content) => {
            let mut block = ConfirmedBlock::new(section, content);
            block.original_confidence = confidence;
            result.blocks.push(block);
        }
        Err(e) => {
            result
                .errors
                .push(format!("{section}: invalid content block: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
