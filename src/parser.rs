//! Skill file parsing.
//!
//! A skill is a markdown file with optional frontmatter between `---`
//! fences. The frontmatter understands the small YAML subset skill authors
//! actually use:
//!
//! ```text
//! ---
//! id: react-hooks
//! name: "React Hooks"
//! tags: [react, hooks]
//! domain: frontend
//! description: >
//!   Patterns for custom hooks
//!   and effect cleanup.
//! ---
//! ```
//!
//! Block lists (`- item` lines under an empty key) and `|`/`>` block
//! scalars are also accepted. Anything fancier is read as a plain string.
//!
//! Missing fields are derived: the id from the file name (or the parent
//! directory for `SKILL.md`), the description from the first body
//! paragraph that is not a heading, the name from the id.

use anyhow::{bail, Context, Result};
use skill_harness_core::models::SkillMetadata;
use std::collections::HashMap;
use std::path::Path;

const FENCE: &str = "---";
const MAX_DERIVED_DESCRIPTION: usize = 200;

const DEFAULT_DOMAIN: &str = "general";
const DEFAULT_SCENARIO: &str = "development";
const DEFAULT_LEVEL: &str = "intermediate";

#[derive(Debug, Clone, PartialEq)]
enum FrontValue {
    Scalar(String),
    List(Vec<String>),
}

impl FrontValue {
    fn as_str(&self) -> Option<&str> {
        match self {
            FrontValue::Scalar(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Split `raw` into `(frontmatter, body)`.
///
/// Frontmatter is recognized only when the very first line is `---`. An
/// opening fence without a closing one is an error.
fn split_frontmatter(raw: &str) -> Result<(Option<&str>, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.split_inclusive('\n');

    let first = match lines.next() {
        Some(line) => line,
        None => return Ok((None, raw)),
    };
    if first.trim_end() != FENCE {
        return Ok((None, raw));
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == FENCE {
            return Ok((Some(&raw[start..offset]), &raw[offset + line.len()..]));
        }
        offset += line.len();
    }
    bail!("Unterminated frontmatter: missing closing '---'")
}

/// Markdown body of a skill file without its frontmatter.
///
/// Malformed frontmatter leaves the content untouched.
pub fn strip_frontmatter(raw: &str) -> &str {
    match split_frontmatter(raw) {
        Ok((_, body)) => body,
        Err(_) => raw,
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 {
        if value.starts_with('"') && value.ends_with('"') {
            return value[1..value.len() - 1]
                .replace("\\\"", "\"")
                .replace("\\\\", "\\");
        }
        if value.starts_with('\'') && value.ends_with('\'') {
            return value[1..value.len() - 1].replace("''", "'");
        }
    }
    value.to_string()
}

fn parse_inline_list(value: &str) -> Vec<String> {
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(unquote)
        .filter(|item| !item.is_empty())
        .collect()
}

fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Parse top-level `key: value` pairs of the frontmatter block.
fn parse_fields(frontmatter: &str) -> HashMap<String, FrontValue> {
    let lines: Vec<&str> = frontmatter.lines().collect();
    let mut fields = HashMap::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || is_indented(line) {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();

        if value.is_empty() {
            let mut items = Vec::new();
            while i < lines.len() {
                let next = lines[i].trim();
                if let Some(item) = next.strip_prefix("- ").or_else(|| {
                    (next == "-").then_some("")
                }) {
                    let item = unquote(item);
                    if !item.is_empty() {
                        items.push(item);
                    }
                    i += 1;
                } else if next.is_empty() {
                    i += 1;
                } else {
                    break;
                }
            }
            let parsed = if items.is_empty() {
                FrontValue::Scalar(String::new())
            } else {
                FrontValue::List(items)
            };
            fields.insert(key, parsed);
        } else if matches!(value, "|" | "|-" | ">" | ">-") {
            let mut block = Vec::new();
            while i < lines.len() && (is_indented(lines[i]) || lines[i].trim().is_empty()) {
                block.push(lines[i].trim());
                i += 1;
            }
            while block.last().is_some_and(|l| l.is_empty()) {
                block.pop();
            }
            let sep = if value.starts_with('|') { "\n" } else { " " };
            fields.insert(key, FrontValue::Scalar(block.join(sep)));
        } else if value.starts_with('[') && value.ends_with(']') {
            fields.insert(key, FrontValue::List(parse_inline_list(value)));
        } else {
            fields.insert(key, FrontValue::Scalar(unquote(value)));
        }
    }

    fields
}

/// First body paragraph that is not a heading, cut to 200 characters.
fn first_paragraph(body: &str) -> String {
    let body = body.replace("\r\n", "\n");
    body.split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .map(|p| p.chars().take(MAX_DERIVED_DESCRIPTION).collect())
        .unwrap_or_default()
}

fn derive_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem == "SKILL" {
        if let Some(dir) = path.parent().and_then(|p| p.file_name()) {
            return dir.to_string_lossy().to_string();
        }
    }
    stem
}

/// Parse skill metadata from file content. `file` is set to `path` as given.
pub fn parse_skill(path: &Path, raw: &str) -> Result<SkillMetadata> {
    let (frontmatter, body) = split_frontmatter(raw)?;
    let fields = frontmatter.map(parse_fields).unwrap_or_default();
    let scalar = |key: &str| fields.get(key).and_then(FrontValue::as_str).map(str::to_string);

    let id = scalar("id").unwrap_or_else(|| derive_id(path));
    if id.is_empty() {
        bail!("Cannot derive a skill id for {}", path.display());
    }

    let description = scalar("description").unwrap_or_else(|| first_paragraph(body));
    let name = scalar("name").unwrap_or_else(|| id.replace('-', " "));
    let tags = match fields.get("tags") {
        Some(FrontValue::List(items)) => items.clone(),
        _ => Vec::new(),
    };

    Ok(SkillMetadata {
        name,
        description,
        tags,
        domain: scalar("domain").unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
        scenario: scalar("scenario").unwrap_or_else(|| DEFAULT_SCENARIO.to_string()),
        level: scalar("level").unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
        file: path.to_string_lossy().to_string(),
        version: scalar("version"),
        id,
    })
}

/// Read and parse one skill file.
pub fn parse_skill_file(path: &Path) -> Result<SkillMetadata> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read skill file: {}", path.display()))?;
    parse_skill(path, &raw).with_context(|| format!("Failed to parse {}", path.display()))
}
