//! Symbol pattern templates and the YAML pattern config.
//!
//! A pattern describes one identifier family, e.g. the plenary drafts of a
//! session:
//!
//! ```yaml
//! patterns:
//!   - name: ga_plenary_drafts
//!     template: "A/{session}/L.{number}"
//!     session: 80
//!     start: 1
//! ```
//!
//! Every key other than `name`, `template` and `start` is a fixed integer
//! variable. `{number}` is the counter the crawler advances.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::ConfigError;

/// Placeholder filled with the crawler cursor.
pub const NUMBER_PLACEHOLDER: &str = "number";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template such as `A/{session}/L.{number}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string. `pattern` is only used for error messages.
    pub fn parse(pattern: &str, source: &str) -> Result<Self, ConfigError> {
        let err = |reason: &str| ConfigError::Template {
            pattern: pattern.to_string(),
            template: source.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        if c == '{' {
                            return Err(err("nested '{'"));
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(err("unclosed '{'"));
                    }
                    if !is_identifier(&name) {
                        return Err(err(&format!("invalid placeholder name {name:?}")));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(err("unmatched '}'")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One identifier family. Immutable once built; every placeholder is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub name: String,
    pub template: Template,
    pub fixed_vars: BTreeMap<String, i64>,
    pub start: i64,
}

impl Pattern {
    /// Build and validate a pattern.
    pub fn new(
        name: impl Into<String>,
        template: &str,
        fixed_vars: BTreeMap<String, i64>,
        start: i64,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if fixed_vars.contains_key(NUMBER_PLACEHOLDER) {
            return Err(ConfigError::ReservedVariable {
                pattern: name,
                name: NUMBER_PLACEHOLDER.to_string(),
            });
        }

        let template = Template::parse(&name, template)?;
        let mut has_number = false;
        for placeholder in template.placeholders() {
            if placeholder == NUMBER_PLACEHOLDER {
                has_number = true;
            } else if !fixed_vars.contains_key(placeholder) {
                return Err(ConfigError::UnboundPlaceholder {
                    pattern: name,
                    placeholder: placeholder.to_string(),
                });
            }
        }
        if !has_number {
            return Err(ConfigError::MissingNumber(name));
        }

        Ok(Self {
            name,
            template,
            fixed_vars,
            start,
        })
    }

    /// Render the symbol at `number`, e.g. `A/80/L.12`.
    pub fn render(&self, number: i64) -> String {
        let mut out = String::with_capacity(self.template.source.len() + 8);
        for segment in &self.template.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) if name == NUMBER_PLACEHOLDER => {
                    let _ = write!(out, "{number}");
                }
                Segment::Placeholder(name) => {
                    // Bound at construction.
                    let value = self.fixed_vars.get(name).copied().unwrap_or_default();
                    let _ = write!(out, "{value}");
                }
            }
        }
        out
    }
}

// ── YAML config ──

#[derive(Deserialize)]
struct PatternFile {
    #[serde(default)]
    patterns: Vec<PatternEntry>,
}

#[derive(Deserialize)]
struct PatternEntry {
    name: String,
    template: String,
    #[serde(default = "default_start")]
    start: i64,
    #[serde(flatten)]
    fixed_vars: BTreeMap<String, i64>,
}

fn default_start() -> i64 {
    1
}

/// Parse and validate patterns from YAML text.
pub fn parse_patterns(yaml: &str) -> Result<Vec<Pattern>, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: PatternFile = serde_yaml::from_str(yaml)?;

    let mut seen = HashSet::new();
    let mut patterns = Vec::with_capacity(file.patterns.len());
    for entry in file.patterns {
        let pattern = Pattern::new(entry.name, &entry.template, entry.fixed_vars, entry.start)?;
        if !seen.insert(pattern.name.clone()) {
            return Err(ConfigError::DuplicateName(pattern.name));
        }
        patterns.push(pattern);
    }
    Ok(patterns)
}

/// Load the ordered pattern list from a YAML file.
pub fn load_patterns(path: &Path) -> Result<Vec<Pattern>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let patterns = parse_patterns(&yaml)?;
    debug!(path = %path.display(), count = patterns.len(), "loaded patterns");
    Ok(patterns)
}
