//! Text templates for usage output.
//!
//! A template is literal text with `{{ .Field }}` actions. An action may pipe
//! the field through helpers: `{{ .Long | trim | capitalize }}`.
//!
//! Helpers:
//! - `trim` - strip surrounding whitespace
//! - `capitalize` - uppercase the first character
//! - `upper` / `lower` - change case of the whole value
//!
//! Actions may span lines. Fields are looked up at render time through
//! [`TemplateData`], so `{{.Name}}` can resolve to the running executable's name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex_lite::Regex;
use thiserror::Error;

/// Errors produced while parsing or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// An action was opened with `{{` but never closed.
    #[error("unterminated action at byte {0}")]
    Unterminated(usize),

    /// An action contains nothing.
    #[error("empty action at byte {0}")]
    EmptyAction(usize),

    /// An action is not of the form `.Field | helper ...`.
    #[error("malformed action {0:?}")]
    Malformed(String),

    /// A helper name that is not registered.
    #[error("unknown helper {0:?}")]
    UnknownHelper(String),

    /// The data source has no such field.
    #[error("unknown field {0:?}")]
    UnknownField(String),
}

/// Source of field values for rendering.
pub trait TemplateData {
    /// Value of `name`, or `None` if the field does not exist.
    fn field(&self, name: &str) -> Option<String>;
}

impl TemplateData for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A helper transforms a rendered field value.
pub type Helper = fn(&str) -> String;

/// Look up a built-in helper by name.
pub fn helper(name: &str) -> Option<Helper> {
    match name {
        "trim" => Some(trim),
        "capitalize" => Some(capitalize),
        "upper" => Some(upper),
        "lower" => Some(lower),
        _ => None,
    }
}

fn trim(s: &str) -> String {
    s.trim().to_string()
}

/// Uppercase the first character, leave the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn upper(s: &str) -> String {
    s.to_uppercase()
}

fn lower(s: &str) -> String {
    s.to_lowercase()
}

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").unwrap_or_else(|e| panic!("{e}")));

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.([A-Za-z_][A-Za-z0-9_]*)$").unwrap_or_else(|e| panic!("{e}"))
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field { name: String, helpers: Vec<String> },
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse and validate a template.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in ACTION_RE.captures_iter(text) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_text(&mut segments, &text[last..whole.start()], last)?;
            segments.push(parse_action(body.as_str(), whole.start())?);
            last = whole.end();
        }
        push_text(&mut segments, &text[last..], last)?;

        Ok(Self {
            source: text.to_string(),
            segments,
        })
    }

    /// The template source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of all fields referenced, in order of first appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Field { name, .. } = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Expand the template against `data`.
    pub fn render(&self, data: &dyn TemplateData) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field { name, helpers } => {
                    let mut value = data
                        .field(name)
                        .ok_or_else(|| TemplateError::UnknownField(name.clone()))?;
                    for helper_name in helpers {
                        // Helper names were validated by `parse`.
                        if let Some(apply) = helper(helper_name) {
                            value = apply(&value);
                        }
                    }
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str, at: usize) -> Result<(), TemplateError> {
    if let Some(pos) = text.find("{{") {
        return Err(TemplateError::Unterminated(at + pos));
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
    Ok(())
}

fn parse_action(body: &str, at: usize) -> Result<Segment, TemplateError> {
    let mut parts = body.split('|').map(str::trim);
    let head = parts.next().unwrap_or_default();
    if head.is_empty() {
        return Err(TemplateError::EmptyAction(at));
    }

    let name = FIELD_RE
        .captures(head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TemplateError::Malformed(body.trim().to_string()))?;

    let mut helpers = Vec::new();
    for part in parts {
        if part.is_empty() {
            return Err(TemplateError::Malformed(body.trim().to_string()));
        }
        if helper(part).is_none() {
            return Err(TemplateError::UnknownHelper(part.to_string()));
        }
        helpers.push(part.to_string());
    }

    Ok(Segment::Field { name, helpers })
}
