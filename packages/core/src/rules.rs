//! # Rule Registry
//!
//! Draggable rules pair a MIME-type pattern with the element tag and
//! attribute a dropped file turns into.
//!
//! Raw descriptors come straight from configuration. Every field is
//! optional at the type level so that an incomplete descriptor can be
//! reported with the descriptor itself attached, rather than as an opaque
//! deserialization error.
//!
//! Patterns behave like JavaScript's `RegExp.test`: they search anywhere in
//! the MIME string, so anchor them (`^image/`) when a prefix is meant.

use crate::errors::ConfigurationError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pattern of the default rule
pub const IMAGE_CONTENT_TYPE_PATTERN: &str = "^image/";

/// Rule descriptor as it appears in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDraggable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl RawDraggable {
    pub fn new(
        content_type_pattern: impl Into<String>,
        tag: impl Into<String>,
        attr: impl Into<String>,
    ) -> Self {
        Self {
            content_type_pattern: Some(content_type_pattern.into()),
            tag: Some(tag.into()),
            attr: Some(attr.into()),
        }
    }

    /// `^image/` → `<img src>`
    pub fn image() -> Self {
        Self::new(IMAGE_CONTENT_TYPE_PATTERN, "img", "src")
    }
}

/// Compiled, immutable rule
#[derive(Debug, Clone)]
pub struct DraggableRule {
    matcher: Regex,
    tag: String,
    attribute: String,
}

impl DraggableRule {
    /// Validate and compile one descriptor
    pub fn compile(raw: &RawDraggable) -> Result<Self, ConfigurationError> {
        let (Some(pattern), Some(tag), Some(attribute)) = (
            present(&raw.content_type_pattern),
            present(&raw.tag),
            present(&raw.attr),
        ) else {
            return Err(ConfigurationError::IncompleteDraggable {
                draggable: raw.clone(),
            });
        };

        let matcher = Regex::new(pattern).map_err(|source| ConfigurationError::InvalidPattern {
            draggable: raw.clone(),
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            matcher,
            tag: tag.to_string(),
            attribute: attribute.to_string(),
        })
    }

    pub fn matches(&self, mime_type: &str) -> bool {
        self.matcher.is_match(mime_type)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Source of the compiled matcher (diagnostics only)
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Ordered set of compiled rules. First match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<DraggableRule>,
}

impl RuleRegistry {
    /// Compile every descriptor, failing on the first malformed one.
    /// Registration order is kept.
    pub fn compile(raw: &[RawDraggable]) -> Result<Self, ConfigurationError> {
        let rules = raw
            .iter()
            .map(DraggableRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// First rule (in registration order) accepting `mime_type`
    pub fn find(&self, mime_type: &str) -> Option<&DraggableRule> {
        self.rules.iter().find(|rule| rule.matches(mime_type))
    }

    pub fn rules(&self) -> &[DraggableRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
