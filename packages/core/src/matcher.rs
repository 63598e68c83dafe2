//! File Matcher: pairs dropped files with their first matching rule

use crate::host::DroppedFile;
use crate::rules::RuleRegistry;
use serde::{Deserialize, Serialize};

/// Tag and attribute a file is inserted as. Passed to the drop hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTarget {
    pub tag: String,
    #[serde(rename = "attr")]
    pub attribute: String,
}

/// A dropped file paired with the rule that accepted it
#[derive(Debug, Clone)]
pub struct MatchedFile<F> {
    /// Position in the original file list
    pub index: usize,
    pub file: F,
    pub tag: String,
    pub attribute: String,
}

impl<F> MatchedFile<F> {
    pub fn target(&self) -> RuleTarget {
        RuleTarget {
            tag: self.tag.clone(),
            attribute: self.attribute.clone(),
        }
    }
}

/// Select the files some rule accepts, keeping their original order.
///
/// Files no rule accepts are dropped silently; an empty result means the
/// drop belongs to someone else.
pub fn match_files<F, I>(files: I, registry: &RuleRegistry) -> Vec<MatchedFile<F>>
where
    F: DroppedFile,
    I: IntoIterator<Item = F>,
{
    files
        .into_iter()
        .enumerate()
        .filter_map(|(index, file)| {
            let mime_type = file.mime_type();
            let Some(rule) = registry.find(&mime_type) else {
                tracing::trace!("No draggable for {} ({})", file.name(), mime_type);
                return None;
            };

            tracing::trace!("{} ({}) matched {}", file.name(), mime_type, rule.pattern());
            Some(MatchedFile {
                index,
                tag: rule.tag().to_string(),
                attribute: rule.attribute().to_string(),
                file,
            })
        })
        .collect()
}
