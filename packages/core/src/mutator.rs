//! # Document Mutator
//!
//! Applies resolved insertions to the host document, one at a time and in
//! the order the files were dropped.
//!
//! The `img` tag goes through the editor's embed mechanism at the current
//! selection (or the end of the document). Any other tag becomes a plain
//! element appended to the drop node.

use crate::errors::DropError;
use crate::host::{DocumentNode, Editor, IMAGE_EMBED};
use crate::resolver::ResolvedInsertion;
use serde::Serialize;

/// Tag inserted as an embedded image rather than a generic element
pub const IMAGE_TAG: &str = "img";

/// What happened to one dropped file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum FileOutcome {
    /// Inserted through the editor's embed call at `index`
    Embedded { file: String, index: usize },

    /// Appended to the drop node as a `tag` element
    Appended { file: String, tag: String },

    /// The drop hook declined the file
    Vetoed { file: String },

    Failed { file: String, error: DropError },
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            FileOutcome::Embedded { file, .. }
            | FileOutcome::Appended { file, .. }
            | FileOutcome::Vetoed { file }
            | FileOutcome::Failed { file, .. } => file,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, FileOutcome::Embedded { .. } | FileOutcome::Appended { .. })
    }
}

/// Apply a whole batch in order
pub fn apply<E: Editor>(
    editor: &E,
    node: &E::Node,
    insertions: impl IntoIterator<Item = ResolvedInsertion>,
) -> Vec<FileOutcome> {
    insertions
        .into_iter()
        .map(|insertion| apply_one(editor, node, insertion))
        .collect()
}

/// Apply a single insertion. Host failures are reported in the outcome.
pub fn apply_one<E: Editor>(editor: &E, node: &E::Node, insertion: ResolvedInsertion) -> FileOutcome {
    let ResolvedInsertion {
        file_name,
        data,
        tag,
        attribute,
    } = insertion;

    let Some(data) = data else {
        tracing::debug!("{} vetoed by drop hook", file_name);
        return FileOutcome::Vetoed { file: file_name };
    };

    let result = if tag == IMAGE_TAG {
        insert_image(editor, &data).map(|index| FileOutcome::Embedded {
            file: file_name.clone(),
            index,
        })
    } else {
        append_element(node, &tag, &attribute, &data).map(|()| FileOutcome::Appended {
            file: file_name.clone(),
            tag: tag.clone(),
        })
    };

    result.unwrap_or_else(|error| {
        tracing::warn!("Failed to insert {}: {}", file_name, error);
        FileOutcome::Failed {
            file: file_name,
            error,
        }
    })
}

fn insert_image<E: Editor>(editor: &E, data: &str) -> Result<usize, DropError> {
    let index = match editor.selection() {
        Some(range) => range.index,
        None => editor.length(),
    };

    editor.insert_embed(index, IMAGE_EMBED, data)?;
    Ok(index)
}

fn append_element<N: DocumentNode>(node: &N, tag: &str, attribute: &str, data: &str) -> Result<(), DropError> {
    let element = node.create_element(tag)?;
    element.set_attribute(attribute, data)?;
    node.append_child(&element)
}
