//! Construction options of the drop module

use crate::host::Editor;
use crate::resolver::DropHook;
use crate::rules::RawDraggable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serializable part of the options (config files, JS option objects)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropConfig {
    /// Rules, in matching order
    #[serde(default = "default_draggables")]
    pub draggables: Vec<RawDraggable>,
}

fn default_draggables() -> Vec<RawDraggable> {
    vec![RawDraggable::image()]
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            draggables: default_draggables(),
        }
    }
}

impl DropConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Options for [`crate::DragAndDrop::new`]
pub struct DropOptions<E: Editor> {
    /// Node the drop listener is attached to. Defaults to the editor's
    /// editable root.
    pub container: Option<E::Node>,

    pub draggables: Vec<RawDraggable>,

    pub on_drop: Option<DropHook<E::File>>,
}

impl<E: Editor> DropOptions<E> {
    pub fn from_config(config: DropConfig) -> Self {
        Self {
            container: None,
            draggables: config.draggables,
            on_drop: None,
        }
    }

    pub fn with_container(mut self, container: E::Node) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_draggables(mut self, draggables: Vec<RawDraggable>) -> Self {
        self.draggables = draggables;
        self
    }

    pub fn with_hook(mut self, hook: DropHook<E::File>) -> Self {
        self.on_drop = Some(hook);
        self
    }
}

impl<E: Editor> Default for DropOptions<E> {
    fn default() -> Self {
        Self::from_config(DropConfig::default())
    }
}

impl<E: Editor> fmt::Debug for DropOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropOptions")
            .field("container", &self.container.as_ref().map(|_| "<node>"))
            .field("draggables", &self.draggables)
            .field("on_drop", &self.on_drop)
            .finish()
    }
}
