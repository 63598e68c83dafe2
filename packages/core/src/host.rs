//! # Host Interfaces
//!
//! The pipeline never touches a concrete editor or DOM. Everything it
//! consumes from the environment goes through these traits:
//!
//! - [`Editor`]: selection, length, embed insertion, the editable root and
//!   a local executor for the asynchronous half of a drop
//! - [`DocumentNode`]: element construction and attachment
//! - [`EventNode`]: event subscription
//! - [`DropEvent`]: the fields of a drop event the pipeline reads
//! - [`DroppedFile`]: MIME type and byte content of one dropped file
//!
//! Hosts are single-threaded and event-driven, so every method takes
//! `&self` (DOM-style interior mutability) and futures are `!Send`.

use crate::errors::DropError;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Embed kind used for the `img` tag
pub const IMAGE_EMBED: &str = "image";

/// Current editor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }
}

/// Handle to a file dropped from the operating system.
///
/// Handles are cheap to clone; the content is only read on demand.
pub trait DroppedFile: Clone + 'static {
    fn name(&self) -> String;

    /// MIME type reported by the environment (may be empty)
    fn mime_type(&self) -> String;

    /// Read the whole file
    fn read(&self) -> LocalBoxFuture<'static, Result<Vec<u8>, DropError>>;
}

/// Node of the host document
pub trait DocumentNode: Clone + 'static {
    /// Whether the node carries the drop-target marker. Marked nodes
    /// receive generic elements directly; otherwise they go to the container.
    fn is_drop_target(&self) -> bool;

    /// Create a detached element owned by the same document
    fn create_element(&self, tag: &str) -> Result<Self, DropError>;

    fn set_attribute(&self, name: &str, value: &str) -> Result<(), DropError>;

    fn append_child(&self, child: &Self) -> Result<(), DropError>;
}

/// Node that can dispatch events to subscribed listeners
pub trait EventNode: Clone + 'static {
    type Event;

    /// Host representation of a subscribed handler
    type Listener;

    /// Wrap a Rust handler into the host's listener type
    fn bind(&self, handler: Rc<dyn Fn(&Self::Event)>) -> Self::Listener;

    fn add_event_listener(&self, event_name: &str, listener: &Self::Listener) -> Result<(), DropError>;

    fn remove_event_listener(&self, event_name: &str, listener: &Self::Listener) -> Result<(), DropError>;
}

/// The parts of a drop event the pipeline reads
pub trait DropEvent {
    type File: DroppedFile;
    type Node;

    /// Dropped files, in the order the environment lists them
    fn files(&self) -> Vec<Self::File>;

    /// Node the files were dropped on
    fn target(&self) -> Option<Self::Node>;

    fn prevent_default(&self);

    fn stop_propagation(&self);
}

/// Rich-text editor hosting the drop module
pub trait Editor: 'static {
    type File: DroppedFile;
    type Node: DocumentNode + EventNode<Event = Self::Event>;
    type Event: DropEvent<File = Self::File, Node = Self::Node>;

    /// Current selection, `None` when the editor is not focused
    fn selection(&self) -> Option<Selection>;

    /// Document length in editor positions
    fn length(&self) -> usize;

    /// Insert an embedded object at `index`
    fn insert_embed(&self, index: usize, kind: &str, payload: &str) -> Result<(), DropError>;

    /// Editable region, used as the default container
    fn editable_root(&self) -> Self::Node;

    /// Run a task on the host's event loop
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}
