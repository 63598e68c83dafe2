//! # In-Memory Host
//!
//! A small editor, node tree and event model that live entirely in memory.
//! Used by the tests, the benchmarks and the command line tool.
//!
//! - [`MemoryEditor`]: a flat document of characters and embeds with a
//!   Quill-like selection that shifts past content inserted at the caret
//! - [`MemoryNode`]: a shared element node with attributes, children and
//!   event listeners
//! - [`MemoryDropEvent`]: a drop event that counts how often its default
//!   action and propagation were suppressed
//! - [`MemoryFile`]: a dropped file backed by a byte buffer (or a read
//!   error), counting how often it was read

use crate::errors::DropError;
use crate::host::{DocumentNode, DropEvent, DroppedFile, Editor, EventNode, Selection};
use futures::future::{self, join_all, LocalBoxFuture};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Dropped file held in memory
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    content: Result<Rc<[u8]>, String>,
    reads: Rc<Cell<usize>>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: Ok(Rc::from(content)),
            reads: Rc::new(Cell::new(0)),
        }
    }

    /// A file whose every read fails with `message`
    pub fn unreadable(name: impl Into<String>, mime_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: Err(message.into()),
            reads: Rc::new(Cell::new(0)),
        }
    }

    /// Number of times the content was read (shared between clones)
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl DroppedFile for MemoryFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn read(&self) -> LocalBoxFuture<'static, Result<Vec<u8>, DropError>> {
        self.reads.set(self.reads.get() + 1);

        let result = match &self.content {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(message) => Err(DropError::read(&self.name, message)),
        };
        future::ready(result).boxed_local()
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

pub type MemoryListener = Rc<dyn Fn(&MemoryDropEvent)>;

struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<MemoryNode>,
    drop_target: bool,
    listeners: Vec<(String, MemoryListener)>,
}

/// Shared element node. Clones refer to the same element.
#[derive(Clone)]
pub struct MemoryNode {
    inner: Rc<RefCell<NodeData>>,
}

/// Serializable copy of a node tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl MemoryNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeData {
                tag: tag.into(),
                attributes: BTreeMap::new(),
                children: Vec::new(),
                drop_target: false,
                listeners: Vec::new(),
            })),
        }
    }

    /// Element carrying the drop-target marker
    pub fn drop_target(tag: impl Into<String>) -> Self {
        let node = Self::element(tag);
        node.inner.borrow_mut().drop_target = true;
        node
    }

    pub fn tag(&self) -> String {
        self.inner.borrow().tag.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.borrow().attributes.get(name).cloned()
    }

    pub fn children(&self) -> Vec<MemoryNode> {
        self.inner.borrow().children.clone()
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event_name)
            .count()
    }

    /// Deliver `event` to every listener subscribed to `event_name`.
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event_name: &str, event: &MemoryDropEvent) -> usize {
        let listeners: Vec<MemoryListener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event_name)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn is_same_node(&self, other: &MemoryNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        let data = self.inner.borrow();
        NodeSnapshot {
            tag: data.tag.clone(),
            attributes: data.attributes.clone(),
            children: data.children.iter().map(MemoryNode::snapshot).collect(),
        }
    }

    /// Render the subtree as HTML (attribute values are escaped)
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let data = self.inner.borrow();
        out.push('<');
        out.push_str(&data.tag);
        for (name, value) in &data.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        out.push('>');
        for child in &data.children {
            child.write_html(out);
        }
        out.push_str(&format!("</{}>", data.tag));
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | '/' | '='))
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("MemoryNode")
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .field("children", &data.children.len())
            .field("drop_target", &data.drop_target)
            .finish()
    }
}

impl DocumentNode for MemoryNode {
    fn is_drop_target(&self) -> bool {
        self.inner.borrow().drop_target
    }

    fn create_element(&self, tag: &str) -> Result<Self, DropError> {
        if !is_valid_name(tag) {
            return Err(DropError::Host(format!("Invalid tag name: {:?}", tag)));
        }
        Ok(MemoryNode::element(tag))
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<(), DropError> {
        if !is_valid_name(name) {
            return Err(DropError::Host(format!("Invalid attribute name: {:?}", name)));
        }
        self.inner
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn append_child(&self, child: &Self) -> Result<(), DropError> {
        if self.is_same_node(child) {
            return Err(DropError::Host("Cannot append a node to itself".to_string()));
        }
        self.inner.borrow_mut().children.push(child.clone());
        Ok(())
    }
}

impl EventNode for MemoryNode {
    type Event = MemoryDropEvent;
    type Listener = MemoryListener;

    fn bind(&self, handler: Rc<dyn Fn(&MemoryDropEvent)>) -> MemoryListener {
        handler
    }

    fn add_event_listener(&self, event_name: &str, listener: &MemoryListener) -> Result<(), DropError> {
        self.inner
            .borrow_mut()
            .listeners
            .push((event_name.to_string(), Rc::clone(listener)));
        Ok(())
    }

    fn remove_event_listener(&self, event_name: &str, listener: &MemoryListener) -> Result<(), DropError> {
        let mut data = self.inner.borrow_mut();
        if let Some(position) = data
            .listeners
            .iter()
            .position(|(name, existing)| name == event_name && Rc::ptr_eq(existing, listener))
        {
            data.listeners.remove(position);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Drop event carrying in-memory files
pub struct MemoryDropEvent {
    files: Vec<MemoryFile>,
    target: Option<MemoryNode>,
    prevent_default_calls: Cell<usize>,
    stop_propagation_calls: Cell<usize>,
}

impl MemoryDropEvent {
    pub fn new(files: Vec<MemoryFile>) -> Self {
        Self {
            files,
            target: None,
            prevent_default_calls: Cell::new(0),
            stop_propagation_calls: Cell::new(0),
        }
    }

    pub fn on(mut self, target: MemoryNode) -> Self {
        self.target = Some(target);
        self
    }

    pub fn prevent_default_calls(&self) -> usize {
        self.prevent_default_calls.get()
    }

    pub fn stop_propagation_calls(&self) -> usize {
        self.stop_propagation_calls.get()
    }

    pub fn default_prevented(&self) -> bool {
        self.prevent_default_calls.get() > 0
    }
}

impl DropEvent for MemoryDropEvent {
    type File = MemoryFile;
    type Node = MemoryNode;

    fn files(&self) -> Vec<MemoryFile> {
        self.files.clone()
    }

    fn target(&self) -> Option<MemoryNode> {
        self.target.clone()
    }

    fn prevent_default(&self) {
        self.prevent_default_calls.set(self.prevent_default_calls.get() + 1);
    }

    fn stop_propagation(&self) {
        self.stop_propagation_calls.set(self.stop_propagation_calls.get() + 1);
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Leaf {
    Char(char),
    Embed { kind: String, payload: String },
}

/// Embed found in the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedSnapshot {
    pub index: usize,
    pub kind: String,
    pub payload: String,
}

/// Flat rich-text document with a selection and a queue of local tasks
pub struct MemoryEditor {
    leaves: RefCell<Vec<Leaf>>,
    selection: Cell<Option<Selection>>,
    root: MemoryNode,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self {
            leaves: RefCell::new(Vec::new()),
            selection: Cell::new(None),
            root: MemoryNode::element("div"),
            tasks: RefCell::new(Vec::new()),
        }
    }

    pub fn with_text(text: &str) -> Self {
        let editor = Self::new();
        editor.leaves.borrow_mut().extend(text.chars().map(Leaf::Char));
        editor
    }

    pub fn set_selection(&self, selection: Option<Selection>) {
        self.selection.set(selection);
    }

    pub fn embeds(&self) -> Vec<EmbedSnapshot> {
        self.leaves
            .borrow()
            .iter()
            .enumerate()
            .filter_map(|(index, leaf)| match leaf {
                Leaf::Embed { kind, payload } => Some(EmbedSnapshot {
                    index,
                    kind: kind.clone(),
                    payload: payload.clone(),
                }),
                Leaf::Char(_) => None,
            })
            .collect()
    }

    /// Text with embeds rendered inline as `[kind:payload]`
    pub fn text_with_embeds(&self) -> String {
        self.leaves
            .borrow()
            .iter()
            .map(|leaf| match leaf {
                Leaf::Char(c) => c.to_string(),
                Leaf::Embed { kind, payload } => format!("[{}:{}]", kind, payload),
            })
            .collect()
    }

    /// Contents as a Quill-style delta: `{"ops": [{"insert": ...}, ...]}`
    pub fn delta(&self) -> Value {
        let mut ops = Vec::new();
        let mut text = String::new();

        for leaf in self.leaves.borrow().iter() {
            match leaf {
                Leaf::Char(c) => text.push(*c),
                Leaf::Embed { kind, payload } => {
                    if !text.is_empty() {
                        ops.push(json!({ "insert": std::mem::take(&mut text) }));
                    }
                    let mut embed = Map::new();
                    embed.insert(kind.clone(), Value::String(payload.clone()));
                    ops.push(json!({ "insert": embed }));
                }
            }
        }
        if !text.is_empty() {
            ops.push(json!({ "insert": text }));
        }

        json!({ "ops": ops })
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Drive every spawned task (and tasks they spawn) to completion
    pub async fn run_pending(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                break;
            }
            join_all(tasks).await;
        }
    }
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor for MemoryEditor {
    type File = MemoryFile;
    type Node = MemoryNode;
    type Event = MemoryDropEvent;

    fn selection(&self) -> Option<Selection> {
        self.selection.get()
    }

    fn length(&self) -> usize {
        self.leaves.borrow().len()
    }

    fn insert_embed(&self, index: usize, kind: &str, payload: &str) -> Result<(), DropError> {
        let mut leaves = self.leaves.borrow_mut();
        if index > leaves.len() {
            return Err(DropError::Host(format!(
                "Embed index {} out of range (length {})",
                index,
                leaves.len()
            )));
        }

        leaves.insert(
            index,
            Leaf::Embed {
                kind: kind.to_string(),
                payload: payload.to_string(),
            },
        );

        // Content inserted at or before the caret pushes the selection forward
        if let Some(selection) = self.selection.get() {
            if index <= selection.index {
                self.selection.set(Some(Selection {
                    index: selection.index + 1,
                    length: selection.length,
                }));
            }
        }
        Ok(())
    }

    fn editable_root(&self) -> MemoryNode {
        self.root.clone()
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}
