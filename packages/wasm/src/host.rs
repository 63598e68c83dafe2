//! Browser implementations of the host traits: DOM elements, drop events,
//! `File` objects and a Quill instance reached through reflection.

use dropzone_core::{DocumentNode, DropError, DropEvent, DroppedFile, Editor, EventNode, Selection};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use js_sys::{Array, Function, Reflect, Uint8Array};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DragEvent, Element, File};

/// Property that marks an element as a drop target
pub const DROP_TARGET_MARKER: &str = "ql-data";

/// Selector of Quill's editable region inside its container
pub const EDITOR_SELECTOR: &str = ".ql-editor";

/// Best-effort message of a thrown JS value
pub fn js_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn host_error(value: JsValue) -> DropError {
    DropError::Host(js_message(&value))
}

/// Call `target[name](...args)`
pub fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, JsValue> {
    let method = Reflect::get(target, &JsValue::from_str(name))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("{} is not a function", name)))?;
    method.apply(target, args)
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WebFile(pub File);

impl DroppedFile for WebFile {
    fn name(&self) -> String {
        self.0.name()
    }

    fn mime_type(&self) -> String {
        self.0.type_()
    }

    fn read(&self) -> LocalBoxFuture<'static, Result<Vec<u8>, DropError>> {
        let name = self.0.name();
        let buffer = JsFuture::from(self.0.array_buffer());

        async move {
            let buffer = buffer.await.map_err(|err| DropError::read(&name, js_message(&err)))?;
            Ok(Uint8Array::new(&buffer).to_vec())
        }
        .boxed_local()
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

pub type WebListener = Closure<dyn Fn(web_sys::Event)>;

#[derive(Debug, Clone)]
pub struct WebNode(pub Element);

impl DocumentNode for WebNode {
    fn is_drop_target(&self) -> bool {
        Reflect::get(&self.0, &JsValue::from_str(DROP_TARGET_MARKER))
            .map(|marker| marker.is_truthy())
            .unwrap_or(false)
    }

    fn create_element(&self, tag: &str) -> Result<Self, DropError> {
        let document = self
            .0
            .owner_document()
            .ok_or_else(|| DropError::Host("Element has no owner document".to_string()))?;
        document.create_element(tag).map(WebNode).map_err(host_error)
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<(), DropError> {
        self.0.set_attribute(name, value).map_err(host_error)
    }

    fn append_child(&self, child: &Self) -> Result<(), DropError> {
        self.0.append_child(&child.0).map(|_| ()).map_err(host_error)
    }
}

impl EventNode for WebNode {
    type Event = WebDropEvent;
    type Listener = WebListener;

    fn bind(&self, handler: Rc<dyn Fn(&WebDropEvent)>) -> WebListener {
        Closure::new(move |event: web_sys::Event| handler(&WebDropEvent(event)))
    }

    fn add_event_listener(&self, event_name: &str, listener: &WebListener) -> Result<(), DropError> {
        self.0
            .add_event_listener_with_callback(event_name, listener.as_ref().unchecked_ref())
            .map_err(host_error)
    }

    fn remove_event_listener(&self, event_name: &str, listener: &WebListener) -> Result<(), DropError> {
        self.0
            .remove_event_listener_with_callback(event_name, listener.as_ref().unchecked_ref())
            .map_err(host_error)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub struct WebDropEvent(pub web_sys::Event);

impl DropEvent for WebDropEvent {
    type File = WebFile;
    type Node = WebNode;

    fn files(&self) -> Vec<WebFile> {
        let Some(files) = self
            .0
            .dyn_ref::<DragEvent>()
            .and_then(|event| event.data_transfer())
            .and_then(|transfer| transfer.files())
        else {
            return Vec::new();
        };

        (0..files.length())
            .filter_map(|index| files.item(index))
            .map(WebFile)
            .collect()
    }

    fn target(&self) -> Option<WebNode> {
        self.0
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .map(WebNode)
    }

    fn prevent_default(&self) {
        self.0.prevent_default();
    }

    fn stop_propagation(&self) {
        self.0.stop_propagation();
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// A Quill instance driven through its public JS API
pub struct QuillEditor {
    quill: JsValue,
    root: WebNode,
}

impl QuillEditor {
    /// Wrap `quill`, locating the editable region inside `quill.container`
    pub fn new(quill: JsValue) -> Result<Self, JsValue> {
        let container = Reflect::get(&quill, &JsValue::from_str("container"))?
            .dyn_into::<Element>()
            .map_err(|_| JsValue::from_str("quill.container is not an element"))?;
        let root = container
            .query_selector(EDITOR_SELECTOR)?
            .ok_or_else(|| JsValue::from_str(&format!("No {} element in quill.container", EDITOR_SELECTOR)))?;

        Ok(Self {
            quill,
            root: WebNode(root),
        })
    }

    pub fn quill(&self) -> &JsValue {
        &self.quill
    }
}

fn read_index(value: &JsValue, key: &str) -> Option<usize> {
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|index| index.as_f64())
        .filter(|index| *index >= 0.0)
        .map(|index| index as usize)
}

impl Editor for QuillEditor {
    type File = WebFile;
    type Node = WebNode;
    type Event = WebDropEvent;

    fn selection(&self) -> Option<Selection> {
        let range = call_method(&self.quill, "getSelection", &Array::new()).ok()?;
        if range.is_null() || range.is_undefined() {
            return None;
        }

        Some(Selection {
            index: read_index(&range, "index")?,
            length: read_index(&range, "length").unwrap_or(0),
        })
    }

    fn length(&self) -> usize {
        call_method(&self.quill, "getLength", &Array::new())
            .ok()
            .and_then(|length| length.as_f64())
            .map(|length| length as usize)
            .unwrap_or(0)
    }

    fn insert_embed(&self, index: usize, kind: &str, payload: &str) -> Result<(), DropError> {
        let args = Array::of3(
            &JsValue::from_f64(index as f64),
            &JsValue::from_str(kind),
            &JsValue::from_str(payload),
        );
        call_method(&self.quill, "insertEmbed", &args)
            .map(|_| ())
            .map_err(host_error)
    }

    fn editable_root(&self) -> WebNode {
        self.root.clone()
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
