//! Quill bindings for the drop module
//!
//! ```js
//! import { DragAndDrop, getFileDataUrl } from "dropzone-wasm";
//!
//! const dnd = new DragAndDrop(quill, {
//!   draggables: [{ contentTypePattern: "^image/", tag: "img", attr: "src" }],
//!   onDrop: (file, { tag, attr }) => (file.size > 1e6 ? false : null),
//! });
//!
//! dnd.destroy();
//! ```

mod host;

pub use host::{call_method, js_message, QuillEditor, WebDropEvent, WebFile, WebNode, DROP_TARGET_MARKER};

use dropzone_core::{
    read_data_url, ConfigurationError, DropConfig, DropError, DropHook, DropOptions, HookOutcome, InstallError,
    RawDraggable, RuleTarget, IMAGE_CONTENT_TYPE_PATTERN,
};
use js_sys::{Function, Object, Promise, Reflect, JSON};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, File};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn get(target: &JsValue, key: &str) -> Result<Option<JsValue>, JsValue> {
    let value = Reflect::get(target, &JsValue::from_str(key))?;
    Ok(if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(value)
    })
}

/// Map a value returned (or resolved) by `onDrop` to its outcome
pub fn hook_outcome(value: &JsValue) -> HookOutcome {
    if value.as_bool() == Some(false) {
        return HookOutcome::Veto;
    }
    if value.is_null() || value.is_undefined() {
        return HookOutcome::UseFallback;
    }
    if let Some(text) = value.as_string() {
        return HookOutcome::Override(text);
    }

    let text = JSON::stringify(value)
        .ok()
        .and_then(|text| text.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    HookOutcome::Override(text)
}

fn rule_target_object(target: &RuleTarget) -> Result<JsValue, JsValue> {
    let object = Object::new();
    Reflect::set(&object, &JsValue::from_str("tag"), &JsValue::from_str(&target.tag))?;
    Reflect::set(&object, &JsValue::from_str("attr"), &JsValue::from_str(&target.attribute))?;
    Ok(object.into())
}

/// Wrap a JS `onDrop(file, { tag, attr })` callback. Plain values and
/// promises are both accepted.
fn js_hook(callback: Function) -> DropHook<WebFile> {
    DropHook::new(move |file: WebFile, target: RuleTarget| {
        let returned = rule_target_object(&target)
            .and_then(|target| callback.call2(&JsValue::NULL, &file.0, &target));

        async move {
            let returned = returned.map_err(|err| DropError::Hook(js_message(&err)))?;
            let settled = JsFuture::from(Promise::resolve(&returned))
                .await
                .map_err(|err| DropError::Hook(js_message(&err)))?;
            Ok(hook_outcome(&settled))
        }
    })
}

fn parse_draggables(value: &JsValue) -> Result<Vec<RawDraggable>, JsValue> {
    let json = JSON::stringify(value)?
        .as_string()
        .ok_or_else(|| JsValue::from_str("draggables must be an array"))?;
    serde_json::from_str(&json).map_err(|err| JsValue::from_str(&format!("Invalid draggables: {}", err)))
}

fn parse_options(options: &JsValue) -> Result<DropOptions<QuillEditor>, JsValue> {
    let mut parsed = DropOptions::from_config(DropConfig::default());
    if options.is_null() || options.is_undefined() {
        return Ok(parsed);
    }

    if let Some(container) = get(options, "container")? {
        let container = container
            .dyn_into::<Element>()
            .map_err(|_| JsValue::from_str("options.container must be an element"))?;
        parsed = parsed.with_container(WebNode(container));
    }

    if let Some(draggables) = get(options, "draggables")? {
        parsed = parsed.with_draggables(parse_draggables(&draggables)?);
    }

    if let Some(on_drop) = get(options, "onDrop")? {
        let on_drop = on_drop
            .dyn_into::<Function>()
            .map_err(|_| JsValue::from_str("options.onDrop must be a function"))?;
        parsed = parsed.with_hook(js_hook(on_drop));
    }

    Ok(parsed)
}

/// `Error` carrying the offending descriptor as `invalidDraggable`
fn configuration_error(err: &ConfigurationError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    let draggable = serde_json::to_string(err.invalid_draggable())
        .ok()
        .and_then(|json| JSON::parse(&json).ok())
        .unwrap_or(JsValue::UNDEFINED);
    let _ = Reflect::set(&error, &JsValue::from_str("invalidDraggable"), &draggable);
    error.into()
}

fn install_error(err: InstallError) -> JsValue {
    match err {
        InstallError::Configuration(err) => configuration_error(&err),
        InstallError::Attach(err) => js_sys::Error::new(&err.to_string()).into(),
    }
}

/// Drop module attached to one Quill instance
#[wasm_bindgen(js_name = DragAndDrop)]
pub struct JsDragAndDrop {
    module: Rc<dropzone_core::DragAndDrop<QuillEditor>>,
}

#[wasm_bindgen(js_class = DragAndDrop)]
impl JsDragAndDrop {
    #[wasm_bindgen(constructor)]
    pub fn new(quill: JsValue, options: JsValue) -> Result<JsDragAndDrop, JsValue> {
        let editor = Rc::new(QuillEditor::new(quill)?);
        let options = parse_options(&options)?;
        let module = dropzone_core::DragAndDrop::install(editor, options).map_err(install_error)?;

        Ok(JsDragAndDrop { module })
    }

    /// Element the drop listener is attached to
    #[wasm_bindgen(getter)]
    pub fn container(&self) -> Element {
        self.module.container().0.clone()
    }

    #[wasm_bindgen(getter, js_name = listenerCount)]
    pub fn listener_count(&self) -> usize {
        self.module.listener_count()
    }

    /// Remove every listener the module registered
    pub fn destroy(&self) -> Result<(), JsValue> {
        self.module
            .detach()
            .map_err(|err| js_sys::Error::new(&err.to_string()).into())
    }
}

/// Read a `File` as a `data:` URL
#[wasm_bindgen(js_name = getFileDataUrl)]
pub fn get_file_data_url(file: File) -> Promise {
    wasm_bindgen_futures::future_to_promise(async move {
        read_data_url(&WebFile(file))
            .await
            .map(|url| JsValue::from_str(&url))
            .map_err(|err| js_sys::Error::new(&err.to_string()).into())
    })
}

#[wasm_bindgen(js_name = imageContentTypePattern)]
pub fn image_content_type_pattern() -> String {
    IMAGE_CONTENT_TYPE_PATTERN.to_string()
}
