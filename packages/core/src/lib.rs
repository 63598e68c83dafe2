//! # Dropzone Core
//!
//! File-drop pipeline for rich-text editors: files dragged in from the
//! operating system become document content at the cursor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ drop event on the container                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ matcher: files × rules → matched files      │
//! │  - first matching rule wins                 │
//! │  - no match → event left to the browser     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ resolver: hook / data URL, all concurrent   │
//! │  - Veto | UseFallback | Override(value)     │
//! │  - join barrier, original order kept        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ mutator: ordered insertion                  │
//! │  - img → editor embed at selection          │
//! │  - other tags → element on the drop node    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dropzone_core::{DragAndDrop, DropHook, DropOptions, HookOutcome, RawDraggable};
//!
//! let options = DropOptions::default()
//!     .with_draggables(vec![
//!         RawDraggable::image(),
//!         RawDraggable::new("^text/", "pre", "data-content"),
//!     ])
//!     .with_hook(DropHook::from_fn(|file, _target| {
//!         if file.name().ends_with(".gif") {
//!             HookOutcome::Veto
//!         } else {
//!             HookOutcome::UseFallback
//!         }
//!     }));
//!
//! // Subscribes to "drop" on the editor's editable root
//! let module = DragAndDrop::install(editor, options)?;
//!
//! // Later, on teardown
//! module.detach()?;
//! ```

mod batch;
mod encoding;
mod errors;
mod host;
mod listeners;
mod matcher;
pub mod memory;
mod module;
mod mutator;
mod options;
mod resolver;
mod rules;

pub use batch::fan_out;
pub use encoding::{data_url, DEFAULT_MIME_TYPE};
pub use errors::{ConfigurationError, DropError, InstallError};
pub use host::{DocumentNode, DropEvent, DroppedFile, Editor, EventNode, Selection, IMAGE_EMBED};
pub use listeners::{ListenerDisposer, ListenerSet};
pub use matcher::{match_files, MatchedFile, RuleTarget};
pub use module::{DragAndDrop, DropPhase, DropReport, PendingDrop, DROP_EVENT};
pub use mutator::{apply, apply_one, FileOutcome, IMAGE_TAG};
pub use options::{DropConfig, DropOptions};
pub use resolver::{read_data_url, resolve, DropHook, HookOutcome, ResolvedInsertion};
pub use rules::{DraggableRule, RawDraggable, RuleRegistry, IMAGE_CONTENT_TYPE_PATTERN};
