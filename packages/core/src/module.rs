//! # Drag and Drop Module
//!
//! Ties the pipeline together for one editor instance.
//!
//! ## Drop lifecycle
//!
//! ```text
//! Idle ──drop──▶ Matching ──no match──▶ Idle   (event left untouched)
//!                   │
//!                   └─≥1 match─▶ Resolving ──all settled──▶ Applying ──▶ Idle
//!                   (default action and propagation suppressed)
//! ```
//!
//! Matching runs synchronously inside the event handler so the default
//! action can still be suppressed. Resolution and insertion run as a local
//! task on the editor's event loop. Once a drop is claimed it always runs to
//! completion; there is no cancellation and no timeout.

use crate::batch::fan_out;
use crate::errors::{ConfigurationError, DropError, InstallError};
use crate::host::{DocumentNode, DropEvent, DroppedFile, Editor};
use crate::listeners::{ListenerDisposer, ListenerSet};
use crate::matcher::match_files;
use crate::mutator::{apply_one, FileOutcome};
use crate::options::DropOptions;
use crate::resolver::{resolve, DropHook};
use crate::rules::RuleRegistry;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

/// Event the module listens for on its container
pub const DROP_EVENT: &str = "drop";

/// Stage of one drop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPhase {
    Idle,
    Matching,
    Resolving,
    Applying,
}

impl DropPhase {
    fn can_advance_to(self, next: DropPhase) -> bool {
        use DropPhase::*;
        matches!(
            (self, next),
            (Idle, Matching) | (Matching, Idle) | (Matching, Resolving) | (Resolving, Applying) | (Applying, Idle)
        )
    }
}

struct DropCycle {
    id: u64,
    phase: DropPhase,
}

impl DropCycle {
    fn begin(id: u64) -> Self {
        let mut cycle = Self {
            id,
            phase: DropPhase::Idle,
        };
        cycle.advance(DropPhase::Matching);
        cycle
    }

    fn advance(&mut self, next: DropPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid drop transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::trace!("drop #{}: {:?} -> {:?}", self.id, self.phase, next);
        self.phase = next;
    }
}

/// Per-file outcomes of one drop, in original file order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DropReport {
    pub outcomes: Vec<FileOutcome>,
}

impl DropReport {
    pub fn inserted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_inserted()).count()
    }

    pub fn vetoed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Vetoed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Failed { .. }))
            .count()
    }
}

/// Asynchronous remainder of a claimed drop
pub type PendingDrop = LocalBoxFuture<'static, DropReport>;

/// Accepts files dropped on an editor's container
pub struct DragAndDrop<E: Editor> {
    editor: Rc<E>,
    container: E::Node,
    rules: RuleRegistry,
    on_drop: Option<DropHook<E::File>>,
    listeners: ListenerSet<E::Node>,
    drops: Cell<u64>,
}

impl<E: Editor> DragAndDrop<E> {
    /// Build the module. Fails if any draggable is malformed; nothing is
    /// registered in that case.
    pub fn new(editor: Rc<E>, options: DropOptions<E>) -> Result<Self, ConfigurationError> {
        tracing::debug!("DragAndDrop options: {:?}", options);

        let rules = RuleRegistry::compile(&options.draggables)?;
        let container = options.container.unwrap_or_else(|| editor.editable_root());

        Ok(Self {
            editor,
            container,
            rules,
            on_drop: options.on_drop,
            listeners: ListenerSet::new(),
            drops: Cell::new(0),
        })
    }

    /// Create the module and subscribe it to its container
    pub fn install(editor: Rc<E>, options: DropOptions<E>) -> Result<Rc<Self>, InstallError> {
        let module = Rc::new(Self::new(editor, options)?);
        Self::attach(&module)?;
        Ok(module)
    }

    /// Subscribe the drop handler on the container. The handler only holds
    /// a weak reference to the module.
    pub fn attach(this: &Rc<Self>) -> Result<ListenerDisposer<E::Node>, DropError> {
        let module = Rc::downgrade(this);

        this.listeners.add_listener(&this.container, DROP_EVENT, move |event: &E::Event| {
            let Some(module) = module.upgrade() else {
                return;
            };

            if let Some(pending) = module.handle_drop(event) {
                module.editor.spawn_local(
                    pending
                        .map(|report| {
                            tracing::debug!(
                                "Drop finished: {} inserted, {} vetoed, {} failed",
                                report.inserted(),
                                report.vetoed(),
                                report.failed()
                            );
                        })
                        .boxed_local(),
                );
            }
        })
    }

    /// Remove every listener this module registered
    pub fn detach(&self) -> Result<(), DropError> {
        self.listeners.remove_all()
    }

    /// Synchronous half of the drop handler.
    ///
    /// Returns `None` and leaves the event alone when no file matches.
    /// Otherwise suppresses the event's default action and propagation and
    /// returns the pending resolution and insertion.
    pub fn handle_drop(&self, event: &E::Event) -> Option<PendingDrop> {
        let id = self.drops.get() + 1;
        self.drops.set(id);
        let mut cycle = DropCycle::begin(id);

        let matched = match_files(event.files(), &self.rules);
        if matched.is_empty() {
            cycle.advance(DropPhase::Idle);
            return None;
        }

        event.stop_propagation();
        event.prevent_default();

        let node = event
            .target()
            .filter(|target| target.is_drop_target())
            .unwrap_or_else(|| self.container.clone());

        tracing::debug!("drop #{}: {} matching file(s)", id, matched.len());
        cycle.advance(DropPhase::Resolving);

        let editor = Rc::clone(&self.editor);
        let hook = self.on_drop.clone();

        let pending = async move {
            let names: Vec<String> = matched.iter().map(|m| m.file.name()).collect();
            let resolutions = fan_out(matched, |m| resolve(m, hook.as_ref())).await;

            cycle.advance(DropPhase::Applying);
            let outcomes = names
                .into_iter()
                .zip(resolutions)
                .map(|(file, resolution)| match resolution {
                    Ok(insertion) => apply_one(editor.as_ref(), &node, insertion),
                    Err(error) => {
                        tracing::warn!("Skipping {}: {}", file, error);
                        FileOutcome::Failed { file, error }
                    }
                })
                .collect();

            cycle.advance(DropPhase::Idle);
            DropReport { outcomes }
        };

        Some(pending.boxed_local())
    }

    pub fn editor(&self) -> &Rc<E> {
        &self.editor
    }

    pub fn container(&self) -> &E::Node {
        &self.container
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
