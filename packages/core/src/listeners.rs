//! # Listener Lifecycle
//!
//! Keeps a record of every event subscription a module makes so that each
//! one can be removed again. Registration hands back a [`ListenerDisposer`]
//! for that single subscription; [`ListenerSet::remove_all`] tears down
//! whatever is left.

use crate::errors::DropError;
use crate::host::EventNode;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

struct ListenerRecord<N: EventNode> {
    node: N,
    event_name: String,
    listener: N::Listener,
}

impl<N: EventNode> ListenerRecord<N> {
    fn unsubscribe(&self) -> Result<(), DropError> {
        self.node.remove_event_listener(&self.event_name, &self.listener)
    }
}

type Records<N> = RefCell<HashMap<u64, ListenerRecord<N>>>;

/// Active subscriptions of one module
pub struct ListenerSet<N: EventNode> {
    records: Rc<Records<N>>,
    next_id: Cell<u64>,
}

impl<N: EventNode> ListenerSet<N> {
    pub fn new() -> Self {
        Self {
            records: Rc::new(RefCell::new(HashMap::new())),
            next_id: Cell::new(0),
        }
    }

    /// Subscribe `handler` to `event_name` on `node` and record it
    pub fn add_listener(
        &self,
        node: &N,
        event_name: &str,
        handler: impl Fn(&N::Event) + 'static,
    ) -> Result<ListenerDisposer<N>, DropError> {
        let listener = node.bind(Rc::new(handler));
        node.add_event_listener(event_name, &listener)?;

        let id = self.next_id.get();
        self.next_id.set(id + 1);

        self.records.borrow_mut().insert(
            id,
            ListenerRecord {
                node: node.clone(),
                event_name: event_name.to_string(),
                listener,
            },
        );

        Ok(ListenerDisposer {
            id,
            records: Rc::downgrade(&self.records),
        })
    }

    /// Unsubscribe every recorded listener. All removals are attempted; the
    /// first failure is returned.
    pub fn remove_all(&self) -> Result<(), DropError> {
        let records: Vec<ListenerRecord<N>> = self.records.borrow_mut().drain().map(|(_, record)| record).collect();

        let mut first_error = None;
        for record in records {
            if let Err(err) = record.unsubscribe() {
                tracing::warn!("Failed to remove {} listener: {}", record.event_name, err);
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl<N: EventNode> Default for ListenerSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes one subscription. Dropping it without calling
/// [`dispose`](ListenerDisposer::dispose) leaves the listener in place.
pub struct ListenerDisposer<N: EventNode> {
    id: u64,
    records: Weak<Records<N>>,
}

impl<N: EventNode> ListenerDisposer<N> {
    /// Unsubscribe the listener. Returns `false` if it was already gone.
    pub fn dispose(self) -> Result<bool, DropError> {
        let Some(records) = self.records.upgrade() else {
            return Ok(false);
        };

        let record = records.borrow_mut().remove(&self.id);
        match record {
            Some(record) => record.unsubscribe().map(|()| true),
            None => Ok(false),
        }
    }
}
