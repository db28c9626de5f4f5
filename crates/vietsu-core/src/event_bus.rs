//! Frame-drained event queue between async tasks and the UI.
//!
//! Producers run on `spawn_local`; the egui frame drains the queue in
//! one batch. Single-threaded, so interior mutability is enough.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vietsu_types::event::ChatEvent;

/// Multi-producer event queue. Handles share one queue; cloning is
/// cheap.
pub struct EventBus<E = ChatEvent> {
    queue: Rc<RefCell<VecDeque<E>>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Queue an event for the next drain.
    pub fn emit(&self, event: E) {
        self.queue.borrow_mut().push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<E> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

// Manual impls; derives would demand bounds on E.
impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
