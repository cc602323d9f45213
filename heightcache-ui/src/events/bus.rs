use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{channel, Receiver, Sender};

use anyhow::Result;
use tracing::{debug, trace};

use crate::events::types::ViewEvent;

/// Event handler trait
pub trait EventHandler {
    fn handle_event(&mut self, event: &ViewEvent) -> Result<()>;
}

impl<F> EventHandler for F
where
    F: FnMut(&ViewEvent) -> Result<()>,
{
    fn handle_event(&mut self, event: &ViewEvent) -> Result<()> {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// UI-thread event bus.
///
/// Handlers run only inside [`process_events`](Self::process_events), on the
/// thread that owns the center. Other threads publish through
/// [`sender`](Self::sender); those events wait in the channel until the next
/// processing pass.
pub struct NotificationCenter {
    sender: Sender<ViewEvent>,
    receiver: Receiver<ViewEvent>,
    handlers: RefCell<Vec<(SubscriptionId, Box<dyn EventHandler>)>>,
    event_queue: RefCell<VecDeque<ViewEvent>>,
    pending_removals: RefCell<Vec<SubscriptionId>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            handlers: RefCell::new(Vec::new()),
            event_queue: RefCell::new(VecDeque::new()),
            pending_removals: RefCell::new(Vec::new()),
            dispatching: Cell::new(false),
            next_id: Cell::new(0),
        }
    }

    /// Get a sender for publishing events from any thread
    pub fn sender(&self) -> Sender<ViewEvent> {
        self.sender.clone()
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, handler));
        trace!(?id, "subscribed");
        id
    }

    /// Remove a handler. Returns false if `id` is not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        if let Some(pos) = handlers.iter().position(|(sub, _)| *sub == id) {
            handlers.remove(pos);
            trace!(?id, "unsubscribed");
            true
        } else if self.dispatching.get() {
            // the handler list is checked out by `dispatch`
            self.pending_removals.borrow_mut().push(id);
            true
        } else {
            false
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Queue an event for the next processing pass
    pub fn publish(&self, event: ViewEvent) {
        self.event_queue.borrow_mut().push_back(event);
    }

    /// Deliver everything queued or sent so far. Returns the number of
    /// events delivered; stops at the first handler error.
    pub fn process_events(&self) -> Result<usize> {
        while let Ok(event) = self.receiver.try_recv() {
            self.event_queue.borrow_mut().push_back(event);
        }

        let mut processed = 0;
        while let Some(event) = self.next_event() {
            debug!(?event, "dispatching");
            self.dispatch(&event)?;
            processed += 1;
        }
        Ok(processed)
    }

    fn next_event(&self) -> Option<ViewEvent> {
        self.event_queue.borrow_mut().pop_front()
    }

    fn dispatch(&self, event: &ViewEvent) -> Result<()> {
        let mut active = std::mem::take(&mut *self.handlers.borrow_mut());
        self.dispatching.set(true);
        let result = active
            .iter_mut()
            .try_for_each(|(_, handler)| handler.handle_event(event));
        self.dispatching.set(false);

        let mut handlers = self.handlers.borrow_mut();
        let added = std::mem::replace(&mut *handlers, active);
        handlers.extend(added);
        let removed = std::mem::take(&mut *self.pending_removals.borrow_mut());
        if !removed.is_empty() {
            handlers.retain(|(id, _)| !removed.contains(id));
        }
        result
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a handler subscribed for as long as the guard lives.
pub struct Subscription {
    id: SubscriptionId,
    center: Weak<NotificationCenter>,
}

impl Subscription {
    pub fn new(center: &Rc<NotificationCenter>, handler: Box<dyn EventHandler>) -> Self {
        Self {
            id: center.subscribe(handler),
            center: Rc::downgrade(center),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(center) = self.center.upgrade() {
            center.unsubscribe(self.id);
        }
    }
}
