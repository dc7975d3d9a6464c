//! Event queue: the FIFO mailbox shared by every kernel component.
//!
//! The queue is a cloneable handle: each component receives its own clone at
//! construction and `put`s whatever it emits. The simulation loop only ever
//! calls [`EventQueue::try_get`], so it never suspends. The live loop calls
//! [`EventQueue::get`], which blocks until an event arrives or the queue is
//! closed and drained.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::Event;

#[derive(Debug, Default)]
struct Mailbox {
    events: VecDeque<Event>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    mailbox: Mutex<Mailbox>,
    available: Condvar,
}

/// Strict FIFO mailbox of [`Event`]s. No priority, no deduplication.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    shared: Arc<Shared>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the tail.
    ///
    /// Puts are accepted after [`close`](Self::close): the consumer still
    /// drains events produced while it processes the tail of the stream.
    pub fn put(&self, event: impl Into<Event>) {
        let mut mailbox = self.shared.mailbox.lock();
        mailbox.events.push_back(event.into());
        drop(mailbox);
        self.shared.available.notify_one();
    }

    /// Remove and return the head without waiting.
    pub fn try_get(&self) -> Option<Event> {
        self.shared.mailbox.lock().events.pop_front()
    }

    /// Remove and return the head, blocking until one is available.
    ///
    /// Returns `None` only once the queue is closed and empty.
    pub fn get(&self) -> Option<Event> {
        let mut mailbox = self.shared.mailbox.lock();
        loop {
            if let Some(event) = mailbox.events.pop_front() {
                return Some(event);
            }
            if mailbox.closed {
                return None;
            }
            self.shared.available.wait(&mut mailbox);
        }
    }

    /// Non-destructive check for size zero.
    pub fn is_empty(&self) -> bool {
        self.shared.mailbox.lock().events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shared.mailbox.lock().events.len()
    }

    /// Mark the stream finished and wake every blocked consumer.
    pub fn close(&self) {
        self.shared.mailbox.lock().closed = true;
        self.shared.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.mailbox.lock().closed
    }
}
