//! Synchronous subscriber list

use std::fmt;

pub type SubscriptionId = usize;

type Subscriber<T> = Box<dyn FnMut(&T)>;

/// Calls every subscriber, in registration order, with each notified value
pub struct Observable<T> {
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
}

impl<T> Observable<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn notify(&mut self, value: &T) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(value);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
