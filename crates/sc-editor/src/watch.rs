//! Value-equality guarded observer.
//!
//! A `Watch<T>` holds the last seen value of some projection of external
//! state (for the canvas: the active filter) and notifies subscribers only
//! when a pushed value differs from it. Unrelated state changes that leave
//! the projection equal never fire.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

pub struct Watch<T> {
    current: Option<T>,
    subscribers: Vec<(SubscriptionId, Callback<T>)>,
    next_id: u64,
}

impl<T> Default for Watch<T> {
    fn default() -> Self {
        Self {
            current: None,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T: PartialEq + Clone> Watch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Drop every subscriber (teardown). The last seen value is kept.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    /// Push a new value. Returns true (and notifies) only if it differs
    /// from the last one; the first value always counts as a change.
    pub fn update(&mut self, value: T) -> bool {
        if self.current.as_ref() == Some(&value) {
            return false;
        }
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&value);
        }
        self.current = Some(value);
        true
    }

    /// Forget the last value so the next `update` fires unconditionally.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
