//! Scoped notification subscriptions
//!
//! A `Subscription` unregisters its callback when cancelled or dropped, so
//! whoever holds it owns the registration.

use log::debug;
use std::fmt;

/// Handle to a registered notification callback
pub struct Subscription {
    label: &'static str,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the closure that unregisters the callback
    pub fn new<F>(label: &'static str, cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            label,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Unregister now
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            debug!("Unsubscribed from {}", self.label);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

/// Subscriptions owned by one component, released together
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unregister everything, newest first
    pub fn clear(&mut self) {
        while let Some(subscription) = self.subscriptions.pop() {
            subscription.cancel();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counting(counter: &Arc<AtomicUsize>) -> Subscription {
        let counter = Arc::clone(counter);
        Subscription::new("test", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_drop_unsubscribes_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        drop(counting(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_then_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let subscription = counting(&counter);
        assert_eq!(subscription.label(), "test");
        subscription.cancel();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_releases_newest_first() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut set = SubscriptionSet::new();
        for label in ["first", "second"] {
            let order = Arc::clone(&order);
            set.push(Subscription::new(label, move || order.lock().unwrap().push(label)));
        }
        assert_eq!(set.len(), 2);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(*order.lock().unwrap(), vec!["second", "first"]);
    }

    #[test]
    fn test_set_drop_releases() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut set = SubscriptionSet::new();
            set.push(counting(&counter));
            set.push(counting(&counter));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
