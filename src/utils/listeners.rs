//! Change-listener registry backing the models' `on_change`

use std::sync::{Arc, Mutex, MutexGuard, Weak};

struct Registry<F: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<F>)>,
}

fn lock<F: ?Sized>(registry: &Mutex<Registry<F>>) -> MutexGuard<'_, Registry<F>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ordered set of callbacks of type `F` (usually a `dyn Fn(..)`)
pub struct Listeners<F: ?Sized> {
    inner: Arc<Mutex<Registry<F>>>,
}

impl<F: ?Sized + Send + Sync + 'static> Listeners<F> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, listener: Arc<F>) -> Subscription {
        let id = {
            let mut registry = lock(&self.inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, listener));
            id
        };

        let weak: Weak<Mutex<Registry<F>>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    lock(&registry).entries.retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Current listeners, cloned out so callbacks run without the lock held
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        lock(&self.inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for Listeners<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `on_change`. Dropping it keeps the listener registered.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Callback = dyn Fn(usize) + Send + Sync;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let listeners: Listeners<Callback> = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let subscription = listeners.subscribe(Arc::new(move |n| {
            counter.fetch_add(n, Ordering::SeqCst);
        }));

        for listener in listeners.snapshot() {
            listener(2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        subscription.unsubscribe();
        assert!(listeners.is_empty());
        for listener in listeners.snapshot() {
            listener(2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let listeners: Listeners<Callback> = Listeners::new();
        let subscription = listeners.subscribe(Arc::new(|_| {}));
        drop(listeners);
        subscription.unsubscribe();
    }
}
