//! Explicit listener lists used by the session, the viewport, and the credential
//! workflow. Listeners run synchronously on the notifying call, on a snapshot of the
//! list, so a listener may subscribe, unsubscribe, or call back into its source.
//! Listeners added during a pass wait for the next one; listeners removed during a
//! pass are skipped.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

type Listener<T> = Rc<dyn Fn(&T)>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// A list of synchronous listeners for values of type `T`.
pub struct Observers<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T> Clone for Observers<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> Observers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. It stays registered until the returned handle is dropped.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Rc::new(listener)));
            id
        };

        let registry: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry
                        .borrow_mut()
                        .listeners
                        .retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Calls every registered listener with `value`.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<(u64, Listener<T>)> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();

        for (id, listener) in snapshot {
            if self.is_registered(id) {
                listener(value);
            }
        }
    }

    fn is_registered(&self, id: u64) -> bool {
        self.registry
            .borrow()
            .listeners
            .iter()
            .any(|(entry, _)| *entry == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for a registered listener. Dropping it deregisters the listener.
#[must_use = "dropping a Subscription deregisters its listener immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Deregisters the listener now.
    pub fn unsubscribe(self) {}

    /// Keeps the listener registered for as long as its source lives.
    pub fn detach(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
