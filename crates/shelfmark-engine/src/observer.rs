//! Single-threaded observer registry shared by the stores and the coordinator.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Handle returned by [`ObserverList::add`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered list of weakly held observers.
///
/// Notification goes through [`ObserverList::snapshot`], so no borrow of the
/// list is held while observers run and they may freely add or remove
/// observers (or call back into the subject) from inside a callback.
pub struct ObserverList<T: ?Sized> {
    observers: RefCell<Vec<(ObserverId, Weak<T>)>>,
    next_id: Cell<u64>,
}

impl<T: ?Sized> Default for ObserverList<T> {
    fn default() -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<T: ?Sized> ObserverList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Rc<T>) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers
            .borrow_mut()
            .push((id, Rc::downgrade(&observer)));
        id
    }

    /// Returns false if the id was not registered
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Live observers in registration order; dropped ones are pruned
    pub fn snapshot(&self) -> Vec<Rc<T>> {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|(_, weak)| weak.strong_count() > 0);
        observers.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
    }

    pub fn len(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
