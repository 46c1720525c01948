//! # Change notification
//!
//! In-process publish/subscribe keyed by resource target. The provider
//! publishes after a mutation has committed; every matching callback runs
//! synchronously on the mutating thread before the mutation call returns.
//!
//! Matching is containment: a subscription on the collection sees every
//! change, a subscription on one item sees changes whose affected ids include
//! that item. There is no queue and no replay, so a subscription only ever
//! observes changes published after it was registered.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::uri::{ResourceUri, Target};

/// What kind of mutation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    /// URI the mutation was addressed to.
    pub uri: ResourceUri,
    /// Ids of the rows it touched, ascending.
    pub ids: Vec<i64>,
}

impl Change {
    fn concerns(&self, target: Target) -> bool {
        match target {
            Target::Collection => true,
            Target::Item(id) => self.ids.contains(&id),
        }
    }
}

/// Opaque ticket returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Callback = Arc<dyn Fn(&Change) + Send + Sync>;

struct Entry {
    target: Target,
    callback: Callback,
}

/// Registry of live subscriptions.
///
/// Handles increase monotonically, so iterating the map delivers in
/// registration order.
pub struct ChangeBus {
    entries: RwLock<BTreeMap<SubscriptionHandle, Entry>>,
    next_id: AtomicU64,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscriptions", &self.len())
            .finish()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, target: Target, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let handle = SubscriptionHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Entry {
            target,
            callback: Arc::new(callback),
        };
        // A poisoned lock only means a writer panicked mid-insert; the map
        // itself is still usable.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(handle, entry);
        tracing::debug!(%handle, ?target, "subscribed");
        handle
    }

    /// Returns `false` when the handle was unknown or already removed.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let removed = entries.remove(&handle).is_some();
        tracing::debug!(%handle, removed, "unsubscribed");
        removed
    }

    /// Deliver `change` to every matching subscription and return how many
    /// were called. Matching callbacks are snapshotted first and invoked with
    /// the registry unlocked, so callbacks may subscribe or unsubscribe.
    pub fn publish(&self, change: &Change) -> usize {
        let callbacks: Vec<Callback> = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries
                .values()
                .filter(|entry| change.concerns(entry.target))
                .map(|entry| Arc::clone(&entry.callback))
                .collect()
        };

        tracing::debug!(
            kind = ?change.kind,
            uri = %change.uri,
            subscribers = callbacks.len(),
            "publishing change"
        );
        for callback in &callbacks {
            callback(change);
        }
        callbacks.len()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::uri::Router;

    fn change(kind: ChangeKind, target: Target, ids: Vec<i64>) -> Change {
        Change {
            kind,
            uri: Router::default().uri_for(target),
            ids,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<Change>>>, impl Fn(&Change) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |change: &Change| sink.lock().unwrap().push(change.clone()))
    }

    #[test]
    fn collection_subscriber_sees_item_changes() {
        let bus = ChangeBus::new();
        let (seen, callback) = recorder();
        bus.subscribe(Target::Collection, callback);

        let delivered = bus.publish(&change(ChangeKind::Updated, Target::Item(3), vec![3]));

        assert_eq!(delivered, 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn item_subscriber_sees_only_its_id() {
        let bus = ChangeBus::new();
        let (seen, callback) = recorder();
        bus.subscribe(Target::Item(2), callback);

        bus.publish(&change(ChangeKind::Deleted, Target::Collection, vec![1, 3]));
        assert!(seen.lock().unwrap().is_empty());

        bus.publish(&change(ChangeKind::Deleted, Target::Collection, vec![1, 2, 3]));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribed_callback_is_not_called() {
        let bus = ChangeBus::new();
        let (seen, callback) = recorder();
        let handle = bus.subscribe(Target::Collection, callback);

        assert!(bus.unsubscribe(handle));
        assert!(!bus.unsubscribe(handle));
        bus.publish(&change(ChangeKind::Inserted, Target::Collection, vec![1]));

        assert!(seen.lock().unwrap().is_empty());
        assert!(bus.is_empty());
    }

    #[test]
    fn delivery_follows_registration_order() {
        let bus = ChangeBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(Target::Collection, move |_| order.lock().unwrap().push(label));
        }

        bus.publish(&change(ChangeKind::Inserted, Target::Collection, vec![1]));

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let bus = Arc::new(ChangeBus::new());
        let handle_slot = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0));

        let handle = {
            let inner = Arc::clone(&bus);
            let handle_slot = Arc::clone(&handle_slot);
            let calls = Arc::clone(&calls);
            bus.subscribe(Target::Collection, move |_| {
                *calls.lock().unwrap() += 1;
                if let Some(handle) = *handle_slot.lock().unwrap() {
                    inner.unsubscribe(handle);
                }
            })
        };
        *handle_slot.lock().unwrap() = Some(handle);

        let event = change(ChangeKind::Inserted, Target::Collection, vec![1]);
        bus.publish(&event);
        bus.publish(&event);

        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
