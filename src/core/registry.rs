//! # Handler registry - event name to ordered subscriptions.
//!
//! The registry owns every [`Subscription`] of one bus and hands out immutable
//! snapshots for dispatch.
//!
//! ## Architecture
//! ```text
//! subscribe(name, h)   ──► write lock ──► copy slice + insert + sort ──► swap Arc
//! unsubscribe(id)      ──► write lock ──► copy slice - remove        ──► swap Arc
//! handlers_for(name)   ──► read lock  ──► Arc::clone(slice)          ──► snapshot
//! ```
//!
//! ## Rules
//! - Slices are **copy-on-write**: a snapshot is never mutated after it is handed out,
//!   so an in-flight dispatch cannot observe concurrent (un)subscribes.
//! - Readers never block each other; writers are serialized by the lock.
//! - Order: priority descending, then insertion order.
//! - Subscription ids are unique per registry and never reused.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::subscription::{SubscribeOptions, Subscription, SubscriptionId};
use crate::error::BusError;
use crate::handlers::HandlerRef;

/// Immutable, ordered view of the subscriptions for one event name.
pub type Snapshot = Arc<[Subscription]>;

#[derive(Default)]
struct Routes {
    by_name: HashMap<Arc<str>, Snapshot>,
    names_by_id: HashMap<SubscriptionId, Arc<str>>,
}

/// Registry of subscriptions keyed by event name.
pub struct Registry {
    routes: RwLock<Routes>,
    next_id: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(Routes::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Binds `handler` to `event_name`.
    ///
    /// Every call creates an independent subscription, even for a handler that is
    /// already registered under the same name.
    ///
    /// ### Errors
    /// [`BusError::InvalidHandler`] if the event name is blank, the handler has an
    /// empty name, or the per-subscription timeout is zero.
    pub fn subscribe(
        &self,
        event_name: &str,
        handler: HandlerRef,
        opts: SubscribeOptions,
    ) -> Result<SubscriptionId, BusError> {
        validate(event_name, &handler, &opts)?;

        let id = SubscriptionId(self.next_id.fetch_add(1, AtomicOrdering::Relaxed));
        let name: Arc<str> = Arc::from(event_name);
        let sub = Subscription {
            id,
            event_name: Arc::clone(&name),
            handler,
            priority: opts.priority,
            timeout: opts.timeout,
        };

        let mut routes = self.write();
        let mut next: Vec<Subscription> = routes
            .by_name
            .get(event_name)
            .map(|current| current.to_vec())
            .unwrap_or_default();
        next.push(sub);
        next.sort_by_key(|s| (Reverse(s.priority), s.id));

        routes.by_name.insert(Arc::clone(&name), next.into());
        routes.names_by_id.insert(id, name);
        Ok(id)
    }

    /// Removes a subscription.
    ///
    /// Returns `false` if the id is unknown (never registered or already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut routes = self.write();
        let Some(name) = routes.names_by_id.remove(&id) else {
            return false;
        };

        let remaining: Vec<Subscription> = routes
            .by_name
            .get(&name)
            .map(|current| current.iter().filter(|s| s.id != id).cloned().collect())
            .unwrap_or_default();

        if remaining.is_empty() {
            routes.by_name.remove(&name);
        } else {
            routes.by_name.insert(name, remaining.into());
        }
        true
    }

    /// Returns an immutable, ordered snapshot of the subscriptions for `event_name`.
    ///
    /// Empty if nothing is subscribed.
    pub fn handlers_for(&self, event_name: &str) -> Snapshot {
        self.read()
            .by_name
            .get(event_name)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Number of subscriptions for `event_name`.
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.read().by_name.get(event_name).map_or(0, |s| s.len())
    }

    /// Returns sorted list of event names with at least one subscription.
    pub fn event_names(&self) -> Vec<String> {
        let routes = self.read();
        let mut names: Vec<String> = routes.by_name.keys().map(|n| n.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Total number of subscriptions.
    pub fn len(&self) -> usize {
        self.read().names_by_id.len()
    }

    /// Returns true if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.read().names_by_id.is_empty()
    }

    /// Drops every subscription. Snapshots already handed out stay valid.
    pub fn clear(&self) {
        let mut routes = self.write();
        routes.by_name.clear();
        routes.names_by_id.clear();
    }

    // A panic while holding the lock cannot leave `Routes` half-updated (all
    // mutations are single inserts/removes), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Routes> {
        self.routes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Routes> {
        self.routes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(event_name: &str, handler: &HandlerRef, opts: &SubscribeOptions) -> Result<(), BusError> {
    if event_name.trim().is_empty() {
        return Err(invalid("event name must not be empty"));
    }
    if handler.name().is_empty() {
        return Err(invalid("handler name must not be empty"));
    }
    if opts.timeout.is_some_and(|t| t.is_zero()) {
        return Err(invalid("handler timeout must be greater than zero"));
    }
    Ok(())
}

fn invalid(reason: &str) -> BusError {
    BusError::InvalidHandler {
        reason: reason.to_string(),
    }
}
