//! # Subscriptions: a handler bound to one event name.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::handlers::HandlerRef;

/// Opaque token identifying one subscription on one bus.
///
/// Issued in increasing order, so it doubles as the insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Raw numeric value (for logs/metrics).
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Per-subscription options.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use herald::SubscribeOptions;
///
/// let opts = SubscribeOptions::default()
///     .with_priority(10)
///     .with_timeout(Duration::from_millis(50));
/// assert_eq!(opts.priority, 10);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Higher runs earlier; equal priorities keep insertion order.
    pub priority: i32,
    /// Overrides [`BusConfig::handler_timeout`](crate::BusConfig::handler_timeout).
    pub timeout: Option<Duration>,
}

impl SubscribeOptions {
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A handler registered for one event name.
///
/// Owned by the registry; dispatch works on cloned snapshots.
#[derive(Clone)]
pub struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) event_name: Arc<str>,
    pub(crate) handler: HandlerRef,
    pub(crate) priority: i32,
    pub(crate) timeout: Option<Duration>,
}

impl Subscription {
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[inline]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    #[inline]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    #[inline]
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Per-subscription timeout, if one was given at registration.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Timeout to apply: own override, else the bus default.
    #[inline]
    pub(crate) fn effective_timeout(&self, default: Option<Duration>) -> Option<Duration> {
        self.timeout.or(default)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_name", &self.event_name)
            .field("handler", &self.handler.name())
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .finish()
    }
}
