//! # Events routed through the bus.
//!
//! An [`Event`] is an immutable, named payload. The name is the routing key; the
//! payload is opaque to the bus and recovered by handlers with [`Event::payload`].
//! [`EventMetadata`] carries a timestamp, a correlation id and a sequence number.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore creation order when events are observed out of order.
//!
//! ## Example
//! ```rust
//! use herald::Event;
//!
//! #[derive(Debug, PartialEq)]
//! struct OrderCreated { id: u64 }
//!
//! let ev = Event::new("order_create", OrderCreated { id: 42 });
//!
//! assert_eq!(ev.name(), "order_create");
//! assert_eq!(ev.payload::<OrderCreated>(), Some(&OrderCreated { id: 42 }));
//! assert!(ev.payload::<String>().is_none());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use uuid::Uuid;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Type-erased event payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Metadata attached to every event at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventMetadata {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub timestamp: SystemTime,
    /// Correlation id; fresh v4 unless set explicitly.
    pub correlation_id: Uuid,
}

/// Immutable named payload.
///
/// Cheap to clone: name and payload are reference counted.
#[derive(Clone)]
pub struct Event {
    name: Arc<str>,
    payload: Payload,
    payload_type: &'static str,
    metadata: EventMetadata,
}

impl Event {
    /// Creates an event with current timestamp, fresh correlation id and next sequence number.
    pub fn new<T>(name: impl Into<Arc<str>>, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            name: name.into(),
            payload: Arc::new(payload),
            payload_type: std::any::type_name::<T>(),
            metadata: EventMetadata {
                seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
                timestamp: SystemTime::now(),
                correlation_id: Uuid::new_v4(),
            },
        }
    }

    /// Overrides the correlation id, e.g. to chain an event to the one that caused it.
    #[inline]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.metadata.correlation_id = id;
        self
    }

    /// Routing key.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Downcasts the payload to `T`.
    #[inline]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Type name of the payload (diagnostics only).
    #[inline]
    pub fn payload_type_name(&self) -> &'static str {
        self.payload_type
    }

    #[inline]
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    #[inline]
    pub fn correlation_id(&self) -> Uuid {
        self.metadata.correlation_id
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.metadata.seq
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("payload", &self.payload_type)
            .field("metadata", &self.metadata)
            .finish()
    }
}
