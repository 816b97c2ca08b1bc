//! Events: the data model routed by the bus.
//!
//! ## Contents
//! - [`Event`] named, immutable, type-erased payload
//! - [`EventMetadata`] timestamp, correlation id and sequence number
//!
//! See `core/mod.rs` for the wiring between events, the registry and the dispatcher.

mod event;

pub use event::{Event, EventMetadata, Payload};
