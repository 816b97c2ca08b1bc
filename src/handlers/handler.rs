//! # Handler abstraction.
//!
//! This module defines the [`Handler`] trait: the single capability a subscriber
//! provides to the bus. The common handle type is [`HandlerRef`], an
//! `Arc<dyn Handler>` shared between the registry and in-flight dispatches.
//!
//! A handler receives a [`CancellationToken`] and should check it to stop
//! cooperatively when its deadline passes or the publish is abandoned.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::Event;

/// Shared handle to a handler object.
pub type HandlerRef = Arc<dyn Handler>;

/// # Receives an event, returns a result.
///
/// Registration binds a handler to exactly one event name; the same handler
/// may be registered under several names.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use herald::{Event, Handler, HandlerError};
///
/// struct ChargeClient;
///
/// #[async_trait]
/// impl Handler for ChargeClient {
///     fn name(&self) -> &str { "charge_client" }
///
///     async fn handle(&self, event: &Event, ctx: CancellationToken) -> Result<(), HandlerError> {
///         if ctx.is_cancelled() {
///             return Err(HandlerError::Canceled);
///         }
///         let _order = event.payload::<u64>().ok_or_else(|| HandlerError::fail("bad payload"))?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Human-readable name (for logs and reports).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handles one event.
    ///
    /// Called at most once per publish for each subscription. Returning `Err`
    /// or panicking is recorded as a failed dispatch and does not affect other
    /// handlers (unless the bus is fail-fast).
    async fn handle(&self, event: &Event, ctx: CancellationToken) -> Result<(), HandlerError>;
}
