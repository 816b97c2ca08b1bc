//! # herald
//!
//! **Herald** is an embedded, in-process publish/subscribe event bus for Rust.
//!
//! Publishers emit named events; subscribers register handlers for event names.
//! The bus routes each event to its handlers, isolates their failures, enforces
//! deadlines and guards against publish loops. Everything lives in one process:
//! there is no persistence and no network delivery.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Publisher   │   │  Publisher   │   │   Handler    │ (may publish again)
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Bus (router)                                                     │
//! │  - DispatchChain (recursion guard, max_dispatch_depth)            │
//! │  - Registry (event name → ordered copy-on-write snapshots)        │
//! │  - Dispatcher (Synchronous | Concurrent, Isolated | FailFast)     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ run_once(h1) │   │ run_once(h2) │   │ run_once(hN) │
//!     │ timeout,     │   │ timeout,     │   │ timeout,     │
//!     │ catch_unwind │   │ catch_unwind │   │ catch_unwind │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//!                 PublishReport { event, results[..] }
//! ```
//!
//! ### Publish lifecycle
//! ```text
//! publish(name, payload)
//!   ├─► snapshot = registry.handlers_for(name)
//!   │       └─ empty ─► Ok(empty report)
//!   ├─► chain = current chain + name   (CyclicDispatch if already at max depth)
//!   ├─► for each subscription (snapshot order):
//!   │       Pending ─► Running ─► Succeeded | Failed | TimedOut
//!   │       ├─ Isolated ─► record, continue
//!   │       └─ FailFast ─► record, stop, Err(HandlerFailed)
//!   └─► Ok(report)
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                          |
//! |-------------------|----------------------------------------------------------------|---------------------------------------------|
//! | **Events**        | Named immutable payloads with correlation metadata.            | [`Event`], [`EventMetadata`]                |
//! | **Handlers**      | Single-method async capability bound to one event name.        | [`Handler`], [`HandlerFn`], [`HandlerRef`]  |
//! | **Routing**       | Subscribe/unsubscribe, ordered snapshots, priorities.          | [`Bus`], [`Registry`], [`SubscribeOptions`] |
//! | **Policies**      | Failure isolation and scheduling model.                        | [`DispatchPolicy`], [`Concurrency`]         |
//! | **Results**       | Per-handler outcomes aggregated per publish.                   | [`PublishReport`], [`DispatchResult`]       |
//! | **Errors**        | Typed errors for the API, dispatch and handlers.               | [`BusError`], [`DispatchError`], [`HandlerError`] |
//! | **Configuration** | Timeouts, depth limit, policies.                               | [`BusConfig`], [`BusBuilder`]               |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use herald::{Bus, BusConfig, Concurrency, Event, HandlerError};
//!
//! #[derive(Debug)]
//! struct OrderCreated { id: u64 }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Bus::builder(BusConfig::default())
//!         .with_concurrency(Concurrency::Concurrent { pool_size: 4 })
//!         .with_handler_timeout(Duration::from_secs(1))
//!         .build();
//!
//!     bus.subscribe_fn("order_create", "charge_client", |ev: Event, _ctx: CancellationToken| async move {
//!         let order = ev.payload::<OrderCreated>().ok_or_else(|| HandlerError::fail("bad payload"))?;
//!         println!("charging for order {}", order.id);
//!         Ok::<(), HandlerError>(())
//!     })?;
//!
//!     let report = bus.publish("order_create", OrderCreated { id: 42 }).await?;
//!     assert!(report.all_succeeded());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;
mod policies;

// ---- Public re-exports ----

pub use crate::core::{
    Bus, BusBuilder, BusConfig, DEFAULT_MAX_DISPATCH_DEPTH, DispatchResult, DispatchState,
    DispatchStatus, PublishReport, Registry, Snapshot, SubscribeOptions, Subscription,
    SubscriptionId, global, install_global,
};
pub use error::{BusError, DispatchError, HandlerError};
pub use events::{Event, EventMetadata, Payload};
pub use handlers::{Handler, HandlerFn, HandlerRef};
pub use policies::{Concurrency, DispatchPolicy};
