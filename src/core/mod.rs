//! Bus core: registration, routing and dispatch.
//!
//! Internal modules:
//! - [`registry`]: event name → ordered, copy-on-write subscription snapshots;
//! - [`bus`]: public router (publish / subscribe / unsubscribe);
//! - [`dispatcher`]: runs one publish (sync or concurrent, isolated or fail-fast);
//! - [`runner`]: one handler invocation with timeout and panic capture;
//! - [`guard`]: recursion guard for nested publishes;
//! - [`report`]: per-handler results and the publish report;
//! - [`global`]: optional process-wide bus.
//!
//! ```text
//! Bus::publish ──► Registry::handlers_for ──► guard.enter ──► Dispatcher ──► runner × N
//!                                                                  └──► PublishReport
//! ```

mod builder;
mod bus;
mod config;
mod dispatcher;
mod global;
mod guard;
mod registry;
mod report;
mod runner;
mod subscription;

pub use builder::BusBuilder;
pub use bus::Bus;
pub use config::{BusConfig, DEFAULT_MAX_DISPATCH_DEPTH};
pub use global::{global, install_global};
pub use registry::{Registry, Snapshot};
pub use report::{DispatchResult, DispatchState, DispatchStatus, PublishReport};
pub use subscription::{SubscribeOptions, Subscription, SubscriptionId};
