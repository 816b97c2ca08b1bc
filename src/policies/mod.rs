//! # Policies that shape a publish.
//!
//! - [`DispatchPolicy`]: isolate handler failures or stop at the first one.
//! - [`Concurrency`]: run handlers inline or as independent tasks.
//!
//! ```text
//! BusConfig ──► policy ──────► Isolated | FailFast
//!           └─► concurrency ─► Synchronous | Concurrent { pool_size }
//! ```
//!
//! Both are fixed at bus construction; see [`BusConfig`](crate::BusConfig).

mod concurrency;
mod dispatch;

pub use concurrency::Concurrency;
pub use dispatch::DispatchPolicy;
