//! # Handler abstractions.
//!
//! This module provides the subscriber-facing types:
//! - [`Handler`] - trait for implementing async event handlers
//! - [`HandlerFn`] - closure-based handler implementation
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler>`)

mod handler;
mod handler_fn;

pub use handler::{Handler, HandlerRef};
pub use handler_fn::HandlerFn;
