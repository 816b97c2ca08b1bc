use std::time::Duration;

use crate::core::{Bus, BusConfig};
use crate::policies::{Concurrency, DispatchPolicy};

/// Builder for constructing a [`Bus`] from a base configuration.
pub struct BusBuilder {
    cfg: BusConfig,
}

impl BusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self { cfg }
    }

    /// Sets the failure policy.
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.cfg.policy = policy;
        self
    }

    /// Sets the scheduling model.
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.cfg.concurrency = concurrency;
        self
    }

    /// Default per-handler deadline (`Duration::ZERO` disables it).
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.handler_timeout = timeout;
        self
    }

    /// Publish-level deadline for concurrent dispatch (`Duration::ZERO` disables it).
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.publish_timeout = timeout;
        self
    }

    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.cfg.max_dispatch_depth = depth;
        self
    }

    /// Builds the bus. Consumes the builder.
    pub fn build(self) -> Bus {
        Bus::new(self.cfg)
    }
}
