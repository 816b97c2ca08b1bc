//! # Process-wide default bus.
//!
//! A convenience for applications that want one shared bus without threading a
//! handle through every layer. It is an ordinary [`Bus`]; nothing else in the crate
//! depends on it.
//!
//! ```rust
//! let bus = herald::global();
//! assert!(std::ptr::eq(bus, herald::global()));
//! ```

use std::sync::OnceLock;

use crate::core::{Bus, BusConfig};

static GLOBAL: OnceLock<Bus> = OnceLock::new();

/// Returns the process-wide bus, creating it with [`BusConfig::default`] on first use.
pub fn global() -> &'static Bus {
    GLOBAL.get_or_init(Bus::default)
}

/// Installs the process-wide bus with a custom configuration.
///
/// Returns `false` (and leaves the existing bus untouched) if it was already created,
/// either by an earlier call or by [`global`].
pub fn install_global(cfg: BusConfig) -> bool {
    let mut installed = false;
    GLOBAL.get_or_init(|| {
        installed = true;
        Bus::new(cfg)
    });
    installed
}
