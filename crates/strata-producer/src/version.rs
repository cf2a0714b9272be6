//! Version minting.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use strata_core::Version;

/// Mints a new state version per cycle.
///
/// Minted versions must be strictly ascending — later states have greater
/// versions. The cycle engine asserts this.
pub trait VersionMinter: Send {
    /// Returns a new state version.
    fn mint(&self) -> Version;
}

/// Default minter: a counter seeded from the wall clock.
///
/// Seeding from epoch milliseconds keeps versions ascending across producer
/// restarts as long as cycles run less often than once per millisecond.
#[derive(Debug)]
pub struct WallClockVersionMinter {
    next: AtomicI64,
}

impl WallClockVersionMinter {
    /// Creates a minter seeded from the current wall clock.
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::cast_possible_truncation)] // epoch millis fit i64 until year 292M
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Self {
            next: AtomicI64::new(seed),
        }
    }
}

impl Default for WallClockVersionMinter {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionMinter for WallClockVersionMinter {
    fn mint(&self) -> Version {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
