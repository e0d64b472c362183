//! Worker-to-core pinning.

use core_affinity::CoreId;
use tracing::debug;

/// Capability to pin the calling thread to a core.
///
/// Pinning is best effort: a `false` return only means the worker runs
/// unpinned.
pub trait AffinityProvider: Send + Sync {
    fn pin_current(&self, worker: usize) -> bool;
}

/// Pins worker `i` to core `i % cores`.
#[derive(Debug, Clone)]
pub struct CoreAffinity {
    cores: Vec<CoreId>,
}

impl CoreAffinity {
    /// Query the cores visible to this process.
    pub fn detect() -> Self {
        let cores = core_affinity::get_core_ids().unwrap_or_default();
        if cores.is_empty() {
            debug!("core ids unavailable, workers will not be pinned");
        }
        Self { cores }
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }
}

impl AffinityProvider for CoreAffinity {
    fn pin_current(&self, worker: usize) -> bool {
        if self.cores.is_empty() {
            return false;
        }
        let core = self.cores[worker % self.cores.len()];
        let pinned = core_affinity::set_for_current(core);
        if !pinned {
            debug!(worker, core = core.id, "failed to pin worker");
        }
        pinned
    }
}

/// Leaves threads wherever the scheduler puts them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAffinity;

impl AffinityProvider for NoAffinity {
    fn pin_current(&self, _worker: usize) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_affinity_never_pins() {
        assert!(!NoAffinity.pin_current(0));
        assert!(!NoAffinity.pin_current(99));
    }

    #[test]
    fn test_core_affinity_does_not_panic() {
        // Pinning may be refused by the host; only the wrap-around matters here.
        let affinity = CoreAffinity::detect();
        let workers = affinity.core_count().max(1) * 2 + 1;
        std::thread::scope(|scope| {
            for worker in 0..workers {
                let affinity = &affinity;
                scope.spawn(move || {
                    let _ = affinity.pin_current(worker);
                });
            }
        });
    }

    #[test]
    fn test_empty_core_list_reports_unpinned() {
        let affinity = CoreAffinity { cores: Vec::new() };
        assert!(!affinity.pin_current(3));
    }
}
