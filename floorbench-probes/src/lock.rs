//! Uncontended mutex lock/unlock.

use floorbench_core::{Observed, Probe, ProbeError};
use std::sync::Mutex;

/// Acquires and immediately releases a mutex. The critical section is empty
/// on purpose: it isolates acquisition/release cost from any contained work.
/// No contending thread is spawned, so this measures the uncontended path
/// only.
pub struct LockProbe {
    lock: Mutex<()>,
}

impl LockProbe {
    /// Create the probe.
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }
}

impl Default for LockProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for LockProbe {
    fn name(&self) -> &'static str {
        "lock"
    }

    fn setup_trial(&mut self) -> Result<(), ProbeError> {
        // No fixture; the mutex itself is the state under test.
        Ok(())
    }

    fn invoke(&mut self) -> Result<Observed, ProbeError> {
        let guard = self.lock.lock().map_err(ProbeError::measurement)?;
        drop(guard);
        Ok(Observed::Unit)
    }

    fn teardown_trial(&mut self) {}
}
