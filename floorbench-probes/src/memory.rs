//! Sequential memory read.

use crate::byte_checksum;
use floorbench_core::{Observed, Probe, ProbeError};
use rand::RngCore;

/// Memory fixture size: 1 MiB.
pub const MEMORY_FIXTURE_LEN: usize = 1024 * 1024;

/// Sequentially reads a 1 MiB pseudo-random buffer and returns a wrapping
/// byte-sum checksum. Returning the checksum keeps the read observable so
/// the optimizer cannot elide it. Sequential access rides the prefetcher
/// and L1/L2 caches; that cache effect is part of what is being measured.
pub struct MemoryReadProbe {
    data: Vec<u8>,
}

impl MemoryReadProbe {
    /// Create the probe; the buffer is allocated in `setup_trial`.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }
}

impl Default for MemoryReadProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for MemoryReadProbe {
    fn name(&self) -> &'static str {
        "memory_read"
    }

    fn setup_trial(&mut self) -> Result<(), ProbeError> {
        let mut data = vec![0u8; MEMORY_FIXTURE_LEN];
        rand::thread_rng().fill_bytes(&mut data);
        self.data = data;
        Ok(())
    }

    fn invoke(&mut self) -> Result<Observed, ProbeError> {
        if self.data.is_empty() {
            return Err(ProbeError::measurement("memory fixture not initialized"));
        }
        Ok(Observed::Checksum(byte_checksum(&self.data)))
    }

    fn teardown_trial(&mut self) {
        self.data = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_deterministic_within_trial() {
        let mut probe = MemoryReadProbe::new();
        probe.setup_trial().unwrap();

        let first = match probe.invoke().unwrap() {
            Observed::Checksum(sum) => sum,
            other => panic!("unexpected result: {other:?}"),
        };
        for _ in 0..10 {
            match probe.invoke().unwrap() {
                Observed::Checksum(sum) => assert_eq!(sum, first),
                other => panic!("unexpected result: {other:?}"),
            }
        }
        probe.teardown_trial();
    }

    #[test]
    fn test_fixture_released_on_teardown() {
        let mut probe = MemoryReadProbe::new();
        probe.setup_trial().unwrap();
        assert_eq!(probe.data.len(), MEMORY_FIXTURE_LEN);
        probe.teardown_trial();
        assert!(probe.data.is_empty());
    }

    #[test]
    fn test_invoke_before_setup_is_an_error() {
        let mut probe = MemoryReadProbe::new();
        assert!(probe.invoke().is_err());
    }
}
