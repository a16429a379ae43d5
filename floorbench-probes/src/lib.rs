#![warn(missing_docs)]
//! FloorBench Probes
//!
//! The five fixed probes, each wrapping exactly one OS/runtime primitive:
//!
//! 1. [`LockProbe`] - uncontended mutex lock/unlock
//! 2. [`MemoryReadProbe`] - sequential read of a 1 MiB in-memory buffer
//! 3. [`DiskReadProbe`] - sequential read of a 1 MiB temp file
//! 4. [`GzipCompressProbe`] - gzip compression of a 1 KiB buffer
//! 5. [`NetRoundTripProbe`] - loopback reachability within 1000 ms
//!
//! Fixtures are owned by their probe, allocated in `setup_trial` and
//! released in `teardown_trial`; no probe can observe another's fixture.

mod compress;
mod disk;
mod lock;
mod memory;
mod network;

pub use compress::{GzipCompressProbe, COMPRESS_FIXTURE_LEN};
pub use disk::{DiskReadProbe, DISK_FIXTURE_LEN};
pub use lock::LockProbe;
pub use memory::{MemoryReadProbe, MEMORY_FIXTURE_LEN};
pub use network::{NetRoundTripProbe, REACHABILITY_TIMEOUT};

use floorbench_core::Probe;

/// Probe names in registration order. The suite executes and reports probes
/// in exactly this order.
pub const PROBE_NAMES: [&str; 5] = [
    "lock",
    "memory_read",
    "disk_read",
    "gzip_compress",
    "net_roundtrip",
];

/// Build the full probe suite in registration order.
pub fn registry() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(LockProbe::new()),
        Box::new(MemoryReadProbe::new()),
        Box::new(DiskReadProbe::new()),
        Box::new(GzipCompressProbe::new()),
        Box::new(NetRoundTripProbe::new()),
    ]
}

/// Look up a single probe by name.
pub fn probe_by_name(name: &str) -> Option<Box<dyn Probe>> {
    registry().into_iter().find(|p| p.name() == name)
}

/// Wrapping byte-sum checksum shared by the memory and disk probes. The sum
/// forces every byte to be read; wrapping matches the overflow-tolerant
/// contract.
pub(crate) fn byte_checksum(data: &[u8]) -> u64 {
    data.iter().fold(0u64, |acc, &b| acc.wrapping_add(b as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_is_fixed() {
        let names: Vec<&str> = registry().iter().map(|p| p.name()).collect();
        assert_eq!(names, PROBE_NAMES);
    }

    #[test]
    fn test_probe_by_name() {
        assert!(probe_by_name("disk_read").is_some());
        assert!(probe_by_name("no_such_probe").is_none());
    }

    #[test]
    fn test_checksum_wraps_instead_of_overflowing() {
        // Not a realistic fixture, just the wrapping contract.
        assert_eq!(byte_checksum(&[]), 0);
        assert_eq!(byte_checksum(&[1, 2, 3]), 6);
        assert_eq!(byte_checksum(&[255; 4]), 1020);
    }
}
