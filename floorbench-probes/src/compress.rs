//! In-memory gzip compression.

use flate2::write::GzEncoder;
use flate2::Compression;
use floorbench_core::{Observed, Probe, ProbeError};
use rand::RngCore;
use std::io::Write;

/// Compression fixture size: 1 KiB.
pub const COMPRESS_FIXTURE_LEN: usize = 1024;

/// Gzip-compresses a 1 KiB pseudo-random buffer and returns the compressed
/// bytes. Returning the full output forces materialization, so the encoder
/// cannot be optimized away. Random input is near-incompressible; the
/// number measures compressor CPU cost, not ratio.
pub struct GzipCompressProbe {
    data: Vec<u8>,
}

impl GzipCompressProbe {
    /// Create the probe; the buffer is allocated in `setup_trial`.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }
}

impl Default for GzipCompressProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for GzipCompressProbe {
    fn name(&self) -> &'static str {
        "gzip_compress"
    }

    fn setup_trial(&mut self) -> Result<(), ProbeError> {
        let mut data = vec![0u8; COMPRESS_FIXTURE_LEN];
        rand::thread_rng().fill_bytes(&mut data);
        self.data = data;
        Ok(())
    }

    fn invoke(&mut self) -> Result<Observed, ProbeError> {
        if self.data.is_empty() {
            return Err(ProbeError::measurement("compression fixture not initialized"));
        }
        let mut encoder = GzEncoder::new(
            Vec::with_capacity(COMPRESS_FIXTURE_LEN + 64),
            Compression::default(),
        );
        encoder
            .write_all(&self.data)
            .map_err(ProbeError::measurement)?;
        let compressed = encoder.finish().map_err(ProbeError::measurement)?;
        Ok(Observed::Bytes(compressed))
    }

    fn teardown_trial(&mut self) {
        self.data = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_round_trip_recovers_fixture() {
        let mut probe = GzipCompressProbe::new();
        probe.setup_trial().unwrap();

        let compressed = match probe.invoke().unwrap() {
            Observed::Bytes(bytes) => bytes,
            other => panic!("unexpected result: {other:?}"),
        };

        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut recovered = Vec::new();
        decoder.read_to_end(&mut recovered).unwrap();

        assert_eq!(recovered, probe.data);
        probe.teardown_trial();
    }

    #[test]
    fn test_output_materialized() {
        let mut probe = GzipCompressProbe::new();
        probe.setup_trial().unwrap();

        match probe.invoke().unwrap() {
            // Gzip header alone is 10 bytes; random input stays near its
            // original size.
            Observed::Bytes(bytes) => assert!(bytes.len() > 10),
            other => panic!("unexpected result: {other:?}"),
        }
        probe.teardown_trial();
    }

    #[test]
    fn test_invoke_before_setup_is_an_error() {
        let mut probe = GzipCompressProbe::new();
        assert!(probe.invoke().is_err());
    }
}
