//! Sequential disk read.

use crate::byte_checksum;
use floorbench_core::{Observed, Probe, ProbeError, SetupScope};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Disk fixture size: 1 MiB.
pub const DISK_FIXTURE_LEN: usize = 1024 * 1024;

/// Reads a 1 MiB temp file end to end and returns the wrapping byte-sum
/// checksum of what was read. Each invocation re-reads the file through the
/// filesystem; the OS page cache is allowed to serve repeat reads within a
/// trial, which is a documented limitation of the number this probe
/// produces. Use [`DiskReadProbe::fresh_per_iteration`] to rewrite the file
/// before every measured read instead.
pub struct DiskReadProbe {
    scope: SetupScope,
    file: Option<NamedTempFile>,
}

impl DiskReadProbe {
    /// Trial-scoped fixture: one temp file written once, read repeatedly.
    pub fn new() -> Self {
        Self {
            scope: SetupScope::Trial,
            file: None,
        }
    }

    /// Iteration-scoped fixture: the file is rewritten before every measured
    /// read, churning the page cache at the cost of much slower trials.
    pub fn fresh_per_iteration() -> Self {
        Self {
            scope: SetupScope::Iteration,
            file: None,
        }
    }

    /// Path of the fixture file while the trial is live.
    pub fn fixture_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    fn write_fixture(file: &mut NamedTempFile) -> Result<(), ProbeError> {
        let data = vec![0u8; DISK_FIXTURE_LEN];
        let f = file.as_file_mut();
        f.set_len(0).map_err(ProbeError::fixture)?;
        f.seek(SeekFrom::Start(0)).map_err(ProbeError::fixture)?;
        f.write_all(&data).map_err(ProbeError::fixture)?;
        f.flush().map_err(ProbeError::fixture)?;
        Ok(())
    }
}

impl Default for DiskReadProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for DiskReadProbe {
    fn name(&self) -> &'static str {
        "disk_read"
    }

    fn setup_scope(&self) -> SetupScope {
        self.scope
    }

    fn setup_trial(&mut self) -> Result<(), ProbeError> {
        let mut file = NamedTempFile::new().map_err(ProbeError::fixture)?;
        Self::write_fixture(&mut file)?;
        tracing::debug!(path = %file.path().display(), "disk fixture created");
        self.file = Some(file);
        Ok(())
    }

    fn setup_iteration(&mut self) -> Result<(), ProbeError> {
        match self.file.as_mut() {
            Some(file) => Self::write_fixture(file),
            None => Err(ProbeError::measurement("disk fixture not initialized")),
        }
    }

    fn invoke(&mut self) -> Result<Observed, ProbeError> {
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| ProbeError::measurement("disk fixture not initialized"))?;
        let data = std::fs::read(file.path()).map_err(ProbeError::measurement)?;
        Ok(Observed::Checksum(byte_checksum(&data)))
    }

    fn teardown_trial(&mut self) {
        // Dropping the NamedTempFile unlinks it; nothing survives the trial.
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_file_lifecycle() {
        let mut probe = DiskReadProbe::new();
        probe.setup_trial().unwrap();

        let path = probe.fixture_path().unwrap().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), DISK_FIXTURE_LEN as u64);

        probe.teardown_trial();
        assert!(!path.exists());
        assert!(probe.fixture_path().is_none());
    }

    #[test]
    fn test_checksum_deterministic_within_trial() {
        let mut probe = DiskReadProbe::new();
        probe.setup_trial().unwrap();

        let first = match probe.invoke().unwrap() {
            Observed::Checksum(sum) => sum,
            other => panic!("unexpected result: {other:?}"),
        };
        for _ in 0..5 {
            match probe.invoke().unwrap() {
                Observed::Checksum(sum) => assert_eq!(sum, first),
                other => panic!("unexpected result: {other:?}"),
            }
        }
        probe.teardown_trial();
    }

    #[test]
    fn test_iteration_scope_rewrites_file() {
        let mut probe = DiskReadProbe::fresh_per_iteration();
        assert_eq!(probe.setup_scope(), SetupScope::Iteration);

        probe.setup_trial().unwrap();
        probe.setup_iteration().unwrap();
        let path = probe.fixture_path().unwrap().to_path_buf();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), DISK_FIXTURE_LEN as u64);
        probe.teardown_trial();
    }

    #[test]
    fn test_invoke_before_setup_is_an_error() {
        let mut probe = DiskReadProbe::new();
        assert!(probe.invoke().is_err());
    }
}
