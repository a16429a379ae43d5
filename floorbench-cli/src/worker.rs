//! Worker Process Entry Point
//!
//! Handles the worker side of the supervisor-worker architecture.
//!
//! On Unix, uses fd 3/4 for IPC (set via `FLOOR_IPC_FD` env var) and installs
//! a SIGTERM handler for graceful shutdown. On non-Unix, falls back to
//! stdin/stdout and skips signal handling.

use floorbench_core::{pin_to_cpu, run_trial, ProbeError, TrialPlan};
use floorbench_ipc::{
    FailureKind, FrameReader, FrameWriter, SupervisorCommand, TrialConfig, TrialRecord,
    WorkerCapabilities, WorkerMessage,
};
use floorbench_probes::probe_by_name;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(unix)]
use std::os::unix::io::FromRawFd;

/// Global flag set by SIGTERM handler to request graceful shutdown.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if a graceful shutdown has been requested via SIGTERM.
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Relaxed)
}

/// Install a SIGTERM handler that sets the `SHUTDOWN_REQUESTED` flag.
/// The handler is async-signal-safe (only sets an atomic).
#[cfg(unix)]
fn install_sigterm_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigterm_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGTERM, &sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigterm_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

/// No-op on non-Unix (no SIGTERM equivalent).
#[cfg(not(unix))]
fn install_sigterm_handler() {}

/// IPC transport: either inherited fd pair or stdin/stdout fallback.
enum IpcTransport {
    #[cfg(unix)]
    Fds {
        read_fd: i32,
        write_fd: i32,
    },
    Stdio,
}

fn detect_transport() -> IpcTransport {
    #[cfg(unix)]
    if let Ok(val) = std::env::var("FLOOR_IPC_FD") {
        let parts: Vec<&str> = val.split(',').collect();
        if parts.len() == 2 {
            if let (Ok(r), Ok(w)) = (parts[0].parse::<i32>(), parts[1].parse::<i32>()) {
                return IpcTransport::Fds {
                    read_fd: r,
                    write_fd: w,
                };
            }
        }
        eprintln!(
            "floorbench: warning: invalid FLOOR_IPC_FD={val:?} (expected format: <read_fd>,<write_fd>), falling back to stdio"
        );
    }
    IpcTransport::Stdio
}

/// Worker main loop
pub struct WorkerMain {
    reader: FrameReader<Box<dyn std::io::Read>>,
    writer: FrameWriter<Box<dyn std::io::Write>>,
}

impl WorkerMain {
    /// Create a new worker, using fd 3/4 if FLOOR_IPC_FD is set, otherwise stdin/stdout.
    pub fn new() -> Self {
        match detect_transport() {
            #[cfg(unix)]
            IpcTransport::Fds { read_fd, write_fd } => {
                let read_file = unsafe { std::fs::File::from_raw_fd(read_fd) };
                let write_file = unsafe { std::fs::File::from_raw_fd(write_fd) };
                Self {
                    reader: FrameReader::new(Box::new(read_file) as Box<dyn std::io::Read>),
                    writer: FrameWriter::new(Box::new(write_file) as Box<dyn std::io::Write>),
                }
            }
            IpcTransport::Stdio => Self {
                reader: FrameReader::new(Box::new(std::io::stdin()) as Box<dyn std::io::Read>),
                writer: FrameWriter::new(Box::new(std::io::stdout()) as Box<dyn std::io::Write>),
            },
        }
    }

    /// Run the worker main loop
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        install_sigterm_handler();

        // Send capabilities
        self.writer
            .write(&WorkerMessage::Hello(WorkerCapabilities::default()))?;

        // Pin to CPU 0 for stable timing
        let _ = pin_to_cpu(0);

        // Process commands
        loop {
            if shutdown_requested() {
                break;
            }

            let command: SupervisorCommand = self.reader.read()?;

            match command {
                SupervisorCommand::Run { probe, config } => {
                    self.run_probe(&probe, &config)?;
                    if shutdown_requested() {
                        break;
                    }
                }
                SupervisorCommand::Shutdown => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run a single probe's trial and report the outcome
    fn run_probe(
        &mut self,
        name: &str,
        config: &TrialConfig,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut probe = match probe_by_name(name) {
            Some(p) => p,
            None => {
                self.writer.write(&WorkerMessage::Failure {
                    kind: FailureKind::UnknownProbe,
                    message: format!("Probe not found: {}", name),
                })?;
                return Ok(());
            }
        };

        let plan = TrialPlan {
            warmup_batches: config.warmup_batches,
            warmup_window_ns: config.warmup_window_ns,
            measure_batches: config.measure_batches,
            measure_window_ns: config.measure_window_ns,
        };

        // Run with panic catching
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_trial(probe.as_mut(), &plan)
        }));

        match result {
            Ok(Ok(trial)) => {
                self.writer.write(&WorkerMessage::Complete(TrialRecord {
                    probe: trial.probe,
                    invocations: trial.invocations,
                    total_ns: trial.total_ns,
                    batch_mean_ns: trial.batch_mean_ns,
                }))?;
            }
            Ok(Err(error)) => {
                let kind = match error {
                    ProbeError::FixtureSetup(_) => FailureKind::FixtureSetup,
                    ProbeError::Measurement(_) => FailureKind::Measurement,
                };
                self.writer.write(&WorkerMessage::Failure {
                    kind,
                    message: error.to_string(),
                })?;
            }
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                self.writer.write(&WorkerMessage::Failure {
                    kind: FailureKind::Panic,
                    message,
                })?;
            }
        }

        Ok(())
    }
}

impl Default for WorkerMain {
    fn default() -> Self {
        Self::new()
    }
}
