#![warn(missing_docs)]
//! FloorBench IPC Protocol
//!
//! Binary protocol for supervisor-worker communication when probes run with
//! process isolation. Messages are rkyv-serialized inside length-prefixed
//! frames over inherited pipe file descriptors. One probe trial produces a
//! single `Complete` (or `Failure`) message; there is no streaming.

mod framing;
mod messages;

pub use framing::{read_frame, write_frame, FrameError, FrameReader, FrameWriter, MAX_FRAME_SIZE};
pub use messages::{
    FailureKind, SupervisorCommand, TrialConfig, TrialRecord, WorkerCapabilities, WorkerMessage,
};

/// Protocol version for compatibility checking during the handshake.
pub const PROTOCOL_VERSION: u32 = 1;
