//! Loopback network round-trip.

use floorbench_core::{Observed, Probe, ProbeError};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

/// Bound on one reachability check.
pub const REACHABILITY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Checks whether the loopback host answers within 1000 ms and returns the
/// boolean result. This is a reachability check, not a payload transfer:
/// a TCP connect against the echo port where either an accept or an RST
/// counts as an answer. A timeout or unroutable error resolves to `false`,
/// never to a probe error, so an unreachable host cannot stall the suite
/// beyond the bound.
pub struct NetRoundTripProbe {
    target: SocketAddr,
    timeout: Duration,
}

impl NetRoundTripProbe {
    /// Probe loopback on the echo port with the default 1000 ms bound.
    pub fn new() -> Self {
        Self {
            target: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 7),
            timeout: REACHABILITY_TIMEOUT,
        }
    }

    /// Probe an arbitrary target with a custom bound (used by tests).
    pub fn with_target(target: SocketAddr, timeout: Duration) -> Self {
        Self { target, timeout }
    }
}

impl Default for NetRoundTripProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` when the host produced any answer within the bound. A refused or
/// reset connection is an answer: the network stack round-tripped and the
/// host's kernel responded. Only silence (timeout) or an unroutable path
/// count as unreachable.
fn reachable(target: &SocketAddr, timeout: Duration) -> bool {
    match TcpStream::connect_timeout(target, timeout) {
        Ok(_) => true,
        Err(e) => matches!(
            e.kind(),
            io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
        ),
    }
}

impl Probe for NetRoundTripProbe {
    fn name(&self) -> &'static str {
        "net_roundtrip"
    }

    fn setup_trial(&mut self) -> Result<(), ProbeError> {
        // No fixture; the loopback interface is the state under test.
        Ok(())
    }

    fn invoke(&mut self) -> Result<Observed, ProbeError> {
        Ok(Observed::Reachable(reachable(&self.target, self.timeout)))
    }

    fn teardown_trial(&mut self) {}
}
