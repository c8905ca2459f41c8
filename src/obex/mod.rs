//! OBEX collaborator contracts.
//!
//! The session layer does not frame packets itself. It drives an
//! [`ObexSession`] produced by an [`ObexConnector`] over a
//! [`Transport`](crate::transport::Transport):
//!
//! ```text
//!   SessionWorker
//!        │ connect / execute / disconnect / close
//!        v
//!   ObexSession ──── srm() ───> SrmControl
//!        │
//!        v
//!   Transport (RFCOMM | L2CAP)
//! ```

mod headers;

pub use headers::{HeaderSet, ObexResponse, ResponseCode, SrmFlag};

use std::io;
use std::sync::Arc;

use crate::transport::Transport;

/// Local single-response-mode state of an OBEX client session.
pub trait SrmControl {
    /// Record whether the local side may use SRM on this connection.
    fn set_local_capability(&mut self, capable: bool);

    /// Whether the local side may use SRM on this connection.
    fn local_capability(&self) -> bool;

    /// Mark SRM as enabled for the next operation.
    fn set_local_enabled(&mut self, enabled: bool);

    /// Whether the next operation waits for per-packet flow control.
    fn set_local_wait(&mut self, wait: bool);
}

/// A client session driven by the worker.
///
/// All calls may block on the transport.
pub trait ObexSession: Send {
    /// Send CONNECT and return the response headers (status included).
    fn connect(&mut self, headers: HeaderSet) -> io::Result<HeaderSet>;

    /// Run one operation and collect its final response.
    fn execute(&mut self, headers: &HeaderSet, body: Option<&[u8]>) -> io::Result<ObexResponse>;

    /// Send DISCONNECT.
    fn disconnect(&mut self, headers: Option<HeaderSet>) -> io::Result<()>;

    /// Release the session and its transport.
    fn close(&mut self) -> io::Result<()>;

    /// Negotiate the maximum packet size offered on CONNECT.
    fn set_max_packet_size(&mut self, size: usize);

    /// SRM sub-controller.
    fn srm(&mut self) -> &mut dyn SrmControl;
}

/// Opens client sessions over a transport.
pub trait ObexConnector: Send + Sync {
    /// Open a new session. No packets are exchanged yet.
    fn open(&self, transport: Arc<dyn Transport>) -> io::Result<Box<dyn ObexSession>>;
}

impl<F> ObexConnector for F
where
    F: Fn(Arc<dyn Transport>) -> io::Result<Box<dyn ObexSession>> + Send + Sync,
{
    fn open(&self, transport: Arc<dyn Transport>) -> io::Result<Box<dyn ObexSession>> {
        self(transport)
    }
}

/// Plain SRM state holder for codecs that keep no extra bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SrmState {
    /// Local capability learned at connect time
    pub capable: bool,
    /// Enabled for the current operation
    pub enabled: bool,
    /// Waiting on flow control
    pub wait: bool,
}

impl SrmControl for SrmState {
    fn set_local_capability(&mut self, capable: bool) {
        self.capable = capable;
    }

    fn local_capability(&self) -> bool {
        self.capable
    }

    fn set_local_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_local_wait(&mut self, wait: bool) {
        self.wait = wait;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srm_state_defaults() {
        let mut srm = SrmState::default();
        assert!(!srm.local_capability());

        srm.set_local_capability(true);
        srm.set_local_enabled(true);
        srm.set_local_wait(true);
        assert_eq!(
            srm,
            SrmState {
                capable: true,
                enabled: true,
                wait: true
            }
        );
    }
}
