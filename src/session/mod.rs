//! MAS client session: worker thread and controller.
//!
//! # Lifecycle
//!
//! ```text
//!   start()
//!     │
//!     v
//! [Disconnected] ── connect ──> [Connecting] ── OK ──> [Connected] <──────┐
//!                                   │                     │ request       │
//!                                   │ error / not OK      v               │
//!                                   │               [Executing] ── done ──┘
//!                                   │                     │ I/O error
//!                                   v                     v
//!                             [Disconnected] <── [Disconnecting] <── stop()
//! ```
//!
//! The worker emits [`SessionEvent::Connected`] once the CONNECT
//! handshake succeeds, [`SessionEvent::RequestCompleted`] after every
//! request, and exactly one final [`SessionEvent::Disconnected`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use mas_client::session::{SessionController, SessionEvent};
//! use mas_client::Request;
//!
//! let (tx, rx) = crossbeam::channel::unbounded();
//! let mut controller = SessionController::new(transport, connector, tx);
//! controller.start()?;
//!
//! assert!(matches!(rx.recv()?, SessionEvent::Connected));
//! controller.submit(Request::get_folder_listing())?;
//! if let SessionEvent::RequestCompleted(request) = rx.recv()? {
//!     println!("{:?}", request.outcome());
//! }
//! controller.stop();
//! ```

mod controller;
mod srm;
mod worker;

pub use controller::SessionController;
pub use srm::negotiate as negotiate_srm;

use crate::request::Request;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session
    #[default]
    Disconnected,
    /// CONNECT in progress
    Connecting,
    /// Connected and idle
    Connected,
    /// A request is running
    Executing,
    /// Tearing down
    Disconnecting,
}

impl SessionState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::Executing => 3,
            Self::Disconnecting => 4,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Executing,
            4 => Self::Disconnecting,
            _ => Self::Disconnected,
        }
    }
}

/// Notifications from the session worker.
#[derive(Debug)]
pub enum SessionEvent {
    /// CONNECT succeeded
    Connected,
    /// The session is gone (stopped, refused or lost)
    Disconnected,
    /// A request finished; inspect its outcome
    RequestCompleted(Request),
}

/// Receiver of session events.
///
/// Called from the worker thread, one event at a time.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: SessionEvent);
}

impl<F> EventSink for F
where
    F: Fn(SessionEvent) + Send + Sync,
{
    fn emit(&self, event: SessionEvent) {
        self(event);
    }
}

impl EventSink for crossbeam::channel::Sender<SessionEvent> {
    fn emit(&self, event: SessionEvent) {
        if self.send(event).is_err() {
            tracing::debug!("session event dropped, receiver gone");
        }
    }
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<SessionEvent> {
    fn emit(&self, event: SessionEvent) {
        if self.send(event).is_err() {
            tracing::debug!("session event dropped, receiver gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        for state in [
            SessionState::Disconnected,
            SessionState::Connecting,
            SessionState::Connected,
            SessionState::Executing,
            SessionState::Disconnecting,
        ] {
            assert_eq!(SessionState::from_u8(state.as_u8()), state);
        }
    }

    #[test]
    fn test_closure_sink() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let sink = move |event: SessionEvent| {
            let _ = tx.send(matches!(event, SessionEvent::Connected));
        };

        sink.emit(SessionEvent::Connected);
        sink.emit(SessionEvent::Disconnected);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![true, false]);
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = crossbeam::channel::unbounded::<SessionEvent>();
        drop(rx);
        tx.emit(SessionEvent::Disconnected);
    }
}
