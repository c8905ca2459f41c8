//! Session worker thread.
//!
//! One worker per active session. It owns the OBEX session from CONNECT
//! until the final close and serves requests strictly one at a time.

use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use crossbeam::channel::{Receiver, Sender, TrySendError};

use super::{srm, EventSink, SessionEvent, SessionState};
use crate::config::SessionConfig;
use crate::error::{MasError, SubmitError};
use crate::obex::{HeaderSet, ObexConnector, ObexSession};
use crate::request::Request;
use crate::transport::Transport;
use crate::MAS_TARGET;

/// Session state visible to the controller.
#[derive(Debug, Default)]
pub(super) struct StateCell(AtomicU8);

impl StateCell {
    pub(super) fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: SessionState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

#[derive(Debug)]
struct Slot {
    open: bool,
    in_flight: bool,
}

/// Single-slot mailbox between the controller and the worker.
///
/// The channel wakes the worker; the slot keeps the request counted as
/// in flight from acceptance until its completion event, and closes the
/// mailbox before the worker drains it at teardown.
#[derive(Debug)]
pub(super) struct Mailbox {
    slot: Mutex<Slot>,
    tx: Sender<Request>,
}

impl Mailbox {
    pub(super) fn new() -> (Arc<Self>, Receiver<Request>) {
        let (tx, rx) = crossbeam::channel::bounded(1);
        let mailbox = Self {
            slot: Mutex::new(Slot {
                open: true,
                in_flight: false,
            }),
            tx,
        };
        (Arc::new(mailbox), rx)
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept a request if the worker is up and idle. Never blocks.
    pub(super) fn submit(&self, request: Request) -> Result<(), SubmitError> {
        let mut slot = self.lock();
        if !slot.open {
            return Err(SubmitError::NotRunning(request));
        }
        if slot.in_flight {
            return Err(SubmitError::Busy(request));
        }

        match self.tx.try_send(request) {
            Ok(()) => {
                slot.in_flight = true;
                Ok(())
            },
            Err(TrySendError::Full(request)) => Err(SubmitError::Busy(request)),
            Err(TrySendError::Disconnected(request)) => {
                slot.open = false;
                Err(SubmitError::NotRunning(request))
            },
        }
    }

    pub(super) fn is_busy(&self) -> bool {
        self.lock().in_flight
    }

    fn complete(&self) {
        self.lock().in_flight = false;
    }

    fn close(&self) {
        self.lock().open = false;
    }
}

/// Everything the worker thread owns.
pub(super) struct Worker {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) connector: Arc<dyn ObexConnector>,
    pub(super) sink: Arc<dyn EventSink>,
    pub(super) config: SessionConfig,
    pub(super) mailbox: Arc<Mailbox>,
    pub(super) state: Arc<StateCell>,
    pub(super) requests: Receiver<Request>,
    pub(super) stop: Receiver<()>,
}

impl Worker {
    /// Thread body: connect, serve, disconnect.
    pub(super) fn run(self) {
        let session_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "mas_session",
            id = %session_id,
            transport = %self.transport.kind()
        );
        let _enter = span.enter();

        if let Some(mut session) = self.connect() {
            self.sink.emit(SessionEvent::Connected);
            self.serve(session.as_mut());
            self.mailbox.close();
            self.disconnect(session);
        }

        self.state.set(SessionState::Disconnected);
        self.drain();
        self.sink.emit(SessionEvent::Disconnected);
    }

    fn connect(&self) -> Option<Box<dyn ObexSession>> {
        self.state.set(SessionState::Connecting);

        let mut session = match self.connector.open(Arc::clone(&self.transport)) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "failed to open OBEX session");
                return None;
            },
        };

        let mps = self.config.max_packet_size.min(self.transport.max_packet_size());
        tracing::info!(mps, "connect");
        session.set_max_packet_size(mps);

        let headers = HeaderSet::new().with_target(Bytes::from_static(&MAS_TARGET));
        match session.connect(headers) {
            Ok(reply) if reply.is_success() => {
                let capable = self.config.srm && self.transport.is_srm_capable();
                session.srm().set_local_capability(capable);
                self.state.set(SessionState::Connected);
                tracing::info!(srm = capable, "connected");
                Some(session)
            },
            Ok(reply) => {
                tracing::warn!(code = ?reply.response_code, "CONNECT refused");
                self.disconnect(session);
                None
            },
            Err(e) => {
                tracing::warn!(error = %e, "handled connect exception");
                if let Err(e) = session.close() {
                    tracing::debug!(error = %e, "close after failed connect");
                }
                None
            },
        }
    }

    fn serve(&self, session: &mut dyn ObexSession) {
        loop {
            crossbeam::select! {
                recv(self.stop) -> _ => {
                    tracing::debug!("stop requested");
                    return;
                }
                recv(self.requests) -> msg => {
                    let Ok(mut request) = msg else {
                        return;
                    };

                    let fatal = self.execute(session, &mut request);
                    self.mailbox.complete();
                    self.sink.emit(SessionEvent::RequestCompleted(request));

                    if fatal {
                        return;
                    }
                }
            }
        }
    }

    /// Run one request. Returns true if the connection is lost.
    fn execute(&self, session: &mut dyn ObexSession, request: &mut Request) -> bool {
        self.state.set(SessionState::Executing);
        srm::negotiate(session.srm(), request);

        let fatal = match request.execute(session) {
            Ok(()) => false,
            Err(MasError::Io(e)) => {
                tracing::warn!(kind = %request.kind(), error = %e, "request failed, disconnecting");
                true
            },
            Err(e) => {
                tracing::warn!(kind = %request.kind(), error = %e, "request not executed");
                false
            },
        };

        self.state.set(SessionState::Connected);
        fatal
    }

    fn disconnect(&self, mut session: Box<dyn ObexSession>) {
        self.state.set(SessionState::Disconnecting);
        tracing::info!("disconnect");

        if let Err(e) = session.disconnect(None) {
            tracing::debug!(error = %e, "disconnect failed");
        }

        if let Err(e) = session.close() {
            tracing::warn!(error = %e, "handled disconnect exception");
        }
    }

    /// Close the mailbox and hand back anything that never ran.
    fn drain(&self) {
        self.mailbox.close();

        while let Ok(mut request) = self.requests.try_recv() {
            request.fail(&io::Error::new(
                io::ErrorKind::NotConnected,
                "session closed before request ran",
            ));
            self.mailbox.complete();
            self.sink.emit(SessionEvent::RequestCompleted(request));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestKind;

    #[test]
    fn test_mailbox_single_slot() {
        let (mailbox, rx) = Mailbox::new();

        mailbox.submit(Request::get_folder_listing()).unwrap();
        assert!(mailbox.is_busy());

        let err = mailbox.submit(Request::get_message("1")).unwrap_err();
        assert!(matches!(err, SubmitError::Busy(_)));
        assert_eq!(err.into_request().kind(), RequestKind::GetMessage);

        // Dequeued but not completed: still in flight
        let taken = rx.try_recv().unwrap();
        assert_eq!(taken.kind(), RequestKind::GetFolderListing);
        assert!(matches!(
            mailbox.submit(Request::update_inbox()),
            Err(SubmitError::Busy(_))
        ));

        mailbox.complete();
        mailbox.submit(Request::update_inbox()).unwrap();
    }

    #[test]
    fn test_mailbox_closed() {
        let (mailbox, rx) = Mailbox::new();
        mailbox.close();
        assert!(matches!(
            mailbox.submit(Request::get_folder_listing()),
            Err(SubmitError::NotRunning(_))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mailbox_receiver_gone() {
        let (mailbox, rx) = Mailbox::new();
        drop(rx);
        assert!(matches!(
            mailbox.submit(Request::get_folder_listing()),
            Err(SubmitError::NotRunning(_))
        ));
        assert!(!mailbox.is_busy());
    }
}
