//! Owner-facing handle on one MAS session.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Sender;

use super::worker::{Mailbox, StateCell, Worker};
use super::{EventSink, SessionState};
use crate::config::SessionConfig;
use crate::error::{MasError, Result, SubmitError};
use crate::obex::ObexConnector;
use crate::request::Request;
use crate::transport::{Transport, TransportKind};

struct WorkerHandle {
    thread: JoinHandle<()>,
    stop: Sender<()>,
    mailbox: Arc<Mailbox>,
    state: Arc<StateCell>,
}

/// Starts, feeds and stops the session worker.
///
/// All methods are non-blocking except [`stop`](Self::stop), which waits
/// for the worker to finish its teardown.
pub struct SessionController {
    transport: Arc<dyn Transport>,
    connector: Arc<dyn ObexConnector>,
    sink: Arc<dyn EventSink>,
    config: SessionConfig,
    worker: Option<WorkerHandle>,
}

impl SessionController {
    /// Create a stopped controller with the default session config.
    pub fn new(
        transport: Arc<dyn Transport>,
        connector: Arc<dyn ObexConnector>,
        sink: impl EventSink + 'static,
    ) -> Self {
        Self::with_config(transport, connector, sink, SessionConfig::default())
    }

    /// Create a stopped controller with an explicit session config.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        connector: Arc<dyn ObexConnector>,
        sink: impl EventSink + 'static,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            connector,
            sink: Arc::new(sink),
            config,
            worker: None,
        }
    }

    /// Spawn the worker, which connects and then waits for requests.
    ///
    /// Does nothing if a worker is already running. A worker that has
    /// finished on its own (refused or lost connection) is reaped and
    /// replaced.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            tracing::debug!("session worker already running");
            return Ok(());
        }
        self.reap();

        let (mailbox, requests) = Mailbox::new();
        let (stop_tx, stop_rx) = crossbeam::channel::bounded(1);
        let state = Arc::new(StateCell::default());

        let worker = Worker {
            transport: Arc::clone(&self.transport),
            connector: Arc::clone(&self.connector),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
            mailbox: Arc::clone(&mailbox),
            state: Arc::clone(&state),
            requests,
            stop: stop_rx,
        };

        let thread = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(|e| MasError::Session(format!("Failed to spawn session worker: {e}")))?;

        tracing::info!(transport = %self.transport.kind(), "session worker started");
        self.worker = Some(WorkerHandle {
            thread,
            stop: stop_tx,
            mailbox,
            state,
        });
        Ok(())
    }

    /// Ask the worker to disconnect and wait for it to exit.
    ///
    /// Safe to call repeatedly and when never started. When called from
    /// the worker thread itself (e.g. inside an event sink) the stop is
    /// signalled but not awaited.
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        // A full channel means a stop is already pending.
        let _ = handle.stop.try_send(());

        if handle.thread.thread().id() == thread::current().id() {
            tracing::warn!("stop called from the session worker, not joining");
            return;
        }

        if handle.thread.join().is_err() {
            tracing::error!("session worker panicked");
        }
        tracing::info!("session worker stopped");
    }

    /// Hand a request to the worker.
    ///
    /// Fails with [`SubmitError::NotRunning`] when there is no live
    /// worker and [`SubmitError::Busy`] while another request is still
    /// in flight. The request is returned inside the error either way.
    pub fn submit(&self, request: Request) -> std::result::Result<(), SubmitError> {
        match &self.worker {
            Some(handle) => handle.mailbox.submit(request),
            None => Err(SubmitError::NotRunning(request)),
        }
    }

    /// Boolean form of [`submit`](Self::submit); the request is dropped
    /// when rejected.
    pub fn make_request(&self, request: Request) -> bool {
        match self.submit(request) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "request rejected");
                false
            },
        }
    }

    /// Kind of the underlying transport.
    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Whether a worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|handle| !handle.thread.is_finished())
    }

    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|handle| handle.mailbox.is_busy())
    }

    /// Current session state as last published by the worker.
    pub fn state(&self) -> SessionState {
        self.worker
            .as_ref()
            .map_or(SessionState::Disconnected, |handle| handle.state.get())
    }

    fn reap(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.thread.join().is_err() {
                tracing::error!("session worker panicked");
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("transport", &self.transport.kind())
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obex::{HeaderSet, ObexResponse, ObexSession, ResponseCode, SrmControl, SrmState};
    use crate::session::SessionEvent;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    struct NullTransport;

    impl Transport for NullTransport {
        fn kind(&self) -> TransportKind {
            TransportKind::Rfcomm
        }
        fn open_input(&self) -> io::Result<Box<dyn io::Read + Send>> {
            Ok(Box::new(io::empty()))
        }
        fn open_output(&self) -> io::Result<Box<dyn io::Write + Send>> {
            Ok(Box::new(io::sink()))
        }
        fn close(&self) -> io::Result<()> {
            Ok(())
        }
    }

    struct OkSession {
        srm: SrmState,
        gate: Arc<Mutex<()>>,
    }

    impl ObexSession for OkSession {
        fn connect(&mut self, _headers: HeaderSet) -> io::Result<HeaderSet> {
            Ok(HeaderSet::new().with_response_code(ResponseCode::OK))
        }
        fn execute(&mut self, _headers: &HeaderSet, _body: Option<&[u8]>) -> io::Result<ObexResponse> {
            let _held = self.gate.lock().unwrap();
            Ok(ObexResponse::new(ResponseCode::OK))
        }
        fn disconnect(&mut self, _headers: Option<HeaderSet>) -> io::Result<()> {
            Ok(())
        }
        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn set_max_packet_size(&mut self, _size: usize) {}
        fn srm(&mut self) -> &mut dyn SrmControl {
            &mut self.srm
        }
    }

    fn controller(gate: Arc<Mutex<()>>) -> (SessionController, crossbeam::channel::Receiver<SessionEvent>) {
        let (tx, rx) = crossbeam::channel::unbounded();
        let connector = move |_t: Arc<dyn Transport>| -> io::Result<Box<dyn ObexSession>> {
            Ok(Box::new(OkSession {
                srm: SrmState::default(),
                gate: Arc::clone(&gate),
            }))
        };
        let controller = SessionController::new(Arc::new(NullTransport), Arc::new(connector), tx);
        (controller, rx)
    }

    #[test]
    fn test_submit_before_start() {
        let (controller, _rx) = controller(Arc::default());
        assert!(!controller.is_running());
        assert!(matches!(
            controller.submit(Request::get_folder_listing()),
            Err(SubmitError::NotRunning(_))
        ));
        assert!(!controller.make_request(Request::update_inbox()));
        assert_eq!(controller.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_stop_without_start() {
        let (mut controller, _rx) = controller(Arc::default());
        controller.stop();
        controller.stop();
    }

    #[test]
    fn test_busy_while_in_flight() {
        let gate = Arc::new(Mutex::new(()));
        let (mut controller, rx) = controller(Arc::clone(&gate));
        controller.start().unwrap();
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            SessionEvent::Connected
        ));

        let held = gate.lock().unwrap();
        assert!(controller.make_request(Request::get_folder_listing()));
        assert!(controller.is_busy());
        assert!(!controller.make_request(Request::get_message("1")));
        drop(held);

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            SessionEvent::RequestCompleted(req) => assert!(req.is_success()),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!controller.is_busy());
        assert!(controller.make_request(Request::update_inbox()));

        controller.stop();
        let rest: Vec<_> = rx.try_iter().collect();
        assert!(matches!(rest.last(), Some(SessionEvent::Disconnected)));
        assert!(!controller.is_running());
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut controller, rx) = controller(Arc::default());
        controller.start().unwrap();
        controller.start().unwrap();
        controller.stop();

        let connected = rx
            .try_iter()
            .filter(|e| matches!(e, SessionEvent::Connected))
            .count();
        assert_eq!(connected, 1);
    }

    #[test]
    fn test_transport_kind() {
        let (controller, _rx) = controller(Arc::default());
        assert_eq!(controller.transport_kind(), TransportKind::Rfcomm);
    }
}
