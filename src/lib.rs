//! # MAS Client - Bluetooth MAP client session layer
//!
//! Client side of the Message Access Service (MAS) of the Bluetooth
//! Message Access Profile. One session per remote message store:
//! a dedicated worker thread owns the OBEX session and runs requests
//! one at a time, enabling single response mode (SRM) where the
//! transport allows it.
//!
//! ## Features
//!
//! - **Serialized requests**: at most one request in flight per session
//! - **SRM negotiation**: enabled per request on L2CAP transports
//! - **Event reports**: decoding of `MAP-event-report` notification documents
//! - **Lifecycle events**: connected, request completed and disconnected
//!
//! ## Architecture
//!
//! ```text
//!   owner                 SessionController            worker thread
//!     |                          |                           |
//!     |-- start() -------------->|-- spawn ----------------->|
//!     |                          |                           |-- CONNECT (MAS target)
//!     |<------------------------------------- Connected -----|
//!     |-- submit(request) ------>|-- mailbox --------------->|
//!     |                          |                           |-- negotiate SRM
//!     |                          |                           |-- execute
//!     |<---------------------------- RequestCompleted -------|
//!     |-- stop() --------------->|-- stop signal ----------->|
//!     |                          |                           |-- DISCONNECT, close
//!     |<------------------------------------ Disconnected ---|
//! ```
//!
//! ## Quick Start
//!
//! ### Running a session
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mas_client::{Request, SessionController, SessionEvent};
//!
//! let (tx, rx) = crossbeam::channel::unbounded();
//! let mut controller = SessionController::new(transport, connector, tx);
//! controller.start()?;
//!
//! while let Ok(event) = rx.recv() {
//!     match event {
//!         SessionEvent::Connected => {
//!             controller.submit(Request::get_folder_listing())?;
//!         },
//!         SessionEvent::RequestCompleted(request) => {
//!             println!("{}: {:?}", request.kind(), request.outcome());
//!             controller.stop();
//!         },
//!         SessionEvent::Disconnected => break,
//!     }
//! }
//! ```
//!
//! ### Decoding an event report
//!
//! ```rust
//! use mas_client::{EventReport, EventType};
//!
//! let xml = r#"<MAP-event-report version="1.0">
//!     <event type="NewMessage" handle="12345678" folder="TELECOM/MSG/INBOX" msg_type="SMS_GSM"/>
//! </MAP-event-report>"#;
//!
//! let report = EventReport::parse(xml).unwrap();
//! assert_eq!(report.event_type(), EventType::NewMessage);
//! assert_eq!(report.handle(), Some("12345678"));
//! ```
//!
//! ## Modules
//!
//! - [`session`]: Session controller, worker thread and SRM negotiation
//! - [`request`]: MAP request kinds and their outcomes
//! - [`event_report`]: MAP event report decoding
//! - [`obex`]: OBEX session contracts and header sets
//! - [`transport`]: Transport kinds and socket-backed transports
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod error;
pub mod event_report;
pub mod obex;
pub mod request;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use config::{Config, SessionConfig, MAX_CLIENT_PACKET_SIZE};
pub use error::{EventReportError, MasError, Result, SubmitError};
pub use event_report::{EventReport, EventType, MessageType};
pub use obex::{HeaderSet, ObexConnector, ObexResponse, ObexSession, ResponseCode, SrmControl, SrmFlag};
pub use request::{Request, RequestKind, RequestOutcome};
pub use session::{EventSink, SessionController, SessionEvent, SessionState};
pub use transport::{SocketTransport, Transport, TransportKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// OBEX target identifying the Message Access Service
pub const MAS_TARGET_UUID: uuid::Uuid = uuid::uuid!("bb582b40-420c-11db-b0de-0800200c9a66");

/// [`MAS_TARGET_UUID`] as sent in the CONNECT target header
pub const MAS_TARGET: [u8; 16] = *MAS_TARGET_UUID.as_bytes();
