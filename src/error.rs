//! MAS client error types.
//!
//! Errors are split along the three failure classes the session layer
//! distinguishes:
//!
//! - **Transport/I-O failures** never escape the session worker. They are
//!   recorded on the affected request and surface as a
//!   [`SessionEvent::Disconnected`](crate::session::SessionEvent::Disconnected).
//! - **Protocol validation failures** come from decoding event reports
//!   ([`EventReportError`]).
//! - **Contract violations** (submitting while busy or stopped) are
//!   reported synchronously through [`SubmitError`], which hands the
//!   rejected request back to the caller.

use thiserror::Error;

use crate::request::Request;

/// MAS client errors.
#[derive(Error, Debug)]
pub enum MasError {
    /// Session lifecycle error (worker could not be started, etc.).
    #[error("Session error: {0}")]
    Session(String),

    /// A request was used outside its lifecycle.
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// An event report could not be decoded.
    #[error("Event report error: {0}")]
    EventReport(#[from] EventReportError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MAS client operations
pub type Result<T> = std::result::Result<T, MasError>;

impl From<toml::de::Error> for MasError {
    fn from(err: toml::de::Error) -> Self {
        MasError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MasError {
    fn from(err: toml::ser::Error) -> Self {
        MasError::Config(err.to_string())
    }
}

/// Reasons an event report document yields no report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventReportError {
    /// `type` attribute missing or not a known event token.
    #[error("Invalid value for type: {0:?}")]
    InvalidType(Option<String>),

    /// `msg_type` attribute is not a known message type token.
    #[error("Invalid value for msg_type: {0}")]
    InvalidMessageType(String),

    /// `handle` attribute missing or not a hexadecimal number.
    #[error("Invalid value for handle: {0:?}")]
    InvalidHandle(Option<String>),

    /// Document ended without an `event` element.
    #[error("No event element in document")]
    MissingEvent,

    /// Malformed XML.
    #[error("XML parser error: {0}")]
    Xml(String),

    /// Attribute names or values were not valid text.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<quick_xml::Error> for EventReportError {
    fn from(err: quick_xml::Error) -> Self {
        EventReportError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for EventReportError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        EventReportError::Xml(err.to_string())
    }
}

/// Rejected request submission. The request is handed back untouched.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// No worker is running for this controller.
    #[error("session worker is not running")]
    NotRunning(Request),

    /// Another request is still in flight.
    #[error("a request is already in flight")]
    Busy(Request),
}

impl SubmitError {
    /// Recover the rejected request.
    pub fn into_request(self) -> Request {
        match self {
            SubmitError::NotRunning(request) | SubmitError::Busy(request) => request,
        }
    }
}
