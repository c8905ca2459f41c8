//! MAS requests.
//!
//! A [`Request`] is one OBEX operation against the message access
//! server: a [`RequestKind`] from a closed set, its headers and an
//! optional outgoing body. Requests are submitted once, executed once by
//! the session worker and handed back with their [`RequestOutcome`].
//!
//! | Kind                          | OBEX op | Type header                          | SRM |
//! |-------------------------------|---------|--------------------------------------|-----|
//! | `GetFolderListing`            | GET     | `x-obex/folder-listing`              | yes |
//! | `GetFolderListingSize`        | GET     | `x-obex/folder-listing`              | yes |
//! | `GetMessagesListing`          | GET     | `x-bt/MAP-msg-listing`               | yes |
//! | `GetMessagesListingSize`      | GET     | `x-bt/MAP-msg-listing`               | yes |
//! | `GetMessage`                  | GET     | `x-bt/message`                       | yes |
//! | `PushMessage`                 | PUT     | `x-bt/message`                       | yes |
//! | `SetPath`                     | SETPATH | -                                    | no  |
//! | `SetMessageStatus`            | PUT     | `x-bt/messageStatus`                 | no  |
//! | `SetNotificationRegistration` | PUT     | `x-bt/MAP-NotificationRegistration`  | no  |
//! | `UpdateInbox`                 | PUT     | `x-bt/MAP-messageUpdate`             | no  |

use std::io;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{MasError, Result};
use crate::obex::{HeaderSet, ObexResponse, ObexSession};

/// Folder listing object type
pub const TYPE_FOLDER_LISTING: &str = "x-obex/folder-listing";
/// Messages listing object type
pub const TYPE_MESSAGES_LISTING: &str = "x-bt/MAP-msg-listing";
/// bMessage object type
pub const TYPE_MESSAGE: &str = "x-bt/message";
/// Message status object type
pub const TYPE_MESSAGE_STATUS: &str = "x-bt/messageStatus";
/// Notification registration object type
pub const TYPE_NOTIFICATION_REGISTRATION: &str = "x-bt/MAP-NotificationRegistration";
/// Inbox update object type
pub const TYPE_MESSAGE_UPDATE: &str = "x-bt/MAP-messageUpdate";

/// Operation kinds the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    /// List subfolders of the current folder
    GetFolderListing,
    /// Count subfolders of the current folder
    GetFolderListingSize,
    /// List messages in a folder
    GetMessagesListing,
    /// Count messages in a folder
    GetMessagesListingSize,
    /// Fetch one message
    GetMessage,
    /// Upload a message for sending
    PushMessage,
    /// Navigate the folder tree
    SetPath,
    /// Change read/deleted status
    SetMessageStatus,
    /// Turn event notifications on or off
    SetNotificationRegistration,
    /// Ask the server to check for new messages
    UpdateInbox,
}

impl RequestKind {
    /// Every kind, in declaration order.
    pub const ALL: [RequestKind; 10] = [
        RequestKind::GetFolderListing,
        RequestKind::GetFolderListingSize,
        RequestKind::GetMessagesListing,
        RequestKind::GetMessagesListingSize,
        RequestKind::GetMessage,
        RequestKind::PushMessage,
        RequestKind::SetPath,
        RequestKind::SetMessageStatus,
        RequestKind::SetNotificationRegistration,
        RequestKind::UpdateInbox,
    ];

    /// Whether this kind may run in single response mode.
    pub fn is_srm_eligible(&self) -> bool {
        match self {
            Self::GetFolderListing
            | Self::GetFolderListingSize
            | Self::GetMessagesListing
            | Self::GetMessagesListingSize
            | Self::GetMessage
            | Self::PushMessage => true,
            Self::SetPath
            | Self::SetMessageStatus
            | Self::SetNotificationRegistration
            | Self::UpdateInbox => false,
        }
    }

    /// Get descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetFolderListing => "get-folder-listing",
            Self::GetFolderListingSize => "get-folder-listing-size",
            Self::GetMessagesListing => "get-messages-listing",
            Self::GetMessagesListingSize => "get-messages-listing-size",
            Self::GetMessage => "get-message",
            Self::PushMessage => "push-message",
            Self::SetPath => "set-path",
            Self::SetMessageStatus => "set-message-status",
            Self::SetNotificationRegistration => "set-notification-registration",
            Self::UpdateInbox => "update-inbox",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| format!("Unknown request kind: {}", s))
    }
}

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Not executed yet
    Pending,
    /// The server answered (any status)
    Completed(ObexResponse),
    /// The transport failed while executing
    Failed(String),
}

/// One MAS operation.
#[derive(Debug, Clone)]
pub struct Request {
    kind: RequestKind,
    headers: HeaderSet,
    body: Option<Bytes>,
    outcome: RequestOutcome,
}

impl Request {
    /// Create a request with explicit headers
    pub fn new(kind: RequestKind, headers: HeaderSet) -> Self {
        Self {
            kind,
            headers,
            body: None,
            outcome: RequestOutcome::Pending,
        }
    }

    /// Attach an outgoing body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// List subfolders of the current folder
    pub fn get_folder_listing() -> Self {
        Self::new(
            RequestKind::GetFolderListing,
            HeaderSet::new().with_mime_type(TYPE_FOLDER_LISTING),
        )
    }

    /// Count subfolders of the current folder
    pub fn get_folder_listing_size() -> Self {
        Self::new(
            RequestKind::GetFolderListingSize,
            HeaderSet::new().with_mime_type(TYPE_FOLDER_LISTING),
        )
    }

    /// List messages in `folder` (relative to the current folder)
    pub fn get_messages_listing(folder: &str) -> Self {
        Self::new(
            RequestKind::GetMessagesListing,
            HeaderSet::new()
                .with_name(folder)
                .with_mime_type(TYPE_MESSAGES_LISTING),
        )
    }

    /// Count messages in `folder`
    pub fn get_messages_listing_size(folder: &str) -> Self {
        Self::new(
            RequestKind::GetMessagesListingSize,
            HeaderSet::new()
                .with_name(folder)
                .with_mime_type(TYPE_MESSAGES_LISTING),
        )
    }

    /// Fetch the message with the given handle
    pub fn get_message(handle: &str) -> Self {
        Self::new(
            RequestKind::GetMessage,
            HeaderSet::new()
                .with_name(handle)
                .with_mime_type(TYPE_MESSAGE),
        )
    }

    /// Upload an encoded bMessage into `folder`
    pub fn push_message(folder: &str, bmessage: impl Into<Bytes>) -> Self {
        Self::new(
            RequestKind::PushMessage,
            HeaderSet::new()
                .with_name(folder)
                .with_mime_type(TYPE_MESSAGE),
        )
        .with_body(bmessage)
    }

    /// Navigate into `folder`
    pub fn set_path(folder: &str) -> Self {
        Self::new(RequestKind::SetPath, HeaderSet::new().with_name(folder))
    }

    /// Change the status of the message with the given handle
    pub fn set_message_status(handle: &str, app_parameters: impl Into<Bytes>) -> Self {
        Self::new(
            RequestKind::SetMessageStatus,
            HeaderSet::new()
                .with_name(handle)
                .with_mime_type(TYPE_MESSAGE_STATUS)
                .with_app_parameters(app_parameters),
        )
        .with_body(Bytes::from_static(&[0x30]))
    }

    /// Turn event notifications on or off
    pub fn set_notification_registration(app_parameters: impl Into<Bytes>) -> Self {
        Self::new(
            RequestKind::SetNotificationRegistration,
            HeaderSet::new()
                .with_mime_type(TYPE_NOTIFICATION_REGISTRATION)
                .with_app_parameters(app_parameters),
        )
        .with_body(Bytes::from_static(&[0x30]))
    }

    /// Ask the server to refresh the inbox
    pub fn update_inbox() -> Self {
        Self::new(
            RequestKind::UpdateInbox,
            HeaderSet::new().with_mime_type(TYPE_MESSAGE_UPDATE),
        )
        .with_body(Bytes::from_static(&[0x30]))
    }

    /// Get request kind
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Get outgoing headers
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Mutable access to outgoing headers
    pub fn headers_mut(&mut self) -> &mut HeaderSet {
        &mut self.headers
    }

    /// Get outgoing body
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Get lifecycle outcome
    pub fn outcome(&self) -> &RequestOutcome {
        &self.outcome
    }

    /// Check if the request has not run yet
    pub fn is_pending(&self) -> bool {
        matches!(self.outcome, RequestOutcome::Pending)
    }

    /// Check if the server answered with success
    pub fn is_success(&self) -> bool {
        matches!(&self.outcome, RequestOutcome::Completed(r) if r.is_success())
    }

    /// Server response, if any
    pub fn response(&self) -> Option<&ObexResponse> {
        match &self.outcome {
            RequestOutcome::Completed(response) => Some(response),
            _ => None,
        }
    }

    /// Transport error message, if the request failed
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RequestOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Run the request against a session.
    ///
    /// Returns the I/O error so the caller can treat it as connection
    /// loss; the error is also recorded as [`RequestOutcome::Failed`].
    /// A request that already ran is refused without touching the
    /// session.
    pub fn execute(&mut self, session: &mut dyn ObexSession) -> Result<()> {
        if !self.is_pending() {
            return Err(MasError::Request(format!(
                "{} request already executed",
                self.kind
            )));
        }

        match session.execute(&self.headers, self.body.as_deref()) {
            Ok(response) => {
                self.outcome = RequestOutcome::Completed(response);
                Ok(())
            },
            Err(err) => {
                self.outcome = RequestOutcome::Failed(err.to_string());
                Err(MasError::Io(err))
            },
        }
    }

    /// Record a failure without executing (request dropped at teardown).
    pub(crate) fn fail(&mut self, err: &io::Error) {
        if self.is_pending() {
            self.outcome = RequestOutcome::Failed(err.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obex::{ResponseCode, SrmControl, SrmState};
    use std::str::FromStr;

    struct EchoSession {
        srm: SrmState,
        calls: usize,
        fail: bool,
    }

    impl ObexSession for EchoSession {
        fn connect(&mut self, headers: HeaderSet) -> io::Result<HeaderSet> {
            Ok(headers.with_response_code(ResponseCode::OK))
        }

        fn execute(&mut self, headers: &HeaderSet, body: Option<&[u8]>) -> io::Result<ObexResponse> {
            self.calls += 1;
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link lost"));
            }
            let mut response = ObexResponse::new(ResponseCode::OK)
                .with_body(body.map(<[u8]>::to_vec).unwrap_or_default());
            response.headers = headers.clone();
            Ok(response)
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

    fn session(fail: bool) -> EchoSession {
        EchoSession {
            srm: SrmState::default(),
            calls: 0,
            fail,
        }
    }

    #[test]
    fn test_srm_eligible_set() {
        let eligible: Vec<_> = RequestKind::ALL
            .into_iter()
            .filter(RequestKind::is_srm_eligible)
            .collect();
        assert_eq!(
            eligible,
            vec![
                RequestKind::GetFolderListing,
                RequestKind::GetFolderListingSize,
                RequestKind::GetMessagesListing,
                RequestKind::GetMessagesListingSize,
                RequestKind::GetMessage,
                RequestKind::PushMessage,
            ]
        );
    }

    #[test]
    fn test_kind_from_str() {
        for kind in RequestKind::ALL {
            assert_eq!(RequestKind::from_str(kind.name()).unwrap(), kind);
        }
        assert_eq!(
            RequestKind::from_str("GET_MESSAGE").unwrap(),
            RequestKind::GetMessage
        );
        assert!(RequestKind::from_str("delete-everything").is_err());
    }

    #[test]
    fn test_constructors_fill_headers() {
        let req = Request::get_message("20000100001");
        assert_eq!(req.headers().name.as_deref(), Some("20000100001"));
        assert_eq!(req.headers().mime_type.as_deref(), Some(TYPE_MESSAGE));
        assert!(req.body().is_none());

        let req = Request::push_message("telecom/msg/outbox", "BEGIN:BMSG");
        assert_eq!(req.kind(), RequestKind::PushMessage);
        assert_eq!(req.body().map(|b| &b[..]), Some(&b"BEGIN:BMSG"[..]));

        let req = Request::update_inbox();
        assert_eq!(req.headers().mime_type.as_deref(), Some(TYPE_MESSAGE_UPDATE));
    }

    #[test]
    fn test_execute_records_response() {
        let mut s = session(false);
        let mut req = Request::push_message("outbox", "payload");
        assert!(req.is_pending());

        req.execute(&mut s).unwrap();
        assert!(req.is_success());
        assert_eq!(&req.response().unwrap().body[..], b"payload");
        assert!(req.error().is_none());
    }

    #[test]
    fn test_execute_records_failure() {
        let mut s = session(true);
        let mut req = Request::get_folder_listing();

        let err = req.execute(&mut s).unwrap_err();
        assert!(matches!(err, MasError::Io(_)));
        assert_eq!(req.error(), Some("link lost"));
        assert!(!req.is_success());
    }

    #[test]
    fn test_execute_only_once() {
        let mut s = session(false);
        let mut req = Request::get_folder_listing();
        req.execute(&mut s).unwrap();

        let err = req.execute(&mut s).unwrap_err();
        assert!(matches!(err, MasError::Request(_)));
        assert_eq!(s.calls, 1);
    }
}
