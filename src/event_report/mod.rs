//! MAP event reports.
//!
//! The message notification server pushes one `MAP-event-report`
//! document per mailbox change:
//!
//! ```xml
//! <MAP-event-report version="1.1">
//!   <event type="NewMessage" handle="20000100001" folder="telecom/msg/inbox"
//!          msg_type="SMS_GSM" subject="Hi" datetime="20240115T103000"
//!          sender_name="Alice" priority="no"/>
//! </MAP-event-report>
//! ```
//!
//! [`EventReport::from_reader`] decodes such a document into an
//! immutable [`EventReport`], or yields nothing when the document is
//! malformed or fails validation.
//!
//! # Validation
//!
//! | Field                                       | Rule                                                        |
//! |---------------------------------------------|-------------------------------------------------------------|
//! | `type`                                      | required, must be a known token                             |
//! | `handle`                                    | required hex number, dropped for `MemoryFull`/`MemoryAvailable` |
//! | `msg_type`                                  | known token or empty (treated as absent), dropped for memory events |
//! | `subject`, `datetime`, `sender_name`, `priority` | kept only for `NewMessage` in version `1.1`            |

mod parser;

use std::collections::HashMap;
use std::io::BufRead;

use chrono::NaiveDateTime;
use phf::phf_map;
use serde::Serialize;

use crate::error::EventReportError;

/// Version that carries the extended new-message fields.
pub const EXTENDED_EVENT_REPORT_1_1: &str = "1.1";

/// Event types defined by MAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    /// A message arrived
    NewMessage,
    /// A pushed message was delivered
    DeliverySuccess,
    /// A pushed message was sent
    SendingSuccess,
    /// Delivery of a pushed message failed
    DeliveryFailure,
    /// Sending a pushed message failed
    SendingFailure,
    /// Server storage is full
    MemoryFull,
    /// Server storage is available again
    MemoryAvailable,
    /// A message was deleted
    MessageDeleted,
    /// A message moved between folders
    MessageShift,
    /// A message read status changed
    ReadStatusChanged,
}

static EVENT_TYPES: phf::Map<&'static str, EventType> = phf_map! {
    "NewMessage" => EventType::NewMessage,
    "DeliverySuccess" => EventType::DeliverySuccess,
    "SendingSuccess" => EventType::SendingSuccess,
    "DeliveryFailure" => EventType::DeliveryFailure,
    "SendingFailure" => EventType::SendingFailure,
    "MemoryFull" => EventType::MemoryFull,
    "MemoryAvailable" => EventType::MemoryAvailable,
    "MessageDeleted" => EventType::MessageDeleted,
    "MessageShift" => EventType::MessageShift,
    "ReadStatusChanged" => EventType::ReadStatusChanged,
};

impl EventType {
    /// Look up a wire token.
    pub fn from_token(token: &str) -> Option<Self> {
        EVENT_TYPES.get(token).copied()
    }

    /// Wire token.
    pub fn token(&self) -> &'static str {
        match self {
            Self::NewMessage => "NewMessage",
            Self::DeliverySuccess => "DeliverySuccess",
            Self::SendingSuccess => "SendingSuccess",
            Self::DeliveryFailure => "DeliveryFailure",
            Self::SendingFailure => "SendingFailure",
            Self::MemoryFull => "MemoryFull",
            Self::MemoryAvailable => "MemoryAvailable",
            Self::MessageDeleted => "MessageDeleted",
            Self::MessageShift => "MessageShift",
            Self::ReadStatusChanged => "ReadStatusChanged",
        }
    }

    /// Memory-status events carry no message reference.
    pub fn is_memory_status(&self) -> bool {
        matches!(self, Self::MemoryFull | Self::MemoryAvailable)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Message kinds a MAS instance stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// E-mail
    Email,
    /// GSM SMS
    SmsGsm,
    /// CDMA SMS
    SmsCdma,
    /// MMS
    Mms,
}

static MESSAGE_TYPES: phf::Map<&'static str, MessageType> = phf_map! {
    "EMAIL" => MessageType::Email,
    "SMS_GSM" => MessageType::SmsGsm,
    "SMS_CDMA" => MessageType::SmsCdma,
    "MMS" => MessageType::Mms,
};

impl MessageType {
    /// Look up a wire token.
    pub fn from_token(token: &str) -> Option<Self> {
        MESSAGE_TYPES.get(token).copied()
    }

    /// Wire token.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::SmsGsm => "SMS_GSM",
            Self::SmsCdma => "SMS_CDMA",
            Self::Mms => "MMS",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// One decoded event notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReport {
    version: String,
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg_type: Option<MessageType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
}

impl EventReport {
    /// Build a report from collected attributes.
    ///
    /// `version` comes from the outer element, everything else from the
    /// `event` element.
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Result<Self, EventReportError> {
        let get = |key: &str| attrs.get(key).cloned();

        let version = get("version").unwrap_or_default();

        let event_type = attrs
            .get("type")
            .and_then(|t| EventType::from_token(t))
            .ok_or_else(|| EventReportError::InvalidType(get("type")))?;

        let (handle, msg_type) = if event_type.is_memory_status() {
            (None, None)
        } else {
            let handle = match attrs.get("handle") {
                Some(h) if is_hex_number(h) => h.clone(),
                other => return Err(EventReportError::InvalidHandle(other.cloned())),
            };

            // Some phones send an empty msg_type (seen on MessageDeleted)
            let msg_type = match attrs.get("msg_type").map(String::as_str) {
                None | Some("") => None,
                Some(token) => Some(
                    MessageType::from_token(token)
                        .ok_or_else(|| EventReportError::InvalidMessageType(token.to_string()))?,
                ),
            };

            (Some(handle), msg_type)
        };

        let extended =
            event_type == EventType::NewMessage && version == EXTENDED_EVENT_REPORT_1_1;

        let report = Self {
            event_type,
            handle,
            folder: get("folder"),
            old_folder: get("old_folder"),
            msg_type,
            subject: if extended { get("subject") } else { None },
            datetime: if extended { get("datetime") } else { None },
            sender_name: if extended { get("sender_name") } else { None },
            priority: if extended { get("priority") } else { None },
            version,
        };

        if extended {
            tracing::debug!(
                subject = ?report.subject,
                datetime = ?report.datetime,
                sender_name = ?report.sender_name,
                priority = ?report.priority,
                "received extended event report 1.1 for new message"
            );
        }

        Ok(report)
    }

    /// Decode an event report document, reporting why it failed.
    pub fn try_from_reader<R: BufRead>(input: R) -> Result<Self, EventReportError> {
        let attrs = parser::collect_attributes(input)?;
        Self::from_attributes(&attrs)
    }

    /// Decode an event report document.
    ///
    /// Failures are logged and yield `None`; there is never a partial
    /// report.
    pub fn from_reader<R: BufRead>(input: R) -> Option<Self> {
        match Self::try_from_reader(input) {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::warn!(error = %err, "Invalid event report received");
                None
            },
        }
    }

    /// Decode an event report from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        Self::from_reader(data)
    }

    /// Decode an event report from text.
    pub fn parse(xml: &str) -> Option<Self> {
        Self::from_reader(xml.as_bytes())
    }

    /// Get the `version` of the enclosing report
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the event type
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Get the message handle (hex string)
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    /// Get the folder the event refers to
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Get the previous folder (`MessageShift`)
    pub fn old_folder(&self) -> Option<&str> {
        self.old_folder.as_deref()
    }

    /// Get the message type
    pub fn msg_type(&self) -> Option<MessageType> {
        self.msg_type
    }

    /// Get the subject (new message, version 1.1)
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Get the raw timestamp (new message, version 1.1)
    pub fn datetime(&self) -> Option<&str> {
        self.datetime.as_deref()
    }

    /// Get the sender name (new message, version 1.1)
    pub fn sender_name(&self) -> Option<&str> {
        self.sender_name.as_deref()
    }

    /// Get the priority (new message, version 1.1)
    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    /// Render as JSON.
    pub fn to_json(&self, pretty: bool) -> crate::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Timestamp as `YYYYMMDDTHHMMSS`; a trailing UTC offset is ignored.
    pub fn datetime_parsed(&self) -> Option<NaiveDateTime> {
        let stamp = self.datetime.as_deref()?.get(..15)?;
        NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S").ok()
    }
}

impl std::str::FromStr for EventReport {
    type Err = EventReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_reader(s.as_bytes())
    }
}

impl std::fmt::Display for EventReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

/// Base-16 integer of any width, with an optional sign.
fn is_hex_number(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
}
