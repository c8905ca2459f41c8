//! Transport layer abstraction for the MAS client.
//!
//! MAP runs OBEX over one of two Bluetooth transports:
//! - **RFCOMM**: stream-oriented, classic OBEX framing
//! - **L2CAP**: connection-oriented channel (OBEX over L2CAP, MAP 1.2+),
//!   the only transport that may use single response mode
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            SessionController            │
//! │          (Transport-Agnostic)           │
//! └──────────────────┬──────────────────────┘
//!                    │
//!                    ▼
//!          ┌───────────────────┐
//!          │ SocketTransport<S>│
//!          │  kind: Rfcomm |   │
//!          │        L2cap      │
//!          └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mas_client::transport::{SocketTransport, TransportKind};
//!
//! let transport = SocketTransport::new(socket, TransportKind::L2cap);
//! assert!(transport.is_srm_capable());
//! ```

mod socket;

pub use socket::{Socket, SocketTransport};

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

/// Largest OBEX packet the transport carries.
pub const MAX_PACKET_SIZE: usize = 0xFFFE;

/// Transport kind a session runs over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// RFCOMM stream (default)
    #[default]
    Rfcomm,
    /// L2CAP connection-oriented channel
    L2cap,
}

impl TransportKind {
    /// Get descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rfcomm => "RFCOMM",
            Self::L2cap => "L2CAP",
        }
    }

    /// Whether OBEX over this transport may use single response mode.
    pub fn supports_srm(&self) -> bool {
        matches!(self, Self::L2cap)
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rfcomm" | "stream" => Ok(Self::Rfcomm),
            "l2cap" | "l2cap-coc" => Ok(Self::L2cap),
            _ => Err(format!("Unknown transport kind: {}", s)),
        }
    }
}

/// Byte transport underneath an OBEX session.
///
/// Implementations own the socket; the OBEX codec opens the streams
/// and the session worker closes the transport through the session.
pub trait Transport: Send + Sync {
    /// Transport kind.
    fn kind(&self) -> TransportKind;

    /// Open the inbound byte stream.
    fn open_input(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Open the outbound byte stream.
    fn open_output(&self) -> io::Result<Box<dyn Write + Send>>;

    /// Close the underlying socket.
    fn close(&self) -> io::Result<()>;

    /// Whether single response mode may be used on this transport.
    fn is_srm_capable(&self) -> bool {
        self.kind().supports_srm()
    }

    /// Largest OBEX packet this transport carries.
    fn max_packet_size(&self) -> usize {
        MAX_PACKET_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!(
            TransportKind::from_str("rfcomm").unwrap(),
            TransportKind::Rfcomm
        );
        assert_eq!(
            TransportKind::from_str("L2CAP").unwrap(),
            TransportKind::L2cap
        );
        assert!(TransportKind::from_str("usb").is_err());
    }

    #[test]
    fn test_transport_kind_default() {
        assert_eq!(TransportKind::default(), TransportKind::Rfcomm);
    }

    #[test]
    fn test_only_l2cap_supports_srm() {
        assert!(TransportKind::L2cap.supports_srm());
        assert!(!TransportKind::Rfcomm.supports_srm());
        assert_eq!(TransportKind::L2cap.to_string(), "L2CAP");
    }
}
