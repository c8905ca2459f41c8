//! Header state carried by OBEX operations.
//!
//! Only the headers the session layer reads or writes are typed here.
//! Framing them onto the wire is the codec's job.

use bytes::Bytes;

/// OBEX response status as reported by the codec.
///
/// The numeric table belongs to the codec; the session layer only needs
/// to tell success from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseCode(u8);

impl ResponseCode {
    /// Success (`OK`, final bit set).
    pub const OK: ResponseCode = ResponseCode(0xA0);

    /// Wrap a raw response byte.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw response byte.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Check if this is the success status
    pub fn is_success(self) -> bool {
        self == Self::OK
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Value of the single-response-mode header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrmFlag {
    /// SRM enabled for this operation
    Enabled,
}

/// Headers exchanged with the OBEX session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    /// Target service identifier (connect only)
    pub target: Option<Bytes>,
    /// Object name
    pub name: Option<String>,
    /// Object MIME type
    pub mime_type: Option<String>,
    /// Encoded application parameters
    pub app_parameters: Option<Bytes>,
    /// Single response mode
    pub single_response_mode: Option<SrmFlag>,
    /// Status of the response these headers arrived with
    pub response_code: Option<ResponseCode>,
}

impl HeaderSet {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target header
    pub fn with_target(mut self, target: impl Into<Bytes>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the name header
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the type header
    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    /// Set the application parameters header
    pub fn with_app_parameters(mut self, params: impl Into<Bytes>) -> Self {
        self.app_parameters = Some(params.into());
        self
    }

    /// Set the response code (used by codecs building replies)
    pub fn with_response_code(mut self, code: ResponseCode) -> Self {
        self.response_code = Some(code);
        self
    }

    /// Whether the headers carry a success status
    pub fn is_success(&self) -> bool {
        self.response_code.is_some_and(ResponseCode::is_success)
    }
}

/// Outcome of a completed OBEX operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObexResponse {
    /// Final response status
    pub code: ResponseCode,
    /// Response headers
    pub headers: HeaderSet,
    /// Reassembled response body
    pub body: Bytes,
}

impl ObexResponse {
    /// Create a response with empty headers and body
    pub fn new(code: ResponseCode) -> Self {
        Self {
            code,
            headers: HeaderSet::new(),
            body: Bytes::new(),
        }
    }

    /// Attach a body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Check if the operation succeeded
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_code() {
        assert!(ResponseCode::OK.is_success());
        assert!(!ResponseCode::from_raw(0xC4).is_success());
        assert_eq!(ResponseCode::from_raw(0xC4).to_string(), "0xC4");
    }

    #[test]
    fn test_header_set_success() {
        assert!(!HeaderSet::new().is_success());
        assert!(HeaderSet::new()
            .with_response_code(ResponseCode::OK)
            .is_success());
        assert!(!HeaderSet::new()
            .with_response_code(ResponseCode::from_raw(0xD3))
            .is_success());
    }

    #[test]
    fn test_header_set_builders() {
        let headers = HeaderSet::new()
            .with_name("telecom/msg/inbox")
            .with_mime_type("x-bt/MAP-msg-listing")
            .with_app_parameters(vec![0x01, 0x02]);

        assert_eq!(headers.name.as_deref(), Some("telecom/msg/inbox"));
        assert_eq!(headers.mime_type.as_deref(), Some("x-bt/MAP-msg-listing"));
        assert_eq!(headers.app_parameters.as_deref(), Some(&[0x01, 0x02][..]));
        assert!(headers.single_response_mode.is_none());
    }
}
