//! Single response mode negotiation.
//!
//! Evaluated for every request right before it runs. The only state
//! carried across requests is the local capability recorded on the
//! session at connect time.

use crate::obex::{SrmControl, SrmFlag};
use crate::request::Request;

/// Enable SRM for `request` if the session and the request kind allow it.
///
/// Returns whether SRM was enabled. When it is not, neither the session
/// nor the request headers are touched.
pub fn negotiate(srm: &mut dyn SrmControl, request: &mut Request) -> bool {
    if !srm.local_capability() {
        tracing::debug!(kind = %request.kind(), "Client is not srm capable");
        return false;
    }

    if !request.kind().is_srm_eligible() {
        tracing::debug!(kind = %request.kind(), "Request kind does not use srm");
        return false;
    }

    tracing::debug!(kind = %request.kind(), "Client is srm capable, enabling srm");
    srm.set_local_enabled(true);
    request.headers_mut().single_response_mode = Some(SrmFlag::Enabled);
    srm.set_local_wait(false);
    true
}
