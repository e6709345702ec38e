//! Map curl errors and HTTP statuses onto [`NetworkFailure`] kinds.

use crate::error::NetworkFailure;

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> NetworkFailure {
    if e.is_operation_timedout() {
        return NetworkFailure::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return NetworkFailure::Resolve;
    }
    if e.is_couldnt_connect() || e.is_ssl_connect_error() {
        return NetworkFailure::Connect;
    }
    if e.is_partial_file()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return NetworkFailure::Transfer;
    }
    NetworkFailure::Other
}

/// `None` for success statuses, otherwise the failure to report.
///
/// `file://` transfers report status 0, which counts as success.
pub fn classify_http_status(code: u32) -> Option<NetworkFailure> {
    match code {
        0 | 200..=299 => None,
        _ => Some(NetworkFailure::Status(code)),
    }
}
