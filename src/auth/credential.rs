//! Bearer credential extraction.

use axum::http::{HeaderMap, HeaderName};

const BEARER_SCHEME: &str = "bearer ";

/// Pull the opaque credential out of `header`.
///
/// An optional `Bearer ` scheme is stripped. Returns `None` when the header is
/// absent, not visible ASCII, or empty after trimming.
pub fn extract_credential<'a>(headers: &'a HeaderMap, header: &HeaderName) -> Option<&'a str> {
    let raw = headers.get(header)?.to_str().ok()?.trim();

    // A bare scheme with nothing after it
    if raw.eq_ignore_ascii_case(BEARER_SCHEME.trim_end()) {
        return None;
    }

    let token = match raw.get(..BEARER_SCHEME.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => {
            raw[BEARER_SCHEME.len()..].trim_start()
        }
        _ => raw,
    };

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
