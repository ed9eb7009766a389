//! Retry classification for authority RPC failures.
//!
//! # Responsibilities
//! - Decide whether a gRPC failure is worth another attempt
//!
//! # Design Decisions
//! - Transient: deadline exceeded, resource exhausted, unavailable
//! - Everything else is permanent, including malformed or unimplemented calls
//! - An explicit "invalid credential" answer is not a transport error and never
//!   reaches this module

use tonic::{Code, Status};

/// Returns true if a failure with this code is expected to succeed on retry.
pub fn is_transient_code(code: Code) -> bool {
    matches!(
        code,
        Code::DeadlineExceeded | Code::ResourceExhausted | Code::Unavailable
    )
}

/// Returns true if the RPC that produced `status` should be attempted again.
pub fn is_transient(status: &Status) -> bool {
    is_transient_code(status.code())
}
