//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Credential validation RPC:
//!     → retries.rs (classify the failure: transient or permanent)
//!     → backoff.rs (delay before the next attempt)
//!     → auth::validator drives the loop, bounded by attempt cap and deadline
//! ```
//!
//! # Design Decisions
//! - Classification is a pure function; looping belongs to the caller
//! - Only the validation RPC is retried, never the proxied request
//! - Jittered backoff keeps retrying gateways from hammering the authority

pub mod backoff;
pub mod retries;

pub use backoff::jittered_delay;
pub use retries::{is_transient, is_transient_code};
