//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Secure route matched
//!     → credential.rs (pull the bearer token out of the configured header)
//!     → validator.rs (bounded retry loop, deadline aware)
//!     → authority.rs (pooled or per-call gRPC channel)
//!     → proto.rs (ValidateToken unary call)
//!     → Identity attached to the request context
//! ```
//!
//! # Design Decisions
//! - Fail closed: every failure ends in 401
//! - No caching of validated credentials
//! - Identity lives for one request only

pub mod authority;
pub mod credential;
pub mod identity;
pub mod proto;
pub mod validator;

pub use authority::{AuthAuthority, DialingAuthority, PooledAuthority};
pub use credential::extract_credential;
pub use identity::Identity;
pub use validator::{CredentialValidator, ValidationContext, ValidationError, MAX_VALIDATION_ATTEMPTS};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tonic::Status;

    use super::authority::AuthAuthority;
    use super::proto::{TokenResponse, User};

    /// Authority that plays back scripted answers and counts calls.
    ///
    /// When the script runs out, the fallback answer is repeated.
    #[derive(Debug)]
    pub struct ScriptedAuthority {
        script: Mutex<VecDeque<Result<TokenResponse, Status>>>,
        fallback: Result<TokenResponse, Status>,
        calls: AtomicU32,
    }

    impl ScriptedAuthority {
        pub fn always(answer: Result<TokenResponse, Status>) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                fallback: answer,
                calls: AtomicU32::new(0),
            }
        }

        pub fn scripted(
            script: Vec<Result<TokenResponse, Status>>,
            fallback: Result<TokenResponse, Status>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicU32::new(0),
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthAuthority for ScriptedAuthority {
        async fn validate_token(&self, _token: &str) -> Result<TokenResponse, Status> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.fallback.clone())
        }
    }

    /// Authority that never answers. Counts calls, and calls abandoned
    /// mid-flight by a dropped caller.
    #[derive(Debug, Default)]
    pub struct StalledAuthority {
        calls: AtomicU32,
        abandoned: AtomicU32,
    }

    impl StalledAuthority {
        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn abandoned(&self) -> u32 {
            self.abandoned.load(Ordering::SeqCst)
        }
    }

    struct Abandon<'a>(&'a AtomicU32);

    impl Drop for Abandon<'_> {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AuthAuthority for StalledAuthority {
        async fn validate_token(&self, _token: &str) -> Result<TokenResponse, Status> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _abandon = Abandon(&self.abandoned);
            std::future::pending().await
        }
    }

    pub fn valid(id: &str, email: &str) -> Result<TokenResponse, Status> {
        Ok(TokenResponse {
            valid: true,
            user: Some(User {
                id: id.to_string(),
                email: email.to_string(),
            }),
        })
    }

    pub fn invalid() -> Result<TokenResponse, Status> {
        Ok(TokenResponse {
            valid: false,
            user: None,
        })
    }
}
