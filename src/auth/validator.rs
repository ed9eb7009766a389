//! Credential validation against the authentication authority.
//!
//! # Responsibilities
//! - Ask the authority whether a credential is valid
//! - Retry transient transport failures up to a fixed attempt cap
//! - Stop promptly once the request's deadline has passed
//!
//! # Design Decisions
//! - An explicit "invalid" answer is final and never retried
//! - Attempts are sequential within the calling task
//! - Nothing is cached; every call reaches the authority

use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;
use tonic::Code;

use crate::auth::authority::AuthAuthority;
use crate::auth::identity::Identity;
use crate::auth::proto::TokenResponse;
use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::{is_transient, jittered_delay};

/// Upper bound on `ValidateToken` attempts per validation.
pub const MAX_VALIDATION_ATTEMPTS: u32 = 5;

/// Why a credential could not be turned into an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("credential rejected by authority")]
    Invalid,

    #[error("authority still failing after {attempts} attempts ({last_code:?})")]
    TransportExhausted { attempts: u32, last_code: Code },

    #[error("authority call failed ({code:?}): {message}")]
    TransportFatal { code: Code, message: String },

    #[error("validation deadline passed after {attempts} attempts")]
    DeadlineExceeded { attempts: u32 },
}

impl ValidationError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::Invalid => "invalid",
            ValidationError::TransportExhausted { .. } => "exhausted",
            ValidationError::TransportFatal { .. } => "fatal",
            ValidationError::DeadlineExceeded { .. } => "deadline",
        }
    }
}

/// Per-request inputs to a validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub request_id: String,
    /// No attempt or backoff runs past this instant.
    pub deadline: Option<Instant>,
}

impl ValidationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Validates bearer credentials with bounded, jittered retries.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    authority: Arc<dyn AuthAuthority>,
    retry: RetryConfig,
    max_attempts: u32,
}

impl CredentialValidator {
    pub fn new(authority: Arc<dyn AuthAuthority>, retry: RetryConfig) -> Self {
        Self {
            authority,
            retry,
            max_attempts: MAX_VALIDATION_ATTEMPTS,
        }
    }

    /// Resolve `credential` to an identity.
    pub async fn validate(
        &self,
        ctx: &ValidationContext,
        credential: &str,
    ) -> Result<Identity, ValidationError> {
        let mut attempts = 0;
        let result = self.run(ctx, credential, &mut attempts).await;

        metrics::record_validation(
            result.as_ref().err().map_or("valid", ValidationError::kind),
            attempts,
        );
        result
    }

    async fn run(
        &self,
        ctx: &ValidationContext,
        credential: &str,
        attempts: &mut u32,
    ) -> Result<Identity, ValidationError> {
        loop {
            if ctx.expired() {
                return Err(ValidationError::DeadlineExceeded { attempts: *attempts });
            }
            *attempts += 1;

            let call = self.authority.validate_token(credential);
            let result = match ctx.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                    Ok(result) => result,
                    Err(_) => {
                        return Err(ValidationError::DeadlineExceeded { attempts: *attempts })
                    }
                },
                None => call.await,
            };

            let status = match result {
                Ok(response) => return identity_from(response),
                Err(status) => status,
            };

            if !is_transient(&status) {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    attempt = *attempts,
                    code = ?status.code(),
                    error = %status.message(),
                    "Authority call failed permanently"
                );
                return Err(ValidationError::TransportFatal {
                    code: status.code(),
                    message: status.message().to_string(),
                });
            }

            if *attempts >= self.max_attempts {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    attempts = *attempts,
                    code = ?status.code(),
                    "Authority retries exhausted"
                );
                return Err(ValidationError::TransportExhausted {
                    attempts: *attempts,
                    last_code: status.code(),
                });
            }

            let delay = jittered_delay(*attempts, self.retry.base_delay_ms, self.retry.max_delay_ms);
            if ctx.deadline.is_some_and(|d| Instant::now() + delay >= d) {
                return Err(ValidationError::DeadlineExceeded { attempts: *attempts });
            }

            tracing::debug!(
                request_id = %ctx.request_id,
                attempt = *attempts,
                delay = ?delay,
                code = ?status.code(),
                "Retrying credential validation"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn identity_from(response: TokenResponse) -> Result<Identity, ValidationError> {
    match response {
        TokenResponse {
            valid: true,
            user: Some(user),
        } => Ok(Identity::from(user)),
        _ => Err(ValidationError::Invalid),
    }
}
