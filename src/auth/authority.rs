//! Connection to the authentication authority.
//!
//! # Responsibilities
//! - Send one `ValidateToken` RPC per call
//! - Bound every call with the configured RPC timeout
//! - Release the channel on every exit path
//!
//! # Design Decisions
//! - Two channel policies behind one trait:
//!   - `PooledAuthority`: one lazily connected, multiplexed channel shared by
//!     all requests (tonic channels are cheap to clone and thread-safe)
//!   - `DialingAuthority`: a fresh connection per call, dropped when the call
//!     returns
//! - A client-side timeout surfaces as `DeadlineExceeded` so the retry policy
//!   treats it as transient
//! - Connection failures surface as `Unavailable` (authority restarting)

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use crate::auth::proto::{AuthServiceClient, TokenRequest, TokenResponse};

/// A remote service able to validate bearer credentials.
///
/// Implementations perform exactly one RPC per call and never retry.
#[async_trait]
pub trait AuthAuthority: Send + Sync + fmt::Debug {
    async fn validate_token(&self, token: &str) -> Result<TokenResponse, Status>;
}

/// Build the endpoint for an authority address such as `http://auth:50051`.
pub fn authority_endpoint(
    address: &str,
    connect_timeout: Duration,
) -> Result<Endpoint, tonic::transport::Error> {
    Ok(Endpoint::from_shared(address.to_string())?.connect_timeout(connect_timeout))
}

/// Authority reached through one long-lived channel.
#[derive(Debug, Clone)]
pub struct PooledAuthority {
    client: AuthServiceClient,
    rpc_timeout: Duration,
}

impl PooledAuthority {
    /// Create the shared channel. The connection is established on first use,
    /// so the gateway can start before the authority is reachable.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(endpoint: Endpoint, rpc_timeout: Duration) -> Self {
        Self::from_channel(endpoint.connect_lazy(), rpc_timeout)
    }

    pub fn from_channel(channel: Channel, rpc_timeout: Duration) -> Self {
        Self {
            client: AuthServiceClient::new(channel),
            rpc_timeout,
        }
    }
}

#[async_trait]
impl AuthAuthority for PooledAuthority {
    async fn validate_token(&self, token: &str) -> Result<TokenResponse, Status> {
        let mut client = self.client.clone();
        let call = async move {
            client
                .validate_token(token_request(token, self.rpc_timeout))
                .await
                .map(|response| response.into_inner())
        };
        bounded(self.rpc_timeout, call).await
    }
}

/// Authority reached through a new connection for every call.
#[derive(Debug, Clone)]
pub struct DialingAuthority {
    endpoint: Endpoint,
    rpc_timeout: Duration,
}

impl DialingAuthority {
    pub fn new(endpoint: Endpoint, rpc_timeout: Duration) -> Self {
        Self {
            endpoint,
            rpc_timeout,
        }
    }
}

#[async_trait]
impl AuthAuthority for DialingAuthority {
    async fn validate_token(&self, token: &str) -> Result<TokenResponse, Status> {
        let call = async {
            let channel = self.endpoint.connect().await.map_err(|e| {
                Status::unavailable(format!("failed to connect to authority: {}", e))
            })?;
            // Channel is dropped, and the connection closed, when this block ends.
            let mut client = AuthServiceClient::new(channel);
            client
                .validate_token(token_request(token, self.rpc_timeout))
                .await
                .map(|response| response.into_inner())
        };
        bounded(self.rpc_timeout, call).await
    }
}

fn token_request(token: &str, rpc_timeout: Duration) -> Request<TokenRequest> {
    let mut request = Request::new(TokenRequest {
        token: token.to_string(),
    });
    // Propagated to the authority as `grpc-timeout`
    request.set_timeout(rpc_timeout);
    request
}

async fn bounded<F>(limit: Duration, call: F) -> Result<TokenResponse, Status>
where
    F: std::future::Future<Output = Result<TokenResponse, Status>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(Status::deadline_exceeded(format!(
            "authority did not answer within {:?}",
            limit
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::is_transient;
    use tonic::Code;

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(authority_endpoint("not a uri", Duration::from_secs(1)).is_err());
        assert!(authority_endpoint("http://localhost:50051", Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn test_dialing_unreachable_authority_is_transient() {
        // Port 1 on loopback is reserved and refuses connections.
        let endpoint = authority_endpoint("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        let authority = DialingAuthority::new(endpoint, Duration::from_millis(500));

        let err = authority.validate_token("t").await.unwrap_err();
        assert!(
            matches!(err.code(), Code::Unavailable | Code::DeadlineExceeded),
            "unexpected code {:?}",
            err.code()
        );
        assert!(is_transient(&err));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_deadline_exceeded() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(TokenResponse::default())
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert_eq!(err.code(), Code::DeadlineExceeded);
    }
}
