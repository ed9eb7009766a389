//! Wire types and client for the authority's `AuthService`.
//!
//! ```text
//! service AuthService {
//!   rpc ValidateToken(TokenRequest) returns (TokenResponse);
//! }
//! ```

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};

/// Fully qualified method path of `ValidateToken`.
pub const VALIDATE_TOKEN_PATH: &str = "/auth.AuthService/ValidateToken";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenRequest {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub email: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenResponse {
    #[prost(bool, tag = "1")]
    pub valid: bool,
    #[prost(message, optional, tag = "2")]
    pub user: ::core::option::Option<User>,
}

/// Unary client for `AuthService` over a tonic channel.
#[derive(Debug, Clone)]
pub struct AuthServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl AuthServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn validate_token(
        &mut self,
        request: Request<TokenRequest>,
    ) -> Result<Response<TokenResponse>, Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unavailable(format!("authority not ready: {}", e)))?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static(VALIDATE_TOKEN_PATH);
        self.inner.unary(request, path, codec).await
    }
}
