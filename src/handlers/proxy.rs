//! Reverse proxy to a single HTTP backend.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the fixed destination
//! - Forward method, headers and body unchanged, streaming both ways
//! - Strip hop-by-hop headers and append `X-Forwarded-For`
//!
//! # Design Decisions
//! - No buffering: bodies are streamed through hyper
//! - No retries: the proxied leg is attempted exactly once
//! - Upstream failures map to 502 Bad Gateway
//! - The inbound `Host` header is preserved

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONNECTION;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::handlers::{RequestContext, RouteHandler};
use crate::http::X_REQUEST_ID;

/// Shared upstream HTTP client.
pub type ProxyClient = Client<HttpConnector, Body>;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Build the pooled client used by every proxy route.
pub fn build_client(connect_timeout: Duration) -> ProxyClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    Client::builder(TokioExecutor::new()).build(connector)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("destination is not a valid URI: {0}")]
    Unparsable(String),
    #[error("destination must use the http scheme")]
    UnsupportedScheme,
    #[error("destination has no host")]
    MissingHost,
}

/// Forwards requests verbatim to one backend.
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    client: ProxyClient,
}

impl ReverseProxy {
    /// Create a proxy for `destination`, e.g. `http://user-service:8081`.
    pub fn new(destination: &str, client: ProxyClient) -> Result<Self, DestinationError> {
        let uri: Uri = destination
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| DestinationError::Unparsable(e.to_string()))?;

        let scheme = match uri.scheme() {
            Some(s) if *s == Scheme::HTTP => s.clone(),
            _ => return Err(DestinationError::UnsupportedScheme),
        };
        let authority = uri.authority().cloned().ok_or(DestinationError::MissingHost)?;
        let base_path = uri.path().trim_end_matches('/').to_string();

        Ok(Self {
            scheme,
            authority,
            base_path,
            client,
        })
    }

    /// URI on the backend for an inbound request URI.
    fn target_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_path(&self.base_path, inbound.path());
        let path_and_query = match inbound.query() {
            Some(q) => format!("{}?{}", path, q),
            None => path,
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::try_from(path_and_query)?)
            .build()
    }
}

#[async_trait]
impl RouteHandler for ReverseProxy {
    async fn handle(&self, ctx: RequestContext, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        let uri = match self.target_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %ctx.request_id, error = %e, "Failed to build upstream URI");
                return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
            }
        };

        strip_hop_by_hop(&mut parts.headers);
        if let Some(peer) = ctx.peer {
            append_forwarded_for(&mut parts.headers, peer.ip());
        }
        if !ctx.request_id.is_empty() && !parts.headers.contains_key(X_REQUEST_ID) {
            if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
                parts.headers.insert(X_REQUEST_ID, value);
            }
        }

        tracing::debug!(
            request_id = %ctx.request_id,
            method = %parts.method,
            upstream = %uri,
            "Forwarding request"
        );

        parts.uri = uri;
        parts.version = Version::HTTP_11;
        let outbound = Request::from_parts(parts, body);

        match self.client.request(outbound).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    upstream = %self.authority,
                    error = %e,
                    "Upstream request failed"
                );
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
        }
    }

    fn kind(&self) -> &'static str {
        "proxy"
    }
}

/// Append `path` to the destination's base path with exactly one slash between.
fn join_path(base: &str, path: &str) -> String {
    if base.is_empty() {
        return if path.is_empty() { "/".to_string() } else { path.to_string() };
    }
    match path.strip_prefix('/') {
        Some(rest) => format!("{}/{}", base, rest),
        None if path.is_empty() => base.to_string(),
        None => format!("{}/{}", base, path),
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) if !prior.trim().is_empty() => format!("{}, {}", prior, ip),
        _ => ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(destination: &str) -> Result<ReverseProxy, DestinationError> {
        ReverseProxy::new(destination, build_client(Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn test_destination_validation() {
        assert!(proxy("http://backend-a:8081").is_ok());
        assert_eq!(proxy("https://backend-a").unwrap_err(), DestinationError::UnsupportedScheme);
        assert_eq!(proxy("/relative").unwrap_err(), DestinationError::UnsupportedScheme);
        assert!(matches!(proxy("http://bad host").unwrap_err(), DestinationError::Unparsable(_)));
    }

    #[tokio::test]
    async fn test_target_uri_keeps_path_and_query() {
        let p = proxy("http://backend-a:8081").unwrap();
        let uri = p.target_uri(&"/user?id=7".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://backend-a:8081/user?id=7");
    }

    #[tokio::test]
    async fn test_target_uri_joins_base_path() {
        let p = proxy("http://backend-a/api/").unwrap();
        let uri = p.target_uri(&"/auth/login".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://backend-a/api/auth/login");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/user"), "/user");
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("/api", "/user"), "/api/user");
        assert_eq!(join_path("/api", "user"), "/api/user");
        assert_eq!(join_path("/api", ""), "/api");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive, x-private"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-private", HeaderValue::from_static("secret"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("authorization", HeaderValue::from_static("token"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 2);
        assert!(headers.contains_key("authorization"));
        assert!(headers.contains_key("content-type"));
    }

    #[test]
    fn test_forwarded_for_appends() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "10.0.0.1".parse().unwrap());
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "10.0.0.1");

        append_forwarded_for(&mut headers, "10.0.0.2".parse().unwrap());
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "10.0.0.1, 10.0.0.2");
    }
}
