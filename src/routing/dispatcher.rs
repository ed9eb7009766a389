//! Request dispatch.
//!
//! Every inbound request enters here. The dispatcher resolves the route,
//! enforces authentication for secure routes and hands the request to the
//! route's handler. Authentication failures of any kind fail closed with 401.
//!
//! Routes match the percent-decoded path. Dot-segments are not resolved, and
//! a path that does not decode to UTF-8 matches nothing.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::auth::{extract_credential, CredentialValidator, Identity, ValidationContext};
use crate::handlers::RequestContext;
use crate::http::RequestIdExt;
use crate::observability::metrics;
use crate::routing::router::{Route, RouteTable};

/// Routes requests and enforces authentication on secure routes.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    validator: CredentialValidator,
    credential_header: HeaderName,
    validation_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(table: Arc<RouteTable>, validator: CredentialValidator) -> Self {
        Self {
            table,
            validator,
            credential_header: AUTHORIZATION,
            validation_timeout: None,
        }
    }

    /// Header carrying the bearer credential (default `Authorization`).
    pub fn with_credential_header(mut self, header: HeaderName) -> Self {
        self.credential_header = header;
        self
    }

    /// Budget for validating a credential, measured from dispatch start.
    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = Some(timeout);
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Handle one inbound request.
    pub async fn dispatch(&self, request: Request<Body>, peer: Option<SocketAddr>) -> Response {
        let started = Instant::now();
        let ctx = RequestContext::new(request.request_id(), peer);

        let resolved = decode_path(request.uri().path()).and_then(|path| self.table.resolve(&path));
        let Some(route) = resolved else {
            tracing::debug!(
                request_id = %ctx.request_id,
                path = %request.uri().path(),
                "No route matched"
            );
            metrics::record_request("none", StatusCode::NOT_FOUND.as_u16(), started);
            return (StatusCode::NOT_FOUND, "Not Found").into_response();
        };

        let response = if route.secure {
            match self.authenticate(route, &ctx, request.headers(), started).await {
                Some(identity) => route.handler.handle(ctx.with_identity(identity), request).await,
                None => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            }
        } else {
            route.handler.handle(ctx, request).await
        };

        metrics::record_request(&route.name, response.status().as_u16(), started);
        response
    }

    async fn authenticate(
        &self,
        route: &Route,
        ctx: &RequestContext,
        headers: &HeaderMap,
        started: Instant,
    ) -> Option<Identity> {
        let Some(credential) = extract_credential(headers, &self.credential_header) else {
            tracing::info!(
                request_id = %ctx.request_id,
                route = %route.name,
                "Missing credential on secure route"
            );
            return None;
        };

        let mut validation = ValidationContext::new(ctx.request_id.clone());
        if let Some(timeout) = self.validation_timeout {
            validation = validation.with_deadline((started + timeout).into());
        }

        match self.validator.validate(&validation, credential).await {
            Ok(identity) => {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    route = %route.name,
                    user_id = %identity.id,
                    "Credential accepted"
                );
                Some(identity)
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    route = %route.name,
                    reason = e.kind(),
                    error = %e,
                    "Authentication failed"
                );
                None
            }
        }
    }
}

/// Percent-decode a request path. `None` if the result is not UTF-8.
fn decode_path(raw: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(raw).decode_utf8().ok()
}
