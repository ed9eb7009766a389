//! Route handlers.
//!
//! # Data Flow
//! ```text
//! Dispatcher (route resolved, identity checked)
//!     → RouteHandler::handle(RequestContext, Request)
//!         → proxy.rs     (forward to an HTTP backend, stream the answer back)
//!         → producer.rs  (enqueue the body on a topic, acknowledge at once)
//! ```
//!
//! # Design Decisions
//! - One trait for every destination kind; the dispatcher never knows which
//! - Identity travels in a typed context argument, never a string-keyed bag
//! - Handlers own their error responses; they never fail the dispatcher

pub mod producer;
pub mod proxy;

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::auth::Identity;

pub use producer::QueueProducer;
pub use proxy::ReverseProxy;

/// Request-scoped values the dispatcher hands to a handler.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: String,
    /// Address of the connecting client, when known.
    pub peer: Option<SocketAddr>,
    /// Set only for secure routes, after a successful validation.
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, peer: Option<SocketAddr>) -> Self {
        Self {
            request_id: request_id.into(),
            peer,
            identity: None,
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// A route destination.
#[async_trait]
pub trait RouteHandler: Send + Sync + fmt::Debug {
    /// Process the request and produce the response sent to the client.
    async fn handle(&self, ctx: RequestContext, request: Request<Body>) -> Response;

    /// Short name of the handler kind, for diagnostics.
    fn kind(&self) -> &'static str;
}
