//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Json;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tonic::Status;

use edge_gateway::auth::proto::{TokenResponse, User};
use edge_gateway::auth::AuthAuthority;
use edge_gateway::config::{GatewayConfig, HandlerConfig, MatchType, RetryConfig, RouteConfig};
use edge_gateway::lifecycle::build_dispatcher;
use edge_gateway::queue::{ChannelSink, QueuedMessage};
use edge_gateway::{HttpServer, Shutdown};

/// Start a backend on an ephemeral port that answers every request with a
/// JSON description of what it received.
pub async fn start_echo_backend() -> SocketAddr {
    let app = Router::new().fallback(|request: Request<Body>| async move {
        let headers: HashMap<String, String> = request
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        Json(json!({
            "method": request.method().as_str(),
            "path": request.uri().path(),
            "query": request.uri().query(),
            "headers": headers,
        }))
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Authority that accepts a fixed set of tokens, optionally after a number
/// of `Unavailable` answers.
#[derive(Debug, Default)]
pub struct TokenAuthority {
    users: HashMap<String, User>,
    outages: AtomicU32,
    calls: AtomicU32,
}

impl TokenAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, id: &str, email: &str) -> Self {
        self.users.insert(
            token.to_string(),
            User {
                id: id.to_string(),
                email: email.to_string(),
            },
        );
        self
    }

    /// Answer the next `n` calls with `Unavailable`.
    pub fn with_outages(self, n: u32) -> Self {
        self.outages.store(n, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthAuthority for TokenAuthority {
    async fn validate_token(&self, token: &str) -> Result<TokenResponse, Status> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outage = self
            .outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if outage {
            return Err(Status::unavailable("authority restarting"));
        }

        let user = self.users.get(token).cloned();
        Ok(TokenResponse {
            valid: user.is_some(),
            user,
        })
    }
}

pub fn proxy_route(name: &str, match_type: MatchType, path: &str, backend: SocketAddr) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        match_type,
        path: path.to_string(),
        destination: Some(format!("http://{}", backend)),
        secure: false,
        handler: HandlerConfig::Proxy,
    }
}

pub fn producer_route(name: &str, path: &str, topic: &str) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        match_type: MatchType::Exact,
        path: path.to_string(),
        destination: None,
        secure: true,
        handler: HandlerConfig::Producer {
            topic: topic.to_string(),
        },
    }
}

/// Gateway configuration with the given routes and no retry spacing.
pub fn gateway_config(routes: Vec<RouteConfig>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.routes = routes;
    config.retries = RetryConfig {
        base_delay_ms: 0,
        max_delay_ms: 0,
    };
    config.observability.metrics_enabled = false;
    config
}

/// A running gateway. Dropping it stops the server.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub messages: mpsc::Receiver<QueuedMessage>,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `config` on an ephemeral port against `authority`.
pub async fn start_gateway(config: GatewayConfig, authority: Arc<TokenAuthority>) -> TestGateway {
    let (sink, messages) = ChannelSink::bounded(config.producer.queue_capacity);
    let dispatcher = build_dispatcher(&config, authority, Arc::new(sink)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, dispatcher);
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    TestGateway {
        addr,
        messages,
        shutdown,
    }
}

pub fn json_body(value: &str) -> Value {
    serde_json::from_str(value).unwrap()
}
