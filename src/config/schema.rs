//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::MatchKind;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Authentication authority settings.
    pub auth: AuthConfig,

    /// Backoff between credential validation attempts.
    pub retries: RetryConfig,

    /// Message queue settings for producer routes.
    pub producer: ProducerConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route definitions, in lookup order within each security class.
    pub routes: Vec<RouteConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            auth: AuthConfig::default(),
            retries: RetryConfig::default(),
            producer: ProducerConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
            routes: default_routes(),
        }
    }
}

/// The user and notification services of a standard deployment.
fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "user".to_string(),
            match_type: MatchType::Exact,
            path: "/user".to_string(),
            destination: Some("http://localhost:8081".to_string()),
            secure: false,
            handler: HandlerConfig::Proxy,
        },
        RouteConfig {
            name: "auth".to_string(),
            match_type: MatchType::Prefix,
            path: "/auth".to_string(),
            destination: Some("http://localhost:8081".to_string()),
            secure: false,
            handler: HandlerConfig::Proxy,
        },
        RouteConfig {
            name: "notification".to_string(),
            match_type: MatchType::Exact,
            path: "/notification".to_string(),
            destination: Some("http://localhost:8082".to_string()),
            secure: true,
            handler: HandlerConfig::Producer {
                topic: "notifications".to_string(),
            },
        },
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    /// Credential validation never runs past it.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// How the gateway holds its connection to the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// One shared, lazily connected channel.
    #[default]
    Pooled,
    /// A new connection per validation attempt.
    PerCall,
}

/// Authentication authority configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// gRPC address of the authority (e.g., "http://auth:50051").
    pub authority_address: String,

    /// Channel policy.
    pub channel: ChannelMode,

    /// Timeout for a single ValidateToken attempt in milliseconds.
    pub rpc_timeout_ms: u64,

    /// Request header carrying the bearer credential.
    pub credential_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authority_address: "http://localhost:50051".to_string(),
            channel: ChannelMode::Pooled,
            rpc_timeout_ms: 2000,
            credential_header: "authorization".to_string(),
        }
    }
}

/// Retry backoff configuration.
///
/// The attempt cap is fixed; only the spacing between attempts is tunable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 20,
            max_delay_ms: 500,
        }
    }
}

/// Producer queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Messages buffered before producers are turned away.
    pub queue_capacity: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Path comparison used by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Prefix,
}

/// What a matched route does with the request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerConfig {
    /// Forward to `destination`.
    #[default]
    Proxy,
    /// Enqueue the body on `topic`.
    Producer { topic: String },
}

/// Route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    #[serde(rename = "match")]
    pub match_type: MatchType,

    /// Exact path or prefix to match.
    pub path: String,

    /// Backend URL. Required for proxy routes.
    #[serde(default)]
    pub destination: Option<String>,

    /// Require a valid credential.
    #[serde(default)]
    pub secure: bool,

    #[serde(default)]
    pub handler: HandlerConfig,
}

impl RouteConfig {
    pub fn matcher(&self) -> MatchKind {
        match self.match_type {
            MatchType::Exact => MatchKind::Exact(self.path.clone()),
            MatchType::Prefix => MatchKind::Prefix(self.path.clone()),
        }
    }
}
