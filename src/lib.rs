//! Edge gateway library.
//!
//! Classifies inbound requests as public or secure, validates bearer
//! credentials against a gRPC authentication authority and hands each
//! request to a reverse proxy or an asynchronous queue producer.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod queue;
pub mod resilience;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
