//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the authority connection, message queue and route handlers
//! - Freeze the route table and wire it into the dispatcher
//! - Report shadowed routes before traffic arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Expects a configuration that already passed `validate_config`

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::auth::authority::authority_endpoint;
use crate::auth::{AuthAuthority, CredentialValidator, DialingAuthority, PooledAuthority};
use crate::config::{ChannelMode, GatewayConfig, HandlerConfig};
use crate::handlers::proxy::{build_client, DestinationError, ProxyClient};
use crate::handlers::{QueueProducer, ReverseProxy, RouteHandler};
use crate::queue::{ChannelSink, MessageSink, QueuedMessage};
use crate::routing::{Dispatcher, RouteTable};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid authority address '{address}': {source}")]
    Authority {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("route '{route}': {source}")]
    Destination {
        route: String,
        #[source]
        source: DestinationError,
    },

    #[error("route '{0}': proxy route has no destination")]
    MissingDestination(String),

    #[error("invalid credential header '{0}'")]
    CredentialHeader(String),
}

/// Everything the server and the delivery task need.
#[derive(Debug)]
pub struct Gateway {
    pub dispatcher: Dispatcher,
    /// Receiving end of the producer queue.
    pub deliveries: mpsc::Receiver<QueuedMessage>,
}

/// Open the configured channel to the authentication authority.
pub fn connect_authority(config: &GatewayConfig) -> Result<Arc<dyn AuthAuthority>, StartupError> {
    let address = &config.auth.authority_address;
    let endpoint = authority_endpoint(address, Duration::from_secs(config.timeouts.connect_secs))
        .map_err(|source| StartupError::Authority {
            address: address.clone(),
            source,
        })?;
    let rpc_timeout = Duration::from_millis(config.auth.rpc_timeout_ms);

    tracing::info!(
        address = %address,
        channel = ?config.auth.channel,
        rpc_timeout_ms = config.auth.rpc_timeout_ms,
        "Authority configured"
    );

    Ok(match config.auth.channel {
        ChannelMode::Pooled => Arc::new(PooledAuthority::new(endpoint, rpc_timeout)),
        ChannelMode::PerCall => Arc::new(DialingAuthority::new(endpoint, rpc_timeout)),
    })
}

/// Build handlers and register routes in configuration order.
pub fn build_route_table(
    config: &GatewayConfig,
    client: ProxyClient,
    sink: Arc<dyn MessageSink>,
) -> Result<RouteTable, StartupError> {
    let mut builder = RouteTable::builder();

    for route in &config.routes {
        let (destination, handler): (String, Arc<dyn RouteHandler>) = match &route.handler {
            HandlerConfig::Proxy => {
                let destination = route
                    .destination
                    .clone()
                    .ok_or_else(|| StartupError::MissingDestination(route.name.clone()))?;
                let proxy = ReverseProxy::new(&destination, client.clone()).map_err(|source| {
                    StartupError::Destination {
                        route: route.name.clone(),
                        source,
                    }
                })?;
                (destination, Arc::new(proxy))
            }
            HandlerConfig::Producer { topic } => {
                let producer = QueueProducer::new(topic.clone(), sink.clone(), config.security.max_body_size);
                (topic.clone(), Arc::new(producer))
            }
        };

        builder = builder.add_route(route.name.clone(), route.matcher(), destination, route.secure, handler);
    }

    let table = builder.build();

    for shadowed in table.shadowed() {
        tracing::warn!(
            route = %shadowed.route,
            shadowed_by = %shadowed.shadowed_by,
            "Route can never be selected"
        );
    }
    for route in table.descriptors() {
        tracing::info!(
            route = %route.name,
            matcher = %route.matcher,
            destination = %route.destination,
            secure = route.secure,
            handler = route.handler,
            "Route registered"
        );
    }

    Ok(table)
}

/// Assemble the dispatcher around an authority and a message sink.
pub fn build_dispatcher(
    config: &GatewayConfig,
    authority: Arc<dyn AuthAuthority>,
    sink: Arc<dyn MessageSink>,
) -> Result<Dispatcher, StartupError> {
    let header = HeaderName::from_bytes(config.auth.credential_header.as_bytes())
        .map_err(|_| StartupError::CredentialHeader(config.auth.credential_header.clone()))?;

    let client = build_client(Duration::from_secs(config.timeouts.connect_secs));
    let table = build_route_table(config, client, sink)?;
    let validator = CredentialValidator::new(authority, config.retries.clone());

    Ok(Dispatcher::new(Arc::new(table), validator)
        .with_credential_header(header)
        .with_validation_timeout(Duration::from_secs(config.timeouts.request_secs)))
}

/// Build the whole gateway from configuration.
///
/// Must be called inside a tokio runtime.
pub fn assemble(config: &GatewayConfig) -> Result<Gateway, StartupError> {
    let authority = connect_authority(config)?;
    let (sink, deliveries) = ChannelSink::bounded(config.producer.queue_capacity);
    let dispatcher = build_dispatcher(config, authority, Arc::new(sink))?;

    Ok(Gateway {
        dispatcher,
        deliveries,
    })
}
