//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and header names before anything binds
//! - Validate value ranges (timeouts > 0, delays ordered)
//! - Check route definitions (unique names, paths, destinations, topics)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, HandlerConfig, RouteConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("retries.base_delay_ms ({base}) exceeds retries.max_delay_ms ({max})")]
    RetryDelays { base: u64, max: u64 },

    #[error("auth.authority_address: {0}")]
    InvalidAuthority(String),

    #[error("auth.credential_header: '{0}' is not a valid header name")]
    InvalidHeader(String),

    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("route '{0}' is defined more than once")]
    DuplicateRoute(String),

    #[error("route '{route}': path '{path}' must start with '/'")]
    InvalidPath { route: String, path: String },

    #[error("route '{route}': {reason}")]
    InvalidDestination { route: String, reason: String },

    #[error("route '{0}': producer topic is empty")]
    EmptyTopic(String),
}

/// Check the whole configuration, collecting every issue.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    check_socket_addr(&mut issues, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut issues,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    for (field, value) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("auth.rpc_timeout_ms", config.auth.rpc_timeout_ms),
        ("producer.queue_capacity", config.producer.queue_capacity as u64),
        ("security.max_body_size", config.security.max_body_size as u64),
    ] {
        if value == 0 {
            issues.push(ConfigIssue::Zero { field });
        }
    }

    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        issues.push(ConfigIssue::RetryDelays {
            base: config.retries.base_delay_ms,
            max: config.retries.max_delay_ms,
        });
    }

    if let Err(reason) = check_http_url(&config.auth.authority_address) {
        issues.push(ConfigIssue::InvalidAuthority(reason));
    }

    if HeaderName::from_bytes(config.auth.credential_header.as_bytes()).is_err() {
        issues.push(ConfigIssue::InvalidHeader(config.auth.credential_header.clone()));
    }

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            issues.push(ConfigIssue::EmptyRouteName { index });
        } else if !names.insert(route.name.as_str()) {
            issues.push(ConfigIssue::DuplicateRoute(route.name.clone()));
        }
        check_route(&mut issues, route);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_socket_addr(issues: &mut Vec<ConfigIssue>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_route(issues: &mut Vec<ConfigIssue>, route: &RouteConfig) {
    if !route.path.starts_with('/') {
        issues.push(ConfigIssue::InvalidPath {
            route: route.name.clone(),
            path: route.path.clone(),
        });
    }

    match &route.handler {
        HandlerConfig::Proxy => {
            let result = match route.destination.as_deref() {
                Some(destination) => check_http_url(destination),
                None => Err("proxy route needs a destination".to_string()),
            };
            if let Err(reason) = result {
                issues.push(ConfigIssue::InvalidDestination {
                    route: route.name.clone(),
                    reason,
                });
            }
        }
        HandlerConfig::Producer { topic } => {
            if topic.trim().is_empty() {
                issues.push(ConfigIssue::EmptyTopic(route.name.clone()));
            }
        }
    }
}

/// Plain-HTTP absolute URL with a host. TLS is terminated elsewhere.
fn check_http_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| format!("'{}' is not a URL: {}", value, e))?;
    if url.scheme() != "http" {
        return Err(format!("'{}' must use the http scheme", value));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("'{}' has no host", value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::MatchType;

    fn route(name: &str, path: &str, destination: Option<&str>, handler: HandlerConfig) -> RouteConfig {
        RouteConfig {
            name: name.to_string(),
            match_type: MatchType::Exact,
            path: path.to_string(),
            destination: destination.map(str::to_string),
            secure: false,
            handler,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_issue() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.retries.base_delay_ms = 900;
        config.auth.authority_address = "localhost:50051".into();
        config.auth.credential_header = "bad header".into();

        let issues = validate_config(&config).unwrap_err();
        assert_eq!(issues.len(), 5, "{:?}", issues);
        assert!(issues.contains(&ConfigIssue::Zero { field: "timeouts.request_secs" }));
        assert!(issues.contains(&ConfigIssue::RetryDelays { base: 900, max: 500 }));
        assert!(issues.contains(&ConfigIssue::InvalidHeader("bad header".into())));
    }

    #[test]
    fn test_route_issues() {
        let mut config = GatewayConfig::default();
        config.routes = vec![
            route("a", "/a", Some("http://backend-a"), HandlerConfig::Proxy),
            route("a", "/b", Some("http://backend-b"), HandlerConfig::Proxy),
            route("", "/c", Some("http://backend-c"), HandlerConfig::Proxy),
            route("no-slash", "d", Some("http://backend-d"), HandlerConfig::Proxy),
            route("no-dest", "/e", None, HandlerConfig::Proxy),
            route("tls", "/f", Some("https://backend-f"), HandlerConfig::Proxy),
            route("queue", "/g", None, HandlerConfig::Producer { topic: " ".into() }),
        ];

        let issues = validate_config(&config).unwrap_err();
        assert_eq!(
            issues,
            vec![
                ConfigIssue::DuplicateRoute("a".into()),
                ConfigIssue::EmptyRouteName { index: 2 },
                ConfigIssue::InvalidPath {
                    route: "no-slash".into(),
                    path: "d".into()
                },
                ConfigIssue::InvalidDestination {
                    route: "no-dest".into(),
                    reason: "proxy route needs a destination".into()
                },
                ConfigIssue::InvalidDestination {
                    route: "tls".into(),
                    reason: "'https://backend-f' must use the http scheme".into()
                },
                ConfigIssue::EmptyTopic("queue".into()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "garbage".into();
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
