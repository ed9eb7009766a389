//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once at startup to build the route table and validator
//! ```
//!
//! # Design Decisions
//! - Config is read once; there is no runtime reload, routes never change
//!   while serving
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, ChannelMode, GatewayConfig, HandlerConfig, ListenerConfig, MatchType,
    ObservabilityConfig, ProducerConfig, RetryConfig, RouteConfig, SecurityConfig, TimeoutConfig,
};
pub use validation::{validate_config, ConfigIssue};
