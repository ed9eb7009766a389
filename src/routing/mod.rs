//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, headers)
//!     → dispatcher.rs (single entry point)
//!     → router.rs (first public match, else first secure match)
//!     → matcher.rs (evaluate exact / prefix predicate)
//!     → secure route: auth::validator, identity into RequestContext
//!     → RouteHandler, or 401 / 404
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → handlers built (proxy client, queue sink)
//!     → RouteTableBuilder in configuration order
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - Path-driven: method never affects routing
//! - Deterministic: same path always resolves to the same route
//! - First match wins (registration order)

pub mod dispatcher;
pub mod matcher;
pub mod router;

pub use dispatcher::Dispatcher;
pub use matcher::MatchKind;
pub use router::{Route, RouteDescriptor, RouteTable, RouteTableBuilder, ShadowedRoute};
