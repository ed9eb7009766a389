//! Route table.
//!
//! # Responsibilities
//! - Store routes in registration order, split into public and secure
//! - Look up the first route matching a path (public before secure)
//! - Describe the table for startup diagnostics
//! - Report routes that can never be selected
//!
//! # Design Decisions
//! - Built once through `RouteTableBuilder`, then immutable; shared via `Arc`
//!   and read concurrently without locks
//! - O(n) scan per class (acceptable for typical route counts)
//! - Explicit `None` on a miss rather than a silent default route

use std::sync::Arc;

use serde::Serialize;

use crate::handlers::RouteHandler;
use crate::routing::matcher::MatchKind;

/// One registered route.
#[derive(Debug, Clone)]
pub struct Route {
    /// Identifier for logs and metrics.
    pub name: String,
    pub matcher: MatchKind,
    /// Backend address or topic the handler delivers to.
    pub destination: String,
    /// Requires a valid credential before the handler runs.
    pub secure: bool,
    pub handler: Arc<dyn RouteHandler>,
}

/// Serializable view of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    pub name: String,
    pub matcher: MatchKind,
    pub destination: String,
    pub secure: bool,
    pub handler: &'static str,
}

/// A route that can never be selected because an earlier one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedRoute {
    pub route: String,
    pub shadowed_by: String,
}

/// Collects routes before the table is frozen.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    public: Vec<Route>,
    secure: Vec<Route>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route to the public or secure sequence.
    ///
    /// Order matters: within a class the first matching route wins, so more
    /// specific routes must be added before more general ones.
    pub fn add_route(
        mut self,
        name: impl Into<String>,
        matcher: MatchKind,
        destination: impl Into<String>,
        secure: bool,
        handler: Arc<dyn RouteHandler>,
    ) -> Self {
        let route = Route {
            name: name.into(),
            matcher,
            destination: destination.into(),
            secure,
            handler,
        };
        if secure {
            self.secure.push(route);
        } else {
            self.public.push(route);
        }
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            public: self.public,
            secure: self.secure,
        }
    }
}

/// Immutable, ordered route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    public: Vec<Route>,
    secure: Vec<Route>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// First public route matching `path`, otherwise the first secure one.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.public
            .iter()
            .chain(self.secure.iter())
            .find(|route| route.matcher.matches(path))
    }

    /// All routes in lookup order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.public.iter().chain(self.secure.iter())
    }

    pub fn len(&self) -> usize {
        self.public.len() + self.secure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn descriptors(&self) -> Vec<RouteDescriptor> {
        self.routes()
            .map(|route| RouteDescriptor {
                name: route.name.clone(),
                matcher: route.matcher.clone(),
                destination: route.destination.clone(),
                secure: route.secure,
                handler: route.handler.kind(),
            })
            .collect()
    }

    /// Routes fully covered by a route looked up before them.
    ///
    /// A secure route covered by a public one is reported too: its traffic
    /// would be served without authentication.
    pub fn shadowed(&self) -> Vec<ShadowedRoute> {
        let ordered: Vec<&Route> = self.routes().collect();
        let mut shadowed = Vec::new();

        for (i, later) in ordered.iter().enumerate() {
            if let Some(earlier) = ordered[..i]
                .iter()
                .find(|earlier| earlier.matcher.covers(&later.matcher))
            {
                shadowed.push(ShadowedRoute {
                    route: later.name.clone(),
                    shadowed_by: earlier.name.clone(),
                });
            }
        }
        shadowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::RequestContext;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::{IntoResponse, Response};

    #[derive(Debug)]
    struct Named(&'static str);

    #[async_trait]
    impl RouteHandler for Named {
        async fn handle(&self, _ctx: RequestContext, _request: Request<Body>) -> Response {
            self.0.into_response()
        }

        fn kind(&self) -> &'static str {
            "test"
        }
    }

    fn handler(name: &'static str) -> Arc<dyn RouteHandler> {
        Arc::new(Named(name))
    }

    fn table() -> RouteTable {
        RouteTable::builder()
            .add_route("user", MatchKind::Exact("/user".into()), "http://backend-a", false, handler("user"))
            .add_route("notify-exact", MatchKind::Exact("/notification".into()), "notifications", true, handler("n1"))
            .add_route("notify-prefix", MatchKind::Prefix("/notification".into()), "notifications", true, handler("n2"))
            .add_route("auth", MatchKind::Prefix("/auth".into()), "http://backend-a", false, handler("auth"))
            .build()
    }

    #[test]
    fn test_resolve_public_and_secure() {
        let t = table();
        assert_eq!(t.len(), 4);

        let r = t.resolve("/user").unwrap();
        assert_eq!(r.name, "user");
        assert!(!r.secure);

        let r = t.resolve("/auth/login").unwrap();
        assert_eq!(r.name, "auth");

        let r = t.resolve("/notification/42").unwrap();
        assert_eq!(r.name, "notify-prefix");
        assert!(r.secure);

        assert!(t.resolve("/unknown").is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let t = table();
        // Both secure routes match; the exact one was registered first.
        assert_eq!(t.resolve("/notification").unwrap().name, "notify-exact");
    }

    #[test]
    fn test_public_checked_before_secure() {
        let t = RouteTable::builder()
            .add_route("secure", MatchKind::Prefix("/".into()), "x", true, handler("s"))
            .add_route("public", MatchKind::Exact("/health".into()), "x", false, handler("p"))
            .build();
        assert_eq!(t.resolve("/health").unwrap().name, "public");
        assert_eq!(t.resolve("/other").unwrap().name, "secure");
    }

    #[test]
    fn test_descriptors_in_lookup_order() {
        let names: Vec<_> = table().descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["user", "auth", "notify-exact", "notify-prefix"]);

        let json = serde_json::to_value(&table().descriptors()[0]).unwrap();
        assert_eq!(json["matcher"]["match"], "exact");
        assert_eq!(json["handler"], "test");
    }

    #[test]
    fn test_shadowed_routes() {
        assert!(table().shadowed().is_empty());

        let t = RouteTable::builder()
            .add_route("api", MatchKind::Prefix("/api".into()), "x", false, handler("a"))
            .add_route("api-v1", MatchKind::Prefix("/api/v1".into()), "x", false, handler("b"))
            .add_route("api-admin", MatchKind::Prefix("/api/admin".into()), "x", true, handler("c"))
            .build();
        let shadowed = t.shadowed();
        assert_eq!(
            shadowed,
            vec![
                ShadowedRoute { route: "api-v1".into(), shadowed_by: "api".into() },
                ShadowedRoute { route: "api-admin".into(), shadowed_by: "api".into() },
            ]
        );
    }
}
