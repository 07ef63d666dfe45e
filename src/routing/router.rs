//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in configuration order
//! - Look up the most specific route for a request path
//! - Return matched route or explicit `RouteNotFound`
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest matching prefix wins. When one prefix is itself a prefix of another
//!   (`/api/` and `/api/v2/`), plain first-match would depend on file order, so
//!   specificity decides instead
//! - Equal-length matches fall back to configuration order (earlier wins)
//! - O(n) path prefix scan (acceptable for typical route counts)

use std::collections::HashSet;

use crate::config::RouteDefinition;
use crate::dispatch::DispatchError;
use crate::routing::matcher::PathPrefixMatcher;

/// Error building the route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("duplicate route id `{0}`")]
    DuplicateId(String),

    #[error("route `{0}` has an empty path prefix or one not starting with '/'")]
    InvalidPrefix(String),
}

/// A route matched for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    pub route: &'a RouteDefinition,
    /// The request path with the matched prefix removed, kept literally.
    pub remaining_path: &'a str,
}

#[derive(Debug)]
struct CompiledRoute {
    definition: RouteDefinition,
    matcher: PathPrefixMatcher,
}

/// Immutable table of path-prefix routes.
#[derive(Debug)]
pub struct RouteRegistry {
    routes: Vec<CompiledRoute>,
}

impl RouteRegistry {
    /// Compile the route table from configuration, preserving order.
    pub fn new(definitions: Vec<RouteDefinition>) -> Result<Self, RouteTableError> {
        let mut ids = HashSet::new();
        let mut routes = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if !ids.insert(definition.id.clone()) {
                return Err(RouteTableError::DuplicateId(definition.id));
            }
            if !definition.path_prefix.starts_with('/') {
                return Err(RouteTableError::InvalidPrefix(definition.id));
            }
            let matcher = PathPrefixMatcher::new(definition.path_prefix.clone());
            routes.push(CompiledRoute { definition, matcher });
        }

        tracing::debug!(routes = routes.len(), "Route table compiled");
        Ok(Self { routes })
    }

    /// Find the most specific route for `path`.
    pub fn resolve<'a>(&'a self, path: &'a str) -> Result<ResolvedRoute<'a>, DispatchError> {
        let mut best: Option<(&'a CompiledRoute, &'a str)> = None;

        for candidate in &self.routes {
            let Some(remaining) = candidate.matcher.strip(path) else {
                continue;
            };
            // Strictly greater keeps the earlier route on ties.
            let better = best.map_or(true, |(current, _)| {
                candidate.matcher.specificity() > current.matcher.specificity()
            });
            if better {
                best = Some((candidate, remaining));
            }
        }

        best.map(|(compiled, remaining_path)| ResolvedRoute {
            route: &compiled.definition,
            remaining_path,
        })
        .ok_or(DispatchError::RouteNotFound)
    }

    /// All routes in configuration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter().map(|r| &r.definition)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
