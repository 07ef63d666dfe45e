//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (route lookup)
//!     → matcher.rs (literal prefix test, remainder)
//!     → Return: ResolvedRoute { route, remaining_path } or RouteNotFound
//!
//! Route Compilation (at startup):
//!     RouteDefinition[] (configuration order)
//!     → Reject duplicate ids / malformed prefixes
//!     → Freeze as immutable RouteRegistry
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest prefix wins, configuration order breaks ties

pub mod matcher;
pub mod router;

pub use router::{ResolvedRoute, RouteRegistry, RouteTableError};
