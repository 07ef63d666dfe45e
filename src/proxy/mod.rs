//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedRoute + inbound parts (+ AuthContext)
//!     → url.rs (join base URL, target prefix, remaining path, query)
//!     → headers.rs (hop-by-hop strip, identity injection, X-Forwarded-For)
//!     → forwarder.rs (hyper client exchange under timeout)
//!     → downstream Response, or Unavailable / Timeout
//! ```

pub mod forwarder;
pub mod headers;
pub mod url;

pub use forwarder::{Forward, ForwardRequest, ForwarderSettings, ForwardingFailure, ReverseProxyForwarder};
pub use headers::IdentityHeaders;
