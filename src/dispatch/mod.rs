//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! Parts + streaming body
//!     → RouteRegistry::resolve        (RouteNotFound → 404)
//!     → AuthenticationGate (if route requires_auth)  (AuthFailure → 401)
//!     → read_body under the limit     (PayloadTooLarge → 413)
//!     → Forward::forward              (Unavailable → 502, Timeout → 504)
//!     → downstream Response, verbatim
//! ```

pub mod error;
pub mod pipeline;

pub use error::DispatchError;
pub use pipeline::DispatchPipeline;
