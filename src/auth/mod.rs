//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → gate.rs (bearer parse, structure, signature, expiry)
//!     → revocation.rs (is the token's key revoked?)
//!     → AuthContext { subject, claims, issued_at, expires_at }
//!
//! Logout:
//!     gate.rs (authenticate) → revocation.rs (revoke key until token exp)
//!
//! Background:
//!     RevocationSweeper → sweep_expired() every interval
//! ```
//!
//! # Design Decisions
//! - Store and clock are injected, never global
//! - The revocation store is the only shared mutable state in the request path
//! - Revocation entries expire with the token they block, never later

pub mod clock;
pub mod gate;
pub mod issuer;
pub mod revocation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{AuthContext, AuthFailure, AuthenticationGate, Claims};
pub use issuer::TokenIssuer;
pub use revocation::{InMemoryRevocationStore, RevocationStore, RevocationSweeper};
