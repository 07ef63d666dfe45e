//! Gateway request dispatch core: longest-prefix routing, JWT authentication with
//! revocation, and reverse proxying to downstream services.

pub mod admin;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::GatewayConfig;
pub use dispatch::{DispatchError, DispatchPipeline};
pub use http::GatewayServer;
pub use lifecycle::{Gateway, Shutdown};
