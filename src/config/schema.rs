//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Ordered route table. Order is the tie-break for equal-length prefixes.
    pub routes: Vec<RouteDefinition>,

    /// Token verification and identity propagation.
    pub auth: AuthConfig,

    /// Revocation cache maintenance.
    pub revocation: RevocationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single path-prefix to downstream mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteDefinition {
    /// Route identifier for logging/metrics.
    pub id: String,

    /// Literal path prefix matched against the inbound path.
    pub path_prefix: String,

    /// Scheme and authority of the downstream service (e.g., "http://member:8081").
    pub target_base_url: String,

    /// Path prepended to the remaining path on the downstream side.
    #[serde(default)]
    pub target_path_prefix: String,

    /// Whether a valid bearer token is required.
    #[serde(default)]
    pub requires_auth: bool,
}

impl RouteDefinition {
    pub fn new(
        id: impl Into<String>,
        path_prefix: impl Into<String>,
        target_base_url: impl Into<String>,
        target_path_prefix: impl Into<String>,
        requires_auth: bool,
    ) -> Self {
        Self {
            id: id.into(),
            path_prefix: path_prefix.into(),
            target_base_url: target_base_url.into(),
            target_path_prefix: target_path_prefix.into(),
            requires_auth,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret. Overridden by `GATEWAY_JWT_SECRET`.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,

    /// Signing algorithm name (HS256, HS384, HS512).
    pub algorithm: String,

    /// Header carrying the authenticated subject downstream.
    pub identity_header: String,

    /// Path of the gateway-local logout endpoint.
    pub logout_path: String,

    /// Additional claim name -> header name mappings.
    pub claim_headers: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            algorithm: "HS256".to_string(),
            identity_header: "x-member-id".to_string(),
            claim_headers: BTreeMap::new(),
            logout_path: "/auth/logout".to_string(),
        }
    }
}

/// Revocation cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// Interval between sweeps of expired entries, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Downstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Downstream exchange timeout (until response headers) in seconds.
    pub downstream_secs: u64,

    /// Total inbound request timeout in seconds. Must exceed `downstream_secs`.
    pub inbound_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            downstream_secs: 30,
            inbound_secs: 60,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token). Overridden by `GATEWAY_ADMIN_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
