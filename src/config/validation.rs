//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route table integrity (unique ids, well-formed prefixes and targets)
//! - Validate value ranges (timeouts > 0, secret length)
//! - Validate header names used for identity propagation
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::str::FromStr;

use axum::http::HeaderName;
use jsonwebtoken::Algorithm;

use crate::config::schema::GatewayConfig;

/// Minimum accepted length of the HMAC secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate route id `{0}`")]
    DuplicateRouteId(String),

    #[error("route `{id}`: path_prefix `{prefix}` must start with '/'")]
    InvalidPathPrefix { id: String, prefix: String },

    #[error("route `{id}`: target_base_url `{url}` is not an http(s) URL")]
    InvalidTargetUrl { id: String, url: String },

    #[error("route `{id}`: target_path_prefix `{prefix}` must be empty or start with '/'")]
    InvalidTargetPathPrefix { id: String, prefix: String },

    #[error("auth.jwt_secret is missing (set it or GATEWAY_JWT_SECRET)")]
    MissingSecret,

    #[error("auth.jwt_secret must be at least {} bytes", MIN_SECRET_LEN)]
    WeakSecret,

    #[error("auth.algorithm `{0}` is not a supported HMAC algorithm")]
    UnsupportedAlgorithm(String),

    #[error("`{0}` is not a valid header name")]
    InvalidHeaderName(String),

    #[error("auth.logout_path `{0}` must start with '/'")]
    InvalidLogoutPath(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("revocation.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("timeouts.inbound_secs must exceed timeouts.downstream_secs")]
    InboundTimeoutTooShort,

    #[error("admin.api_key is required when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a deserialized configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for route in &config.routes {
        if !seen.insert(route.id.as_str()) {
            errors.push(ValidationError::DuplicateRouteId(route.id.clone()));
        }
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPathPrefix {
                id: route.id.clone(),
                prefix: route.path_prefix.clone(),
            });
        }
        if !is_http_url(&route.target_base_url) {
            errors.push(ValidationError::InvalidTargetUrl {
                id: route.id.clone(),
                url: route.target_base_url.clone(),
            });
        }
        if !route.target_path_prefix.is_empty() && !route.target_path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidTargetPathPrefix {
                id: route.id.clone(),
                prefix: route.target_path_prefix.clone(),
            });
        }
    }

    match config.auth.jwt_secret.as_deref() {
        None | Some("") => errors.push(ValidationError::MissingSecret),
        Some(secret) if secret.len() < MIN_SECRET_LEN => errors.push(ValidationError::WeakSecret),
        Some(_) => {}
    }

    if parse_hmac_algorithm(&config.auth.algorithm).is_none() {
        errors.push(ValidationError::UnsupportedAlgorithm(
            config.auth.algorithm.clone(),
        ));
    }

    let header_names = std::iter::once(&config.auth.identity_header)
        .chain(config.auth.claim_headers.values());
    for name in header_names {
        if HeaderName::from_str(name).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    if !config.auth.logout_path.starts_with('/') {
        errors.push(ValidationError::InvalidLogoutPath(
            config.auth.logout_path.clone(),
        ));
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("downstream_secs", timeouts.downstream_secs),
        ("inbound_secs", timeouts.inbound_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
    if timeouts.inbound_secs <= timeouts.downstream_secs {
        errors.push(ValidationError::InboundTimeoutTooShort);
    }

    if config.revocation.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.admin.enabled && config.admin.api_key.as_deref().map_or(true, str::is_empty) {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse an algorithm name, accepting only the symmetric HMAC family.
pub fn parse_hmac_algorithm(name: &str) -> Option<Algorithm> {
    match Algorithm::from_str(name).ok()? {
        alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => Some(alg),
        _ => None,
    }
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteDefinition;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = Some("0123456789abcdef0123456789abcdef".into());
        config.routes.push(RouteDefinition::new(
            "member",
            "/api/member",
            "http://member:8081",
            "/v1",
            false,
        ));
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.auth.jwt_secret = None;
        config.routes.push(RouteDefinition::new("member", "api", "ftp://x", "v2", true));
        config.timeouts.connect_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingSecret));
        assert!(errors.contains(&ValidationError::DuplicateRouteId("member".into())));
        assert!(errors.contains(&ValidationError::InvalidPathPrefix {
            id: "member".into(),
            prefix: "api".into()
        }));
        assert!(errors.contains(&ValidationError::InvalidTargetUrl {
            id: "member".into(),
            url: "ftp://x".into()
        }));
        assert!(errors.contains(&ValidationError::InvalidTargetPathPrefix {
            id: "member".into(),
            prefix: "v2".into()
        }));
        assert!(errors.contains(&ValidationError::ZeroTimeout("connect_secs")));
    }

    #[test]
    fn test_rejects_short_secret() {
        let mut config = valid_config();
        config.auth.jwt_secret = Some("short".into());
        assert_eq!(validate_config(&config), Err(vec![ValidationError::WeakSecret]));
    }

    #[test]
    fn test_rejects_asymmetric_algorithm() {
        let mut config = valid_config();
        config.auth.algorithm = "RS256".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::UnsupportedAlgorithm("RS256".into())])
        );
        assert_eq!(parse_hmac_algorithm("HS512"), Some(Algorithm::HS512));
    }

    #[test]
    fn test_rejects_bad_header_names() {
        let mut config = valid_config();
        config.auth.identity_header = "x member".into();
        config
            .auth
            .claim_headers
            .insert("role".into(), "x-member-role".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidHeaderName("x member".into())])
        );
    }

    #[test]
    fn test_admin_requires_key() {
        let mut config = valid_config();
        config.admin.enabled = true;
        assert_eq!(validate_config(&config), Err(vec![ValidationError::MissingAdminKey]));

        config.admin.api_key = Some("k".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_inbound_timeout_must_exceed_downstream() {
        let mut config = valid_config();
        config.timeouts.inbound_secs = config.timeouts.downstream_secs;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InboundTimeoutTooShort])
        );
    }
}
