//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Initialize subsystems in dependency order:
//!   clock → route registry → revocation store → gate → forwarder → pipeline
//! - Hand out the public server and the admin state
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners are bound by the caller, after everything here succeeded

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;

use crate::admin::AdminState;
use crate::auth::{AuthenticationGate, Clock, InMemoryRevocationStore, RevocationStore, RevocationSweeper, SystemClock};
use crate::config::loader::join_errors;
use crate::config::validation::parse_hmac_algorithm;
use crate::config::{validate_config, AuthConfig, GatewayConfig, ValidationError};
use crate::dispatch::DispatchPipeline;
use crate::http::{AppState, GatewayServer};
use crate::proxy::{ForwarderSettings, IdentityHeaders, ReverseProxyForwarder};
use crate::routing::{RouteRegistry, RouteTableError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error("route table: {0}")]
    RouteTable(#[from] RouteTableError),
}

impl From<ValidationError> for StartupError {
    fn from(error: ValidationError) -> Self {
        StartupError::Config(vec![error])
    }
}

/// Fully wired gateway, ready to be served.
pub struct Gateway {
    config: GatewayConfig,
    registry: Arc<RouteRegistry>,
    store: Arc<dyn RevocationStore>,
    pipeline: Arc<DispatchPipeline>,
}

impl Gateway {
    pub fn build(config: GatewayConfig) -> Result<Self, StartupError> {
        Self::build_with_clock(config, Arc::new(SystemClock))
    }

    /// Build with an injected clock, e.g. a `ManualClock` in tests.
    pub fn build_with_clock(
        config: GatewayConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        validate_config(&config).map_err(StartupError::Config)?;

        let registry = Arc::new(RouteRegistry::new(config.routes.clone())?);

        let secret = config
            .auth
            .jwt_secret
            .as_deref()
            .ok_or(ValidationError::MissingSecret)?;
        let algorithm = parse_hmac_algorithm(&config.auth.algorithm)
            .ok_or_else(|| ValidationError::UnsupportedAlgorithm(config.auth.algorithm.clone()))?;

        let store: Arc<dyn RevocationStore> = Arc::new(InMemoryRevocationStore::new(clock.clone()));
        let gate = Arc::new(AuthenticationGate::new(
            secret.as_bytes(),
            algorithm,
            store.clone(),
            clock,
        ));

        let forwarder = Arc::new(ReverseProxyForwarder::new(ForwarderSettings {
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            downstream_timeout: Duration::from_secs(config.timeouts.downstream_secs),
            identity: identity_headers(&config.auth)?,
        }));

        let pipeline = Arc::new(DispatchPipeline::new(
            registry.clone(),
            gate,
            forwarder,
            config.limits.max_body_bytes,
        ));

        tracing::info!(
            routes = registry.len(),
            algorithm = ?algorithm,
            identity_header = %config.auth.identity_header,
            "Gateway initialized"
        );

        Ok(Self {
            config,
            registry,
            store,
            pipeline,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<DispatchPipeline> {
        &self.pipeline
    }

    pub fn store(&self) -> &Arc<dyn RevocationStore> {
        &self.store
    }

    /// The public listener, with its revocation sweeper.
    pub fn server(&self) -> GatewayServer {
        let state = AppState {
            pipeline: self.pipeline.clone(),
        };
        let sweeper = RevocationSweeper::new(
            self.store.clone(),
            Duration::from_secs(self.config.revocation.sweep_interval_secs),
        );
        GatewayServer::new(&self.config, state, sweeper)
    }

    /// Admin API state, when the admin API is enabled.
    pub fn admin_state(&self) -> Option<AdminState> {
        if !self.config.admin.enabled {
            return None;
        }
        let api_key = self.config.admin.api_key.as_deref()?;
        Some(AdminState {
            registry: self.registry.clone(),
            store: self.store.clone(),
            api_key: Arc::from(api_key),
        })
    }
}

fn identity_headers(auth: &AuthConfig) -> Result<IdentityHeaders, ValidationError> {
    let parse = |name: &str| {
        HeaderName::from_str(name).map_err(|_| ValidationError::InvalidHeaderName(name.to_string()))
    };

    let mut identity = IdentityHeaders::new(parse(&auth.identity_header)?);
    for (claim, header) in &auth.claim_headers {
        identity = identity.with_claim(claim.clone(), parse(header)?);
    }
    Ok(identity)
}
