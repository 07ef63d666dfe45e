//! Bearer token authentication.
//!
//! # Checks (in order, first failure wins)
//! 1. `Authorization: Bearer <token>` present and non-empty → else `MissingToken`
//! 2. Three dot-separated segments, header and payload are base64url JSON objects
//!    → else `MalformedToken`
//! 3. HMAC signature valid for the configured key and algorithm → else `InvalidSignature`
//! 4. `exp` present and `now < exp` → else `MalformedToken` / `Expired`
//! 5. Revocation key (`jti`, else the raw token) not revoked → else `Revoked`
//! 6. `sub` present and non-empty → else `MalformedToken`
//!
//! Structure is checked before the signature so that any failure reported by the
//! signature step really is a signature problem.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::auth::clock::Clock;
use crate::auth::revocation::RevocationStore;
use crate::observability::metrics;

/// Decoded JWT payload.
pub type Claims = Map<String, Value>;

/// Why a request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token revoked")]
    Revoked,
}

impl AuthFailure {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "auth_missing_token",
            AuthFailure::MalformedToken => "auth_malformed_token",
            AuthFailure::InvalidSignature => "auth_invalid_signature",
            AuthFailure::Expired => "auth_expired",
            AuthFailure::Revoked => "auth_revoked",
        }
    }
}

/// Identity established for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub subject: String,
    pub claims: Claims,
    pub issued_at: Option<u64>,
    pub expires_at: u64,
    /// Key under which this token would be revoked (`jti`, else the raw token).
    pub revocation_key: String,
}

impl AuthContext {
    /// Render a claim as a header-friendly string. Strings are used as-is.
    pub fn claim_as_string(&self, name: &str) -> Option<String> {
        match self.claims.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Verifies bearer tokens against the shared secret and the revocation store.
pub struct AuthenticationGate {
    key: DecodingKey,
    validation: Validation,
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
}

impl AuthenticationGate {
    pub fn new(
        secret: &[u8],
        algorithm: Algorithm,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        // Time-based claims are checked against the injected clock after the signature.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            store,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<dyn RevocationStore> {
        &self.store
    }

    /// Authenticate the raw value of an `Authorization` header ("" when absent).
    pub async fn authenticate(&self, header_value: &str) -> Result<AuthContext, AuthFailure> {
        let result = self.check(header_value).await;
        if let Err(failure) = &result {
            metrics::record_auth_failure(failure.code());
        }
        result
    }

    async fn check(&self, header_value: &str) -> Result<AuthContext, AuthFailure> {
        let token = bearer_token(header_value).ok_or(AuthFailure::MissingToken)?;

        check_structure(token)?;

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token signature rejected");
                AuthFailure::InvalidSignature
            })?
            .claims;

        let expires_at = numeric_claim(&claims, "exp").ok_or(AuthFailure::MalformedToken)?;
        if self.clock.now() >= expires_at {
            return Err(AuthFailure::Expired);
        }

        let revocation_key = revocation_key(&claims, token);
        if self.store.is_revoked(&revocation_key).await {
            return Err(AuthFailure::Revoked);
        }

        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(AuthFailure::MalformedToken)?
            .to_string();

        Ok(AuthContext {
            subject,
            issued_at: numeric_claim(&claims, "iat"),
            expires_at,
            revocation_key,
            claims,
        })
    }

    /// Revoke the token behind `context` until its own expiry.
    pub async fn revoke(&self, context: &AuthContext) {
        self.store
            .revoke(&context.revocation_key, context.expires_at)
            .await;
        tracing::info!(subject = %context.subject, expires_at = context.expires_at, "Token revoked");
    }
}

/// Strip the `Bearer` scheme (case-insensitive) and surrounding whitespace.
fn bearer_token(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    let scheme = value.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let token = value[7..].trim();
    (!token.is_empty()).then_some(token)
}

fn check_structure(token: &str) -> Result<(), AuthFailure> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthFailure::MalformedToken);
    };

    if signature.is_empty() {
        return Err(AuthFailure::MalformedToken);
    }

    let header = decode_json_object(header)?;
    if !header.get("alg").is_some_and(Value::is_string) {
        return Err(AuthFailure::MalformedToken);
    }
    decode_json_object(payload)?;

    Ok(())
}

fn decode_json_object(segment: &str) -> Result<Map<String, Value>, AuthFailure> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthFailure::MalformedToken)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AuthFailure::MalformedToken),
    }
}

fn numeric_claim(claims: &Claims, name: &str) -> Option<u64> {
    let value = claims.get(name)?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

fn revocation_key(claims: &Claims, token: &str) -> String {
    claims
        .get("jti")
        .and_then(Value::as_str)
        .filter(|jti| !jti.is_empty())
        .unwrap_or(token)
        .to_string()
}
