//! Token minting with the gateway secret.
//!
//! The gateway never logs users in; downstream services do. This exists so that
//! operators (via `gateway-cli issue-token`) and tests can produce tokens the gate
//! accepts.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::clock::Clock;
use crate::auth::gate::Claims;

pub struct TokenIssuer {
    key: EncodingKey,
    algorithm: Algorithm,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], algorithm: Algorithm, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            algorithm,
            clock,
        }
    }

    /// Issue a token for `subject` valid for `ttl`, with a fresh `jti`.
    ///
    /// `extra` claims are merged in; the standard claims always win.
    pub fn issue(
        &self,
        subject: &str,
        ttl: Duration,
        extra: Claims,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = self.clock.now();
        let mut claims = extra;
        claims.insert("sub".into(), Value::from(subject));
        claims.insert("iat".into(), Value::from(now));
        claims.insert("exp".into(), Value::from(now + ttl.as_secs()));
        claims.insert("jti".into(), Value::from(Uuid::new_v4().to_string()));
        self.issue_claims(&claims)
    }

    /// Sign an arbitrary claim set as-is.
    pub fn issue_claims(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(self.algorithm), claims, &self.key)
    }
}
