//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers (and any named by `Connection`)
//! - Strip inbound copies of gateway identity headers
//! - Inject identity headers for authenticated requests
//! - Append the client IP to X-Forwarded-For
//!
//! # Design Decisions
//! - Host and Content-Length are dropped; the client recomputes them from the
//!   target URI and the buffered body
//! - Identity headers are removed even on public routes, so a client can never
//!   assert an identity the gateway did not verify
//! - Everything else passes through unchanged

use std::net::IpAddr;

use axum::http::header::{CONNECTION, CONTENT_LENGTH, HOST, TE, TRAILER, TRANSFER_ENCODING, UPGRADE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::auth::AuthContext;

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Identity headers the gateway owns.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    /// Carries `AuthContext::subject`.
    pub subject: HeaderName,
    /// `(claim name, header)` pairs.
    pub claims: Vec<(String, HeaderName)>,
}

impl IdentityHeaders {
    pub fn new(subject: HeaderName) -> Self {
        Self {
            subject,
            claims: Vec::new(),
        }
    }

    pub fn with_claim(mut self, claim: impl Into<String>, header: HeaderName) -> Self {
        self.claims.push((claim.into(), header));
        self
    }

    fn names(&self) -> impl Iterator<Item = &HeaderName> {
        std::iter::once(&self.subject).chain(self.claims.iter().map(|(_, h)| h))
    }
}

/// Remove hop-by-hop headers, including those listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }

    for name in [
        HOST,
        CONTENT_LENGTH,
        CONNECTION,
        KEEP_ALIVE,
        PROXY_CONNECTION,
        TE,
        TRAILER,
        TRANSFER_ENCODING,
        UPGRADE,
    ] {
        headers.remove(name);
    }
}

/// Drop client-supplied identity headers, then set them from `auth` if present.
pub fn apply_identity(headers: &mut HeaderMap, identity: &IdentityHeaders, auth: Option<&AuthContext>) {
    for name in identity.names() {
        headers.remove(name);
    }

    let Some(ctx) = auth else {
        return;
    };

    match HeaderValue::from_str(&ctx.subject) {
        Ok(value) => {
            headers.insert(identity.subject.clone(), value);
        }
        Err(_) => {
            tracing::warn!(subject = %ctx.subject, "Subject is not a valid header value, not forwarded");
        }
    }

    for (claim, header) in &identity.claims {
        let Some(value) = ctx.claim_as_string(claim) else {
            continue;
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(header.clone(), value);
        }
    }
}

/// Append `client` to X-Forwarded-For.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}, {client}"),
        _ => client.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
