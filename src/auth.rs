use axum::body::{to_bytes, Body};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::{general_purpose, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::handlers::api::AppState;
use crate::models::appointment::ActorRole;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
pub const NONCE_HEADER: &str = "x-nonce";
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Largest request body the gateway signature is checked over.
pub const MAX_SIGNED_BODY_BYTES: usize = 64 * 1024;

// Expired nonces are pruned once the cache grows past this size
const NONCE_CACHE_CLEANUP_THRESHOLD: usize = 1000;

/// Signing utilities shared by the gateway headers and outgoing notifications
pub struct GatewayAuth;

impl GatewayAuth {
    /// Generate a random nonce for signed requests
    pub fn generate_nonce() -> String {
        rand::thread_rng().gen_range(10000000..99999999).to_string()
    }

    /// Get current timestamp for signed requests
    pub fn get_timestamp() -> i64 {
        Utc::now().timestamp()
    }

    /// Canonical header part of the string to sign
    pub fn header_string(actor_id: &str, actor_role: &str, nonce: &str, timestamp: i64) -> String {
        format!(
            "X-Actor-Id={}&X-Actor-Role={}&X-Nonce={}&X-Timestamp={}",
            actor_id, actor_role, nonce, timestamp
        )
    }

    fn mac(secret: &str, method: &str, header_string: &str, uri: &str, body: &str) -> HmacSha256 {
        let content = format!("{}\n{}\n{}\n{}", method, header_string, uri, body);
        debug!("String to sign: {}", content);

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(content.as_bytes());
        mac
    }

    /// Base64 of the hex encoded HMAC-SHA256 over method, headers, uri and body
    pub fn generate_signature(
        secret: &str,
        method: &str,
        header_string: &str,
        uri: &str,
        body: &str,
    ) -> String {
        let hex_hash = hex::encode(
            Self::mac(secret, method, header_string, uri, body)
                .finalize()
                .into_bytes(),
        );
        general_purpose::STANDARD.encode(hex_hash.as_bytes())
    }

    /// Constant-time check of a signature produced by `generate_signature`
    pub fn verify_signature(
        secret: &str,
        method: &str,
        header_string: &str,
        uri: &str,
        body: &str,
        signature: &str,
    ) -> bool {
        let Ok(hex_hash) = general_purpose::STANDARD.decode(signature.trim()) else {
            return false;
        };
        let Ok(raw) = hex::decode(hex_hash) else {
            return false;
        };

        Self::mac(secret, method, header_string, uri, body)
            .verify_slice(&raw)
            .is_ok()
    }
}

/// Recently accepted `(actor, nonce)` pairs, keyed to their signed timestamp.
///
/// A pair is refused while its timestamp is still inside the skew window, so a
/// captured request cannot be replayed. Older entries are pruned lazily.
#[derive(Debug, Default)]
pub struct NonceCache {
    seen: HashMap<String, i64>,
}

impl NonceCache {
    /// Records the nonce and returns `true` if it was not seen in the window.
    pub fn check_and_insert(&mut self, key: &str, timestamp: i64, now: i64, window_secs: i64) -> bool {
        if self.seen.len() > NONCE_CACHE_CLEANUP_THRESHOLD {
            self.seen
                .retain(|_, seen_at| (now - *seen_at).abs() <= window_secs);
        }

        if self.seen.contains_key(key) {
            return false;
        }

        self.seen.insert(key.to_string(), timestamp);
        true
    }
}

// Marks a request whose gateway signature has been checked
#[derive(Debug, Clone, Copy)]
struct VerifiedSignature;

/// The caller identity asserted by the gateway headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn require_role(&self, role: ActorRole) -> Result<(), AppError> {
        if self.role != role {
            return Err(AppError::Authorization(format!(
                "Only a {} may perform this action",
                role
            )));
        }
        Ok(())
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Authentication(format!("Missing {} header", name)))
}

/// Checks the gateway signature over method, identity headers, path and body.
///
/// Requests without an actor header pass through untouched; routes that need
/// an identity reject them in the `Actor` extractor. The body is buffered up
/// to `MAX_SIGNED_BODY_BYTES` and handed on unchanged.
pub async fn verify_gateway_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(secret) = state.gateway_secret.as_deref() else {
        return Ok(next.run(request).await);
    };
    if !request.headers().contains_key(ACTOR_ID_HEADER) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let headers = &parts.headers;

    let id = header(headers, ACTOR_ID_HEADER)?;
    let raw_role = header(headers, ACTOR_ROLE_HEADER)?;
    let timestamp: i64 = header(headers, TIMESTAMP_HEADER)?
        .parse()
        .map_err(|_| AppError::Authentication("Invalid timestamp".to_string()))?;

    let now = GatewayAuth::get_timestamp();
    let skew = (now - timestamp).abs();
    if skew > state.signature_max_skew_secs {
        warn!("Rejected request from {}: timestamp skew {}s", id, skew);
        return Err(AppError::Authentication(
            "Request timestamp outside the accepted window".to_string(),
        ));
    }

    let nonce = header(headers, NONCE_HEADER)?;
    let signature = header(headers, SIGNATURE_HEADER)?;
    let header_string = GatewayAuth::header_string(id, raw_role, nonce, timestamp);
    let uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let bytes = to_bytes(body, MAX_SIGNED_BODY_BYTES)
        .await
        .map_err(|_| AppError::Validation("Request body is too large".to_string()))?;
    let body_text = std::str::from_utf8(&bytes)
        .map_err(|_| AppError::Authentication("Signed body must be UTF-8".to_string()))?;

    if !GatewayAuth::verify_signature(
        secret,
        parts.method.as_str(),
        &header_string,
        uri,
        body_text,
        signature,
    ) {
        warn!("Rejected request from {}: invalid signature", id);
        return Err(AppError::Authentication("Invalid signature".to_string()));
    }

    let fresh = state
        .nonces
        .lock()
        .map_err(|_| AppError::Authentication("Nonce cache unavailable".to_string()))?
        .check_and_insert(
            &format!("{}:{}", id, nonce),
            timestamp,
            now,
            state.signature_max_skew_secs,
        );
    if !fresh {
        warn!("Rejected request from {}: nonce {} replayed", id, nonce);
        return Err(AppError::Authentication("Nonce already used".to_string()));
    }

    parts.extensions.insert(VerifiedSignature);
    Ok(next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await)
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = header(&parts.headers, ACTOR_ID_HEADER)?;
        let role: ActorRole = header(&parts.headers, ACTOR_ROLE_HEADER)?
            .parse()
            .map_err(AppError::Authentication)?;

        if state.gateway_secret.is_some() && parts.extensions.get::<VerifiedSignature>().is_none() {
            return Err(AppError::Authentication(
                "Request signature was not verified".to_string(),
            ));
        }

        Ok(Actor {
            id: id.to_string(),
            role,
        })
    }
}
