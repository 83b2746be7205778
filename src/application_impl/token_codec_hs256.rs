use crate::application_port::{AuthError, TokenCodec};
use crate::domain_model::{Principal, PrincipalId};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Immutable signing policy, built once at startup and injected into the
/// codec. Two secrets, one per token class.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub cache_key_prefix: String,
}

/// Claims are the principal subset and nothing else, so an intercepted
/// token leaks no more than the identity record itself.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    name: String,
    iat: i64,
    exp: i64,
    jti: String,
}

fn encode_token(principal: &Principal, secret: &[u8], ttl: Duration) -> Result<String, AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt
        + chrono::Duration::from_std(ttl).map_err(|e| AuthError::Issuance(e.to_string()))?;
    let claims = Claims {
        sub: principal.id.to_string(),
        email: principal.email.clone(),
        name: principal.display_name.clone(),
        iat: iat_dt.timestamp(),
        exp: exp_dt.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Issuance(e.to_string()))
}

fn decode_token(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    // expired, tampered and malformed all collapse into the same kind
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::Verification)
}

fn principal_from(claims: Claims) -> Principal {
    Principal {
        id: PrincipalId(claims.sub),
        email: claims.email,
        display_name: claims.name,
    }
}

pub struct HsTokenCodec {
    cfg: TokenConfig,
}

impl HsTokenCodec {
    pub fn new(cfg: TokenConfig) -> Self {
        HsTokenCodec { cfg }
    }
}

#[async_trait::async_trait]
impl TokenCodec for HsTokenCodec {
    async fn sign_access(&self, principal: &Principal) -> Result<String, AuthError> {
        encode_token(principal, &self.cfg.access_secret, self.cfg.access_ttl)
    }

    async fn sign_refresh(&self, principal: &Principal) -> Result<String, AuthError> {
        encode_token(principal, &self.cfg.refresh_secret, self.cfg.refresh_ttl)
    }

    async fn verify_access(&self, token: &str) -> Result<Principal, AuthError> {
        decode_token(token, &self.cfg.access_secret).map(principal_from)
    }

    async fn verify_refresh(&self, token: &str) -> Result<Principal, AuthError> {
        decode_token(token, &self.cfg.refresh_secret).map(principal_from)
    }
}
