use super::cookies::ACCESS_TOKEN_COOKIE;
use super::error::ApiErrorCode;
use crate::domain_model::Principal;
use crate::server::AuthGateway;
use std::sync::Arc;
use warp::{Filter, reject};

/// Shape check before spending a broker round trip: three dot-separated,
/// non-empty base64url segments.
pub fn looks_like_signed_token(token: &str) -> bool {
    let mut segments = 0;
    for segment in token.split('.') {
        segments += 1;
        if segment.is_empty()
            || !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'=')
        {
            return false;
        }
    }
    segments == 3
}

/// Authorization boundary for protected routes. Extracts the access-token
/// cookie, fast-fails on missing/malformed tokens, otherwise verifies over
/// the broker and extracts the principal into the handler chain.
pub fn with_principal(
    gateway: Arc<dyn AuthGateway>,
) -> impl Filter<Extract = (Principal,), Error = warp::Rejection> + Clone {
    warp::cookie::optional::<String>(ACCESS_TOKEN_COOKIE).and_then(move |token: Option<String>| {
        let gateway = gateway.clone();
        async move {
            let token = token.ok_or_else(|| reject::custom(ApiErrorCode::MissingAccessToken))?;
            if !looks_like_signed_token(&token) {
                return Err(reject::custom(ApiErrorCode::MalformedAccessToken));
            }

            // exactly one broker round trip per request; a fault or a
            // timeout is a plain 401, never a retry or a cached verdict
            gateway.verify_access_token(&token).await.map_err(|e| {
                tracing::debug!("access token rejected: {}", e);
                reject::custom(ApiErrorCode::InvalidAccessToken)
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_jwt_shaped_strings() {
        assert!(looks_like_signed_token("eyJhbGciOi.eyJzdWIiOi.sig-part_1"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!looks_like_signed_token(""));
        assert!(!looks_like_signed_token("plain-opaque-token"));
        assert!(!looks_like_signed_token("a.b"));
        assert!(!looks_like_signed_token("a.b.c.d"));
        assert!(!looks_like_signed_token("a..c"));
        assert!(!looks_like_signed_token("a.b!.c"));
    }
}
