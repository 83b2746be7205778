use super::cookies::{
    ACCESS_COOKIE_MAX_AGE, ACCESS_TOKEN_COOKIE, REFRESH_COOKIE_MAX_AGE, REFRESH_TOKEN_COOKIE,
    expired_cookie, token_cookie,
};
use super::error::{ApiError, ApiErrorCode};
use crate::application_port::IdentityVerifier;
use crate::domain_model::{Principal, TokenPair};
use crate::server::AuthGateway;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::{HeaderValue, StatusCode, header::SET_COOKIE};
use warp::{Reply, reject, reply};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub message: &'static str,
    pub access_token: String,
}

fn with_pair_cookies(
    body: &impl Serialize,
    pair: &TokenPair,
    secure: bool,
) -> Result<warp::reply::Response, warp::Rejection> {
    let mut response = reply::json(body).into_response();
    let headers = response.headers_mut();
    for cookie in [
        token_cookie(
            ACCESS_TOKEN_COOKIE,
            &pair.access_token.0,
            ACCESS_COOKIE_MAX_AGE,
            secure,
        ),
        token_cookie(
            REFRESH_TOKEN_COOKIE,
            &pair.refresh_token.0,
            REFRESH_COOKIE_MAX_AGE,
            secure,
        ),
    ] {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| reject::custom(ApiErrorCode::internal(e)))?;
        headers.append(SET_COOKIE, value);
    }
    Ok(response)
}

/// Completes a provider login: the identity collaborator turns the callback
/// into a verified principal, the auth endpoint mints the pair, and both
/// token cookies are set at this boundary.
pub async fn complete_login(
    query: CallbackQuery,
    identity: Arc<dyn IdentityVerifier>,
    gateway: Arc<dyn AuthGateway>,
    secure_cookies: bool,
) -> Result<impl warp::Reply, warp::Rejection> {
    let principal = identity.verify_callback(&query.code).await.map_err(|e| {
        tracing::warn!("identity callback rejected: {}", e);
        reject::custom(ApiErrorCode::LoginFailed)
    })?;

    let pair = gateway.issue_on_login(&principal).await.map_err(|e| {
        tracing::warn!("login issuance failed: {}", e);
        reject::custom(ApiErrorCode::LoginFailed)
    })?;

    let body = ApiResponse::ok(TokenResponse {
        message: "login successful",
        access_token: pair.access_token.0.clone(),
    });
    with_pair_cookies(&body, &pair, secure_cookies)
}

/// Rotates the refresh token from the cookie. Any failure answers 401 with
/// the refresh cookie cleared, forcing a fresh login.
pub async fn refresh(
    refresh_token: Option<String>,
    gateway: Arc<dyn AuthGateway>,
    secure_cookies: bool,
) -> Result<warp::reply::Response, warp::Rejection> {
    let Some(refresh_token) = refresh_token else {
        return Err(reject::custom(ApiErrorCode::MissingRefreshToken));
    };

    match gateway.refresh(&refresh_token).await {
        Ok(pair) => {
            let body = ApiResponse::ok(TokenResponse {
                message: "token refreshed",
                access_token: pair.access_token.0.clone(),
            });
            with_pair_cookies(&body, &pair, secure_cookies)
        }
        Err(e) => {
            tracing::debug!("refresh rejected: {}", e);
            let code = ApiErrorCode::RefreshRejected;
            let body = ApiResponse::<()>::err(code.clone(), code.to_string());
            let mut response = reply::json(&body).into_response();
            *response.status_mut() = StatusCode::UNAUTHORIZED;
            let cleared = expired_cookie(REFRESH_TOKEN_COOKIE, secure_cookies);
            let value = HeaderValue::from_str(&cleared)
                .map_err(|e| reject::custom(ApiErrorCode::internal(e)))?;
            response.headers_mut().append(SET_COOKIE, value);
            Ok(response)
        }
    }
}

/// Guarded sample route: returns whatever principal the guard attached.
pub async fn session(principal: Principal) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(reply::json(&ApiResponse::ok(principal)))
}
