use crate::api::v1::handler::ApiResponse;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Access token is missing")]
    MissingAccessToken,
    #[error("Invalid access token format")]
    MalformedAccessToken,
    #[error("Invalid access token")]
    InvalidAccessToken,
    #[error("Refresh token not found")]
    MissingRefreshToken,
    #[error("Invalid refresh token, please login again")]
    RefreshRejected,
    #[error("login failed")]
    LoginFailed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::MissingAccessToken
            | ApiErrorCode::MalformedAccessToken
            | ApiErrorCode::InvalidAccessToken
            | ApiErrorCode::MissingRefreshToken
            | ApiErrorCode::RefreshRejected
            | ApiErrorCode::LoginFailed => StatusCode::UNAUTHORIZED,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(code) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
        Ok(warp::reply::with_status(json, code.status()))
    } else {
        let json = warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ApiError {
                code: ApiErrorCode::InternalError,
                message: format!("Unhandled error: {:?}", err),
            }),
        });
        Ok(warp::reply::with_status(
            json,
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}
